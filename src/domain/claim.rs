//! Claim outcomes and batches.

use crate::domain::{Address, PoolId, TimeMs, TxHash};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether claims touch the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimMode {
    DryRun,
    Live,
}

impl ClaimMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimMode::DryRun => "dry_run",
            ClaimMode::Live => "live",
        }
    }
}

impl std::str::FromStr for ClaimMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dry_run" => Ok(ClaimMode::DryRun),
            "live" => Ok(ClaimMode::Live),
            other => Err(format!("unknown claim mode: {}", other)),
        }
    }
}

/// Result of handling one eligible entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimOutcome {
    DryRun,
    #[serde(rename_all = "camelCase")]
    Claimed {
        tx_hash: TxHash,
        block_number: u64,
    },
    /// Submission or confirmation failed. `tx_hash` is set when the
    /// transaction was submitted but never confirmed.
    #[serde(rename_all = "camelCase")]
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tx_hash: Option<TxHash>,
        message: String,
    },
}

impl ClaimOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimOutcome::DryRun => "dry_run",
            ClaimOutcome::Claimed { .. } => "claimed",
            ClaimOutcome::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub symbol: String,
    pub address: Address,
    pub pool_id: PoolId,
    #[serde(flatten)]
    pub outcome: ClaimOutcome,
}

/// All claim records produced by one executor pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBatch {
    pub id: Uuid,
    pub executed_at: TimeMs,
    pub mode: ClaimMode,
    pub records: Vec<ClaimRecord>,
}

impl ClaimBatch {
    pub fn new(executed_at: TimeMs, mode: ClaimMode, records: Vec<ClaimRecord>) -> Self {
        Self {
            id: Uuid::new_v4(),
            executed_at,
            mode,
            records,
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_record_flattens_outcome() {
        let record = ClaimRecord {
            symbol: "ABC".to_string(),
            address: Address::zero(),
            pool_id: PoolId([1u8; 32]),
            outcome: ClaimOutcome::Claimed {
                tx_hash: TxHash::new("0xAA".to_string()),
                block_number: 42,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["outcome"], "claimed");
        assert_eq!(json["blockNumber"], 42);
        assert_eq!(json["txHash"], "0xaa");
        let back: ClaimRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_batch_counts_by_outcome() {
        let record = |outcome| ClaimRecord {
            symbol: "X".to_string(),
            address: Address::zero(),
            pool_id: PoolId([0u8; 32]),
            outcome,
        };
        let batch = ClaimBatch::new(
            TimeMs::new(1),
            ClaimMode::Live,
            vec![
                record(ClaimOutcome::Error {
                    tx_hash: None,
                    message: "boom".to_string(),
                }),
                record(ClaimOutcome::DryRun),
            ],
        );
        assert_eq!(batch.count("error"), 1);
        assert_eq!(batch.count("claimed"), 0);
    }
}
