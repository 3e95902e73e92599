//! Vesting totals for the tracked wallet at one token.

use crate::domain::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Released exceeds total allocation; the reading cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("released {released} exceeds total {total}")]
pub struct VestingAnomaly {
    pub total: Amount,
    pub released: Amount,
}

/// Vesting totals with claimable derived on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingState {
    pub total: Amount,
    pub released: Amount,
    pub claimable: Amount,
}

impl VestingState {
    /// Build from on-chain totals. A negative claimable is reported, never clamped.
    pub fn from_totals(total: Amount, released: Amount) -> Result<Self, VestingAnomaly> {
        let claimable = total - released;
        if claimable.is_negative() {
            return Err(VestingAnomaly { total, released });
        }
        Ok(Self {
            total,
            released,
            claimable,
        })
    }
}

/// Outcome of reading vesting for one entity during collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum VestingReading {
    Available(VestingState),
    /// The read failed (network, RPC or decode error).
    Unavailable { reason: String },
    /// The read succeeded but the values are inconsistent.
    #[serde(rename_all = "camelCase")]
    Anomaly {
        total: Amount,
        released: Amount,
        reason: String,
    },
}

impl VestingReading {
    pub fn state(&self) -> Option<&VestingState> {
        match self {
            VestingReading::Available(state) => Some(state),
            _ => None,
        }
    }

    /// Released amount when the read succeeded, consistent or not.
    pub fn released(&self) -> Option<Amount> {
        match self {
            VestingReading::Available(state) => Some(state.released),
            VestingReading::Anomaly { released, .. } => Some(*released),
            VestingReading::Unavailable { .. } => None,
        }
    }

    pub fn claimable(&self) -> Amount {
        self.state().map(|s| s.claimable).unwrap_or_default()
    }
}

impl From<Result<VestingState, VestingAnomaly>> for VestingReading {
    fn from(result: Result<VestingState, VestingAnomaly>) -> Self {
        match result {
            Ok(state) => VestingReading::Available(state),
            Err(anomaly) => VestingReading::Anomaly {
                total: anomaly.total,
                released: anomaly.released,
                reason: anomaly.to_string(),
            },
        }
    }
}
