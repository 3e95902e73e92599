//! Fee claims for entities whose pool is active.

use crate::chain::contracts::encode_collect_fees;
use crate::chain::Signer;
use crate::domain::{
    Address, ClaimBatch, ClaimMode, ClaimOutcome, ClaimRecord, EntitySnapshot, PoolId, Snapshot,
    TimeMs,
};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ClaimExecutor {
    signer: Arc<dyn Signer>,
    pool_initializer: Address,
    concurrency: usize,
}

impl ClaimExecutor {
    pub fn new(signer: Arc<dyn Signer>, pool_initializer: Address, concurrency: usize) -> Self {
        Self {
            signer,
            pool_initializer,
            concurrency: concurrency.max(1),
        }
    }

    /// Claim fees for every eligible entity in `snapshot`.
    ///
    /// Entities without an active pool are left out of the batch entirely.
    /// In dry-run mode the signer is never called. In live mode each claim is
    /// submitted once and its outcome is independent of every other claim.
    pub async fn execute(&self, snapshot: &Snapshot, mode: ClaimMode) -> ClaimBatch {
        let eligible: Vec<ClaimRecord> = snapshot
            .entities
            .iter()
            .filter_map(eligible_record)
            .collect();

        let records: Vec<ClaimRecord> = match mode {
            ClaimMode::DryRun => eligible,
            ClaimMode::Live => {
                stream::iter(eligible)
                    .map(|mut record| {
                        let executor = self.clone();
                        async move {
                            record.outcome = executor.claim(&record.symbol, &record.pool_id).await;
                            record
                        }
                        .boxed()
                    })
                    .buffered(self.concurrency)
                    .collect()
                    .await
            }
        };

        let batch = ClaimBatch::new(TimeMs::now(), mode, records);
        info!(
            mode = mode.as_str(),
            eligible = batch.records.len(),
            claimed = batch.count("claimed"),
            errors = batch.count("error"),
            "claim pass finished"
        );
        batch
    }

    async fn claim(&self, symbol: &str, pool_id: &PoolId) -> ClaimOutcome {
        let data = encode_collect_fees(pool_id);
        let tx_hash = match self.signer.submit(&self.pool_initializer, data, 0).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(symbol, pool_id = %pool_id, error = %e, "claim submission failed");
                return ClaimOutcome::Error {
                    tx_hash: None,
                    message: format!("submission failed: {}", e),
                };
            }
        };

        match self.signer.wait_for_receipt(&tx_hash).await {
            Ok(receipt) if receipt.success => {
                info!(
                    symbol,
                    from = %self.signer.account(),
                    tx_hash = %tx_hash,
                    block = receipt.block_number,
                    "fees claimed"
                );
                ClaimOutcome::Claimed {
                    tx_hash,
                    block_number: receipt.block_number,
                }
            }
            Ok(receipt) => {
                warn!(symbol, tx_hash = %tx_hash, block = receipt.block_number, "claim reverted");
                ClaimOutcome::Error {
                    message: format!("reverted in block {}", receipt.block_number),
                    tx_hash: Some(tx_hash),
                }
            }
            // Submitted but unconfirmed: surfaced as an error, never resubmitted.
            Err(e) => {
                warn!(symbol, tx_hash = %tx_hash, error = %e, "claim not confirmed");
                ClaimOutcome::Error {
                    message: format!("confirmation failed: {}", e),
                    tx_hash: Some(tx_hash),
                }
            }
        }
    }
}

/// Dry-run record for an entity whose pool is active, `None` otherwise.
fn eligible_record(entity: &EntitySnapshot) -> Option<ClaimRecord> {
    let state = entity.pool.state().filter(|s| s.is_claimable())?;
    Some(ClaimRecord {
        symbol: entity.symbol.clone(),
        address: entity.address.clone(),
        pool_id: state.pool_id,
        outcome: ClaimOutcome::DryRun,
    })
}
