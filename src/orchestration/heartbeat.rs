//! The heartbeat cycle: collect, diff, analyze, persist, then optionally claim.

use crate::db::{HistoryView, Repository, StoreError};
use crate::domain::{ClaimBatch, ClaimMode, HistoryEntry, Snapshot, TimeMs};
use crate::engine::{analyze, diff, ChangeSet, ImpactReport};
use crate::orchestration::{ClaimExecutor, Collector};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Structured result of one cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleResult {
    pub snapshot: Snapshot,
    pub changes: ChangeSet,
    pub impact: ImpactReport,
    /// Live batch when claiming was requested, otherwise a dry-run preview.
    pub claims: ClaimBatch,
    /// Summaries dropped from history by the retention cap.
    pub evicted: u64,
}

/// Freshly collected state, not diffed and not persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub snapshot: Snapshot,
    pub impact: ImpactReport,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct Heartbeat {
    repo: Arc<Repository>,
    collector: Collector,
    executor: ClaimExecutor,
    retention: usize,
    /// Serializes cycles and claim passes within this process.
    cycle_lock: Arc<Mutex<()>>,
}

impl Heartbeat {
    pub fn new(
        repo: Arc<Repository>,
        collector: Collector,
        executor: ClaimExecutor,
        retention: usize,
    ) -> Self {
        Self {
            repo,
            collector,
            executor,
            retention: retention.max(1),
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run one full cycle. Only storage failures abort it.
    pub async fn run(&self, claim: bool) -> Result<CycleResult, CycleError> {
        let _guard = self.cycle_lock.lock().await;

        let entities = self.repo.list_entities().await?;
        let collected = self.collector.collect(&entities, TimeMs::now()).await;

        let previous = self.repo.latest_snapshot().await?;
        let mut snapshot = match &previous {
            Some(prev) if collected.taken_at <= prev.taken_at => {
                let bumped = TimeMs::new(prev.taken_at.as_ms() + 1);
                warn!(
                    clock = collected.taken_at.as_ms(),
                    latest = prev.taken_at.as_ms(),
                    "clock has not advanced past latest snapshot, bumping timestamp"
                );
                collected.retimed(bumped)
            }
            _ => collected,
        };

        let changes = diff(&snapshot, previous.as_ref());
        for anomaly in &changes.anomalies {
            warn!(symbol = anomaly.symbol(), ?anomaly, "diff anomaly");
        }
        snapshot.attach_anomalies(&changes.anomalies);
        if snapshot.summary.claimable_overflow > 0 {
            warn!(
                entities = snapshot.summary.claimable_overflow,
                "claimable total out of range, some entities left out"
            );
        }
        let impact = analyze(&snapshot);

        self.repo.insert_snapshot(&snapshot).await?;
        let entry = HistoryEntry {
            taken_at: snapshot.taken_at,
            wallet: snapshot.wallet.clone(),
            summary: snapshot.summary.clone(),
            change_count: changes.changes.len(),
        };
        let evicted = self.repo.append_summary(&entry, self.retention).await?;

        let mode = if claim {
            ClaimMode::Live
        } else {
            ClaimMode::DryRun
        };
        let claims = self.executor.execute(&snapshot, mode).await;
        if mode == ClaimMode::Live && !claims.records.is_empty() {
            self.repo.append_claim_batch(&claims).await?;
        }

        info!(
            taken_at = snapshot.taken_at.as_ms(),
            entities = snapshot.entities.len(),
            first = changes.is_first,
            changes = changes.changes.len(),
            anomalies = changes.anomalies.len(),
            active_pools = snapshot.summary.active_pools,
            claimable = %snapshot.summary.total_vesting_claimable,
            evicted,
            "heartbeat cycle complete"
        );

        Ok(CycleResult {
            snapshot,
            changes,
            impact,
            claims,
            evicted,
        })
    }

    /// Collect current state without diffing or persisting anything.
    pub async fn status(&self) -> Result<StatusReport, CycleError> {
        let entities = self.repo.list_entities().await?;
        let snapshot = self.collector.collect(&entities, TimeMs::now()).await;
        let impact = analyze(&snapshot);
        Ok(StatusReport { snapshot, impact })
    }

    pub async fn history(&self, limit: usize) -> Result<HistoryView, CycleError> {
        Ok(self.repo.history(limit).await?)
    }

    /// Live claim pass over a fresh, unpersisted collection.
    pub async fn claim_all(&self) -> Result<ClaimBatch, CycleError> {
        let _guard = self.cycle_lock.lock().await;

        let entities = self.repo.list_entities().await?;
        let snapshot = self.collector.collect(&entities, TimeMs::now()).await;
        let batch = self.executor.execute(&snapshot, ClaimMode::Live).await;
        if !batch.records.is_empty() {
            self.repo.append_claim_batch(&batch).await?;
        }
        Ok(batch)
    }
}
