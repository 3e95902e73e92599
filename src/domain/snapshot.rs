//! Point-in-time capture of every tracked entity.

use crate::domain::{
    Address, Amount, Category, DiffAnomaly, PoolReading, TimeMs, VestingReading,
};
use serde::{Deserialize, Serialize};

/// Current snapshot layout. Bump when a field changes meaning; additive
/// fields only need `#[serde(default)]`.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SNAPSHOT_SCHEMA_VERSION
}

/// State of one entity inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    pub symbol: String,
    pub name: String,
    pub category: Category,
    pub address: Address,
    pub vesting: VestingReading,
    pub pool: PoolReading,
    /// Symbols of products priced against this entity; empty for products.
    #[serde(default)]
    pub products: Vec<String>,
    /// Inconsistencies found when comparing with the previous snapshot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<DiffAnomaly>,
}

/// Aggregate counts over one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub builders: usize,
    pub products: usize,
    pub active_pools: usize,
    pub total_vesting_claimable: Amount,
    /// Entities with at least one failed read.
    #[serde(default)]
    pub unavailable: usize,
    /// Entities whose vesting reading is inconsistent.
    #[serde(default)]
    pub anomalies: usize,
    /// Entities whose claimable is left out of the total because adding it
    /// would leave the representable range.
    #[serde(default)]
    pub claimable_overflow: usize,
}

impl SnapshotSummary {
    /// Single pass over the collected entities.
    pub fn from_entities(entities: &[EntitySnapshot]) -> Self {
        let mut summary = SnapshotSummary::default();
        for entity in entities {
            match entity.category {
                Category::Builder => summary.builders += 1,
                Category::Product => summary.products += 1,
            }
            if entity.pool.is_active() {
                summary.active_pools += 1;
            }
            match &entity.vesting {
                VestingReading::Available(state) => {
                    match summary.total_vesting_claimable.checked_add(state.claimable) {
                        Some(total) => summary.total_vesting_claimable = total,
                        None => summary.claimable_overflow += 1,
                    }
                }
                VestingReading::Anomaly { .. } => summary.anomalies += 1,
                VestingReading::Unavailable { .. } => {}
            }
            let vesting_failed = matches!(entity.vesting, VestingReading::Unavailable { .. });
            let pool_failed = matches!(entity.pool, PoolReading::NotFound { .. });
            if vesting_failed || pool_failed {
                summary.unavailable += 1;
            }
        }
        summary
    }
}

/// Immutable capture produced once per heartbeat cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub taken_at: TimeMs,
    pub wallet: Address,
    /// Entities in registry order.
    pub entities: Vec<EntitySnapshot>,
    pub summary: SnapshotSummary,
}

impl Snapshot {
    pub fn new(taken_at: TimeMs, wallet: Address, entities: Vec<EntitySnapshot>) -> Self {
        let summary = SnapshotSummary::from_entities(&entities);
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            taken_at,
            wallet,
            entities,
            summary,
        }
    }

    pub fn entity(&self, symbol: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.symbol == symbol)
    }

    /// Attach each anomaly to the entity it concerns.
    pub fn attach_anomalies(&mut self, anomalies: &[DiffAnomaly]) {
        for anomaly in anomalies {
            if let Some(entity) = self
                .entities
                .iter_mut()
                .find(|e| e.symbol == anomaly.symbol())
            {
                entity.anomalies.push(anomaly.clone());
            }
        }
    }

    /// Same capture under a different timestamp.
    pub fn retimed(mut self, taken_at: TimeMs) -> Self {
        self.taken_at = taken_at;
        self
    }
}

/// Snapshot summary as retained in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub taken_at: TimeMs,
    pub wallet: Address,
    pub summary: SnapshotSummary,
    pub change_count: usize,
}
