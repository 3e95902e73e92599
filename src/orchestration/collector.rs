//! State collection: one read-only pass over every tracked entity.

use crate::chain::{ChainReader, PoolStateRecord};
use crate::domain::{
    Address, EntitySnapshot, PoolReading, PoolState, PoolStatus, Snapshot, TimeMs,
    TrackedEntity, VestingReading, VestingState,
};
use crate::engine::derive_pool_id;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Collector {
    reader: Arc<dyn ChainReader>,
    wallet: Address,
    concurrency: usize,
}

impl Collector {
    pub fn new(reader: Arc<dyn ChainReader>, wallet: Address, concurrency: usize) -> Self {
        Self {
            reader,
            wallet,
            concurrency: concurrency.max(1),
        }
    }

    /// Read every entity and assemble a snapshot stamped `taken_at`.
    ///
    /// Never fails: each failed read is recorded on its entity. Entities keep
    /// the order of `entities` regardless of which reads finish first.
    pub async fn collect(&self, entities: &[TrackedEntity], taken_at: TimeMs) -> Snapshot {
        let registry: Arc<[TrackedEntity]> = entities.into();
        let collected: Vec<EntitySnapshot> = stream::iter(0..registry.len())
            .map(|index| {
                let collector = self.clone();
                let registry = registry.clone();
                async move { collector.collect_entity(&registry[index], &registry).await }.boxed()
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        Snapshot::new(taken_at, self.wallet.clone(), collected)
    }

    async fn collect_entity(
        &self,
        entity: &TrackedEntity,
        registry: &[TrackedEntity],
    ) -> EntitySnapshot {
        let vesting = self.read_vesting(entity).await;
        let pool = self.read_pool(entity).await;

        let products = if entity.is_builder() {
            products_of(&entity.address, registry)
        } else {
            Vec::new()
        };

        debug!(
            symbol = %entity.symbol,
            pool = pool.status_label(),
            "entity collected"
        );

        EntitySnapshot {
            symbol: entity.symbol.clone(),
            name: entity.name.clone(),
            category: entity.category,
            address: entity.address.clone(),
            vesting,
            pool,
            products,
            anomalies: Vec::new(),
        }
    }

    async fn read_vesting(&self, entity: &TrackedEntity) -> VestingReading {
        match self.reader.vesting_data(&entity.address, &self.wallet).await {
            Ok(totals) => {
                let reading = VestingReading::from(VestingState::from_totals(
                    totals.total,
                    totals.released,
                ));
                if let VestingReading::Anomaly { reason, .. } = &reading {
                    warn!(symbol = %entity.symbol, %reason, "vesting anomaly");
                }
                reading
            }
            Err(e) => {
                warn!(symbol = %entity.symbol, error = %e, "vesting read failed");
                VestingReading::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn read_pool(&self, entity: &TrackedEntity) -> PoolReading {
        match self.reader.pool_state(&entity.address).await {
            Ok(record) => classify_pool(&entity.symbol, record),
            Err(e) => {
                warn!(symbol = %entity.symbol, error = %e, "pool state read failed");
                PoolReading::NotFound {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn classify_pool(symbol: &str, record: PoolStateRecord) -> PoolReading {
    let Some(status) = PoolStatus::from_code(record.status_code) else {
        warn!(symbol, code = record.status_code, "unknown pool status code");
        return PoolReading::NotFound {
            reason: format!("unknown pool status code {}", record.status_code),
        };
    };
    let pool_id = derive_pool_id(&record.key);
    PoolReading::Found(PoolState {
        status,
        key: record.key,
        pool_id,
        numeraire: record.numeraire,
        far_tick: record.far_tick,
    })
}

/// Symbols of registry entities priced against `builder`, in registry order.
fn products_of(builder: &Address, registry: &[TrackedEntity]) -> Vec<String> {
    registry
        .iter()
        .filter(|e| e.numeraire.as_ref() == Some(builder))
        .map(|e| e.symbol.clone())
        .collect()
}
