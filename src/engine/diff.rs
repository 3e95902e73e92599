//! Change detection between successive snapshots.

use crate::domain::{ChangeEvent, DiffAnomaly, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of comparing a snapshot with its predecessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// No previous snapshot existed, so nothing is reported.
    pub is_first: bool,
    pub changes: Vec<ChangeEvent>,
    pub anomalies: Vec<DiffAnomaly>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.anomalies.is_empty()
    }
}

/// Diff `current` against `previous`.
///
/// Events follow the entity order of `current`; within one entity the order
/// is new entity, pool status, vesting. Entities missing from `current` are
/// not reported.
pub fn diff(current: &Snapshot, previous: Option<&Snapshot>) -> ChangeSet {
    let Some(previous) = previous else {
        return ChangeSet {
            is_first: true,
            ..ChangeSet::default()
        };
    };

    let before: HashMap<&str, _> = previous
        .entities
        .iter()
        .map(|e| (e.symbol.as_str(), e))
        .collect();

    let mut set = ChangeSet::default();
    for entity in &current.entities {
        let Some(prev) = before.get(entity.symbol.as_str()) else {
            set.changes.push(ChangeEvent::NewEntity {
                symbol: entity.symbol.clone(),
            });
            continue;
        };

        let from = prev.pool.status_label();
        let to = entity.pool.status_label();
        if from != to {
            set.changes.push(ChangeEvent::PoolStatusChange {
                symbol: entity.symbol.clone(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        if let (Some(was), Some(now)) = (prev.vesting.released(), entity.vesting.released()) {
            let delta = now - was;
            if delta.is_positive() {
                set.changes.push(ChangeEvent::VestingClaimed {
                    symbol: entity.symbol.clone(),
                    amount: delta,
                });
            } else if delta.is_negative() {
                set.anomalies.push(DiffAnomaly::ReleasedDecreased {
                    symbol: entity.symbol.clone(),
                    previous: was,
                    current: now,
                });
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Address, Amount, Category, EntitySnapshot, PoolId, PoolKey, PoolReading, PoolState,
        PoolStatus, TimeMs, VestingReading, VestingState,
    };

    fn amt(v: u128) -> Amount {
        Amount::from_raw(v).unwrap()
    }

    fn pool(status: PoolStatus) -> PoolReading {
        PoolReading::Found(PoolState {
            status,
            key: PoolKey {
                currency0: Address::zero(),
                currency1: Address::zero(),
                fee: 0,
                tick_spacing: 1,
                hooks: Address::zero(),
            },
            pool_id: PoolId([0u8; 32]),
            numeraire: Address::zero(),
            far_tick: 0,
        })
    }

    fn entity(symbol: &str, pool: PoolReading, released: u128) -> EntitySnapshot {
        EntitySnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            category: Category::Builder,
            address: Address::zero(),
            vesting: VestingReading::Available(
                VestingState::from_totals(amt(1_000), amt(released)).unwrap(),
            ),
            pool,
            products: vec![],
            anomalies: vec![],
        }
    }

    fn snapshot(at: i64, entities: Vec<EntitySnapshot>) -> Snapshot {
        Snapshot::new(TimeMs::new(at), Address::zero(), entities)
    }

    #[test]
    fn test_first_cycle_reports_nothing() {
        let s = snapshot(1, vec![entity("A", pool(PoolStatus::Active), 10)]);
        let set = diff(&s, None);
        assert!(set.is_first);
        assert!(set.changes.is_empty());
        assert!(set.anomalies.is_empty());
    }

    #[test]
    fn test_diff_against_self_is_empty() {
        let s = snapshot(
            1,
            vec![
                entity("A", pool(PoolStatus::Active), 10),
                entity("B", PoolReading::NotFound { reason: "x".into() }, 0),
            ],
        );
        let set = diff(&s, Some(&s));
        assert!(!set.is_first);
        assert!(set.is_empty());
    }

    #[test]
    fn test_released_increase_yields_one_claim_event_with_delta() {
        let prev = snapshot(1, vec![entity("A", pool(PoolStatus::Active), 10)]);
        let cur = snapshot(2, vec![entity("A", pool(PoolStatus::Active), 35)]);
        let set = diff(&cur, Some(&prev));
        assert_eq!(
            set.changes,
            vec![ChangeEvent::VestingClaimed {
                symbol: "A".to_string(),
                amount: amt(25),
            }]
        );
    }

    #[test]
    fn test_released_decrease_is_anomaly_not_change() {
        let prev = snapshot(1, vec![entity("A", pool(PoolStatus::Active), 35)]);
        let cur = snapshot(2, vec![entity("A", pool(PoolStatus::Active), 10)]);
        let set = diff(&cur, Some(&prev));
        assert!(set.changes.is_empty());
        assert_eq!(
            set.anomalies,
            vec![DiffAnomaly::ReleasedDecreased {
                symbol: "A".to_string(),
                previous: amt(35),
                current: amt(10),
            }]
        );
    }

    #[test]
    fn test_status_transition_to_unavailable_is_reported() {
        let prev = snapshot(1, vec![entity("A", pool(PoolStatus::Active), 0)]);
        let cur = snapshot(
            2,
            vec![entity("A", PoolReading::NotFound { reason: "rpc".into() }, 0)],
        );
        let set = diff(&cur, Some(&prev));
        assert_eq!(
            set.changes,
            vec![ChangeEvent::PoolStatusChange {
                symbol: "A".to_string(),
                from: "Active".to_string(),
                to: "unavailable".to_string(),
            }]
        );
    }

    #[test]
    fn test_ordering_by_entity_then_kind() {
        let prev = snapshot(
            1,
            vec![
                entity("A", pool(PoolStatus::Initializing), 0),
                entity("GONE", pool(PoolStatus::Active), 0),
            ],
        );
        let cur = snapshot(
            2,
            vec![
                entity("A", pool(PoolStatus::Active), 5),
                entity("NEW", pool(PoolStatus::Active), 0),
            ],
        );
        let set = diff(&cur, Some(&prev));
        let kinds: Vec<(&str, &str)> = set
            .changes
            .iter()
            .map(|c| {
                let kind = match c {
                    ChangeEvent::NewEntity { .. } => "new",
                    ChangeEvent::PoolStatusChange { .. } => "pool",
                    ChangeEvent::VestingClaimed { .. } => "vesting",
                };
                (c.symbol(), kind)
            })
            .collect();
        assert_eq!(kinds, vec![("A", "pool"), ("A", "vesting"), ("NEW", "new")]);
    }
}
