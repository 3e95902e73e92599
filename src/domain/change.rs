//! Typed state transitions between two snapshots.

use crate::domain::Amount;
use serde::{Deserialize, Serialize};

/// One detected transition for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChangeEvent {
    NewEntity {
        symbol: String,
    },
    PoolStatusChange {
        symbol: String,
        from: String,
        to: String,
    },
    VestingClaimed {
        symbol: String,
        amount: Amount,
    },
}

impl ChangeEvent {
    pub fn symbol(&self) -> &str {
        match self {
            ChangeEvent::NewEntity { symbol }
            | ChangeEvent::PoolStatusChange { symbol, .. }
            | ChangeEvent::VestingClaimed { symbol, .. } => symbol,
        }
    }
}

/// Transition that the domain model says cannot happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiffAnomaly {
    ReleasedDecreased {
        symbol: String,
        previous: Amount,
        current: Amount,
    },
}

impl DiffAnomaly {
    pub fn symbol(&self) -> &str {
        match self {
            DiffAnomaly::ReleasedDecreased { symbol, .. } => symbol,
        }
    }
}
