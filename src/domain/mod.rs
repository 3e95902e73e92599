//! Domain types for the heartbeat engine.
//!
//! This module provides:
//! - Primitives: TimeMs, Address, TxHash and lossless token amounts
//! - Registry records for tracked tokens
//! - Per-entity readings (vesting, pool) as explicit result types
//! - Snapshots, change events and claim outcomes with stable JSON layouts

pub mod amount;
pub mod change;
pub mod claim;
pub mod entity;
pub mod pool;
pub mod primitives;
pub mod snapshot;
pub mod vesting;

pub use amount::{Amount, AmountError};
pub use change::{ChangeEvent, DiffAnomaly};
pub use claim::{ClaimBatch, ClaimMode, ClaimOutcome, ClaimRecord};
pub use entity::{Category, TrackedEntity};
pub use pool::{PoolId, PoolKey, PoolReading, PoolState, PoolStatus};
pub use primitives::{Address, AddressParseError, TimeMs, TxHash};
pub use snapshot::{
    EntitySnapshot, HistoryEntry, Snapshot, SnapshotSummary, SNAPSHOT_SCHEMA_VERSION,
};
pub use vesting::{VestingAnomaly, VestingReading, VestingState};
