//! Pure derivations: pool identifiers, snapshot diffs and impact analysis.
//!
//! Nothing in here performs I/O, so every result can be recomputed later
//! from stored snapshots.

pub mod diff;
pub mod impact;
pub mod pool_id;

pub use diff::{diff, ChangeSet};
pub use impact::{analyze, BuilderHealth, Correlation, ImpactReport, ProductCorrelation};
pub use pool_id::{derive_pool_id, encode_pool_key};
