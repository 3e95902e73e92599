//! Heartbeat orchestration: state collection, claim execution and the cycle
//! controller that ties them to persistence.

pub mod claims;
pub mod collector;
pub mod heartbeat;

pub use claims::ClaimExecutor;
pub use collector::Collector;
pub use heartbeat::{CycleError, CycleResult, Heartbeat, StatusReport};
