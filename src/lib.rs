pub mod abi;
pub mod api;
pub mod chain;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod registry;

pub use chain::{ChainError, ChainReader, Signer};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{Address, Amount, Snapshot, TimeMs, TrackedEntity};
pub use error::AppError;
pub use orchestration::{CycleResult, Heartbeat};
