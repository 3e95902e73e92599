//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Repository layer: entity registry, snapshot store and history log

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{HistoryView, Repository};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("snapshot at {attempted} is not newer than latest snapshot at {latest}")]
    NonIncreasingTimestamp { latest: i64, attempted: i64 },
    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i64, supported: i64 },
}
