//! Database bootstrap: connection pool, per-connection pragmas and schema.

use super::StoreError;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Layout of `schema.sql`, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Open (or create) the store at `db_path` and bring its schema up to date.
///
/// # Errors
/// `SchemaTooNew` if the file was written by a build with a newer layout.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "could not create database directory");
            }
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .after_connect(|conn, _meta| Box::pin(async move { configure_connection(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    let from = apply_schema(&pool).await?;
    info!(path = db_path, from, to = SCHEMA_VERSION, "store ready");
    Ok(pool)
}

/// Apply `schema.sql` in one transaction and stamp the version.
///
/// Every statement is `IF NOT EXISTS`, so reapplying is a no-op. Returns the
/// version found before applying.
async fn apply_schema(pool: &SqlitePool) -> Result<i64, StoreError> {
    let found: i64 = sqlx::query("PRAGMA user_version")
        .fetch_one(pool)
        .await?
        .get(0);
    if found > SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    let mut tx = pool.begin().await?;
    for statement in include_str!("schema.sql").split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
    }
    // PRAGMA takes no bind parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(found)
}

/// WAL plus a busy timeout lets a second process read the latest snapshot
/// while a cycle is writing.
async fn configure_connection(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;
    // Returns the mode actually in effect.
    let journal_mode: String = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?
        .get(0);
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&mut *conn)
        .await?;

    debug!(journal_mode = %journal_mode, "connection configured");
    Ok(())
}
