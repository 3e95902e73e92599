//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by concern:
//! - `mod.rs` - Tracked entity registry
//! - `snapshots.rs` - Append-only snapshot store
//! - `history.rs` - Bounded snapshot summaries and claim batches

mod history;
mod snapshots;

pub use history::HistoryView;

use super::StoreError;
use crate::domain::{Address, Category, TimeMs, TrackedEntity};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // =========================================================================
    // Registry operations
    // =========================================================================

    /// Insert or refresh a registry record, keyed by symbol.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_entity(&self, entity: &TrackedEntity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tracked_entities (symbol, name, category, address, numeraire, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(symbol) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                address = excluded.address,
                numeraire = excluded.numeraire,
                created_at_ms = excluded.created_at_ms
            "#,
        )
        .bind(&entity.symbol)
        .bind(&entity.name)
        .bind(entity.category.as_str())
        .bind(entity.address.as_str())
        .bind(entity.numeraire.as_ref().map(|a| a.as_str()))
        .bind(entity.created_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Upsert several records in one transaction.
    ///
    /// Returns the number of records written.
    pub async fn upsert_entities(&self, entities: &[TrackedEntity]) -> Result<usize, StoreError> {
        if entities.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for entity in entities {
            sqlx::query(
                r#"
                INSERT INTO tracked_entities (symbol, name, category, address, numeraire, created_at_ms)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(symbol) DO UPDATE SET
                    name = excluded.name,
                    category = excluded.category,
                    address = excluded.address,
                    numeraire = excluded.numeraire,
                    created_at_ms = excluded.created_at_ms
                "#,
            )
            .bind(&entity.symbol)
            .bind(&entity.name)
            .bind(entity.category.as_str())
            .bind(entity.address.as_str())
            .bind(entity.numeraire.as_ref().map(|a| a.as_str()))
            .bind(entity.created_at.as_ms())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(entities.len())
    }

    /// All tracked entities, ordered by symbol.
    ///
    /// This order is the collection order of every cycle.
    pub async fn list_entities(&self) -> Result<Vec<TrackedEntity>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, name, category, address, numeraire, created_at_ms
            FROM tracked_entities
            ORDER BY symbol ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entity_from_row).collect()
    }

    pub async fn get_entity(&self, symbol: &str) -> Result<Option<TrackedEntity>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT symbol, name, category, address, numeraire, created_at_ms
            FROM tracked_entities
            WHERE symbol = ?
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entity_from_row).transpose()
    }
}

fn entity_from_row(row: &SqliteRow) -> Result<TrackedEntity, StoreError> {
    let corrupt = |detail: String| StoreError::Corrupt {
        table: "tracked_entities",
        detail,
    };

    let symbol: String = row.get("symbol");
    let category: String = row.get("category");
    let address: String = row.get("address");
    let numeraire: Option<String> = row.get("numeraire");

    let category = category
        .parse::<Category>()
        .map_err(|e| corrupt(format!("{}: {}", symbol, e)))?;
    let address =
        Address::parse(&address).map_err(|e| corrupt(format!("{}: {}", symbol, e)))?;
    let numeraire = numeraire
        .map(|n| Address::parse(&n))
        .transpose()
        .map_err(|e| corrupt(format!("{}: {}", symbol, e)))?;

    Ok(TrackedEntity {
        name: row.get("name"),
        category,
        address,
        numeraire,
        created_at: TimeMs::new(row.get::<i64, _>("created_at_ms")),
        symbol,
    })
}
