//! History log: FIFO-capped snapshot summaries and claim batches.

use super::Repository;
use crate::db::StoreError;
use crate::domain::{
    Address, ClaimBatch, ClaimMode, ClaimOutcome, ClaimRecord, HistoryEntry, PoolId, TimeMs,
    TxHash,
};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// Recent history as returned by `history()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    /// Oldest first.
    pub summaries: Vec<HistoryEntry>,
    /// Newest first.
    pub claim_batches: Vec<ClaimBatch>,
}

impl Repository {
    /// Append a summary and evict the oldest entries beyond `cap`.
    ///
    /// Insert and eviction commit together, so the cap is never half applied.
    /// Returns the number of evicted entries.
    pub async fn append_summary(
        &self,
        entry: &HistoryEntry,
        cap: usize,
    ) -> Result<u64, StoreError> {
        let summary = serde_json::to_string(&entry.summary)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO history_summaries (taken_at_ms, wallet, summary, change_count)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(entry.taken_at.as_ms())
        .bind(entry.wallet.as_str())
        .bind(summary)
        .bind(entry.change_count as i64)
        .execute(&mut *tx)
        .await?;

        let evicted = sqlx::query(
            r#"
            DELETE FROM history_summaries
            WHERE seq NOT IN (
                SELECT seq FROM history_summaries ORDER BY seq DESC LIMIT ?
            )
            "#,
        )
        .bind(cap as i64)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(evicted)
    }

    /// Up to `limit` most recent summaries, oldest first.
    pub async fn recent_summaries(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT taken_at_ms, wallet, summary, change_count FROM (
                SELECT seq, taken_at_ms, wallet, summary, change_count
                FROM history_summaries
                ORDER BY seq DESC
                LIMIT ?
            )
            ORDER BY seq ASC
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    /// Persist a claim batch and its records atomically.
    pub async fn append_claim_batch(&self, batch: &ClaimBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO claim_batches (id, executed_at_ms, mode)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(batch.id.to_string())
        .bind(batch.executed_at.as_ms())
        .bind(batch.mode.as_str())
        .execute(&mut *tx)
        .await?;

        for (position, record) in batch.records.iter().enumerate() {
            let (tx_hash, block_number, error) = match &record.outcome {
                ClaimOutcome::DryRun => (None, None, None),
                ClaimOutcome::Claimed {
                    tx_hash,
                    block_number,
                } => (Some(tx_hash.as_str()), Some(*block_number as i64), None),
                ClaimOutcome::Error { tx_hash, message } => (
                    tx_hash.as_ref().map(|t| t.as_str()),
                    None,
                    Some(message.as_str()),
                ),
            };

            sqlx::query(
                r#"
                INSERT INTO claim_records
                (batch_id, position, symbol, address, pool_id, outcome, tx_hash, block_number, error)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(batch.id.to_string())
            .bind(position as i64)
            .bind(&record.symbol)
            .bind(record.address.as_str())
            .bind(record.pool_id.to_hex())
            .bind(record.outcome.label())
            .bind(tx_hash)
            .bind(block_number)
            .bind(error)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Up to `limit` most recent claim batches, newest first.
    pub async fn recent_claim_batches(&self, limit: usize) -> Result<Vec<ClaimBatch>, StoreError> {
        let batch_rows = sqlx::query(
            r#"
            SELECT id, executed_at_ms, mode
            FROM claim_batches
            ORDER BY executed_at_ms DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut batches = Vec::with_capacity(batch_rows.len());
        for row in &batch_rows {
            let id_str: String = row.get("id");
            let id = Uuid::parse_str(&id_str).map_err(|e| StoreError::Corrupt {
                table: "claim_batches",
                detail: format!("{}: {}", id_str, e),
            })?;
            let mode_str: String = row.get("mode");
            let mode = ClaimMode::from_str(&mode_str).map_err(|e| StoreError::Corrupt {
                table: "claim_batches",
                detail: e,
            })?;

            let record_rows = sqlx::query(
                r#"
                SELECT symbol, address, pool_id, outcome, tx_hash, block_number, error
                FROM claim_records
                WHERE batch_id = ?
                ORDER BY position ASC
                "#,
            )
            .bind(&id_str)
            .fetch_all(&self.pool)
            .await?;

            let records = record_rows
                .iter()
                .map(claim_record_from_row)
                .collect::<Result<Vec<_>, _>>()?;

            batches.push(ClaimBatch {
                id,
                executed_at: TimeMs::new(row.get::<i64, _>("executed_at_ms")),
                mode,
                records,
            });
        }
        Ok(batches)
    }

    pub async fn history(&self, limit: usize) -> Result<HistoryView, StoreError> {
        Ok(HistoryView {
            summaries: self.recent_summaries(limit).await?,
            claim_batches: self.recent_claim_batches(limit).await?,
        })
    }
}

fn summary_from_row(row: &SqliteRow) -> Result<HistoryEntry, StoreError> {
    let wallet: String = row.get("wallet");
    let summary: String = row.get("summary");
    Ok(HistoryEntry {
        taken_at: TimeMs::new(row.get::<i64, _>("taken_at_ms")),
        wallet: Address::parse(&wallet).map_err(|e| StoreError::Corrupt {
            table: "history_summaries",
            detail: e.to_string(),
        })?,
        summary: serde_json::from_str(&summary)?,
        change_count: row.get::<i64, _>("change_count") as usize,
    })
}

fn claim_record_from_row(row: &SqliteRow) -> Result<ClaimRecord, StoreError> {
    let corrupt = |detail: String| StoreError::Corrupt {
        table: "claim_records",
        detail,
    };

    let symbol: String = row.get("symbol");
    let address: String = row.get("address");
    let pool_id: String = row.get("pool_id");
    let outcome: String = row.get("outcome");
    let tx_hash: Option<String> = row.get("tx_hash");
    let block_number: Option<i64> = row.get("block_number");
    let error: Option<String> = row.get("error");

    let outcome = match outcome.as_str() {
        "dry_run" => ClaimOutcome::DryRun,
        "claimed" => ClaimOutcome::Claimed {
            tx_hash: TxHash::new(
                tx_hash.ok_or_else(|| corrupt(format!("{}: claimed without tx_hash", symbol)))?,
            ),
            block_number: block_number
                .ok_or_else(|| corrupt(format!("{}: claimed without block", symbol)))?
                as u64,
        },
        "error" => ClaimOutcome::Error {
            tx_hash: tx_hash.map(TxHash::new),
            message: error.unwrap_or_default(),
        },
        other => return Err(corrupt(format!("{}: unknown outcome {}", symbol, other))),
    };

    Ok(ClaimRecord {
        address: Address::parse(&address).map_err(|e| corrupt(e.to_string()))?,
        pool_id: PoolId::from_hex(&pool_id).map_err(corrupt)?,
        outcome,
        symbol,
    })
}
