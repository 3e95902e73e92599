//! Append-only snapshot store.

use super::Repository;
use crate::db::StoreError;
use crate::domain::Snapshot;
use sqlx::Row;
use tracing::debug;

impl Repository {
    /// Persist a snapshot under its timestamp.
    ///
    /// The insert runs in one transaction together with the "strictly newer
    /// than latest" check, and never replaces an existing row.
    ///
    /// # Errors
    /// `NonIncreasingTimestamp` if `snapshot` is not newer than the latest
    /// stored snapshot; a database error on duplicate keys or I/O failure.
    pub async fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let body = serde_json::to_string(snapshot)?;
        let attempted = snapshot.taken_at.as_ms();

        let mut tx = self.pool.begin().await?;

        let latest: Option<i64> = sqlx::query("SELECT MAX(taken_at_ms) AS latest FROM snapshots")
            .fetch_one(&mut *tx)
            .await?
            .get("latest");
        if let Some(latest) = latest {
            if attempted <= latest {
                return Err(StoreError::NonIncreasingTimestamp { latest, attempted });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO snapshots (taken_at_ms, schema_version, wallet, body)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(attempted)
        .bind(snapshot.schema_version as i64)
        .bind(snapshot.wallet.as_str())
        .bind(body)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(taken_at_ms = attempted, "snapshot stored");
        Ok(())
    }

    /// Most recently written snapshot, if any.
    ///
    /// `taken_at_ms` is the table's integer primary key, so this is an index
    /// seek rather than a scan.
    pub async fn latest_snapshot(&self) -> Result<Option<Snapshot>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT body FROM snapshots
            ORDER BY taken_at_ms DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    pub async fn count_snapshots(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM snapshots")
            .fetch_one(&self.pool)
            .await?
            .get("n");
        Ok(count)
    }
}
