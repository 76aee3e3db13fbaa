//! # Snapshot Repository
//!
//! Key-value storage for order snapshots.
//!
//! ## Write Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every change to the open order                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT ... ON CONFLICT(key) DO UPDATE   ← full payload, one statement │
//! │                                                                         │
//! │  First draft save (placeholder id → durable id)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │  1. upsert "order_data_<durable>"                               │   │
//! │  │  2. DELETE "order_data_local-…"                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← a crash leaves either the old key or the new one, never both │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tavola_core::OrderId;

const UPSERT_SQL: &str = r#"
    INSERT INTO order_snapshots (key, payload, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        payload = excluded.payload,
        updated_at = excluded.updated_at
"#;

/// Repository for order snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    /// Creates a new SnapshotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Reads the payload stored under `key`.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM order_snapshots WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        debug!(key = %key, found = payload.is_some(), "Snapshot read");
        Ok(payload)
    }

    /// Writes the full payload under `key`, replacing any previous one.
    pub async fn put(&self, key: &str, payload: &str) -> DbResult<()> {
        sqlx::query(UPSERT_SQL)
            .bind(key)
            .bind(payload)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        debug!(key = %key, bytes = payload.len(), "Snapshot written");
        Ok(())
    }

    /// Deletes the snapshot under `key`.
    ///
    /// ## Returns
    /// `true` if a row was removed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM order_snapshots WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(key = %key, removed = result.rows_affected(), "Snapshot deleted");
        Ok(result.rows_affected() > 0)
    }

    /// Moves a snapshot to a new key with a new payload in one transaction.
    pub async fn rekey(&self, old_key: &str, new_key: &str, payload: &str) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(UPSERT_SQL)
            .bind(new_key)
            .bind(payload)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

        if old_key != new_key {
            sqlx::query("DELETE FROM order_snapshots WHERE key = ?")
                .bind(old_key)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(old_key = %old_key, new_key = %new_key, "Snapshot re-keyed");
        Ok(())
    }

    /// Number of stored snapshots.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_snapshots")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Ids of all orders stored under `prefix`, most recently written first.
    ///
    /// ## Usage
    /// Lets the terminal offer drafts left behind by a failed exit save.
    pub async fn order_ids(&self, prefix: &str) -> DbResult<Vec<OrderId>> {
        // substr instead of LIKE: '_' in the prefix is a LIKE wildcard
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT key FROM order_snapshots WHERE substr(key, 1, length(?)) = ? ORDER BY updated_at DESC",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(prefix))
            .map(OrderId::parse)
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
