//! # Snapshot Database
//!
//! Opens the terminal's snapshot database and hands out the repository.
//!
//! ## Connection Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One Terminal, One Writer                            │
//! │                                                                         │
//! │  checkout screen ── every change ──┐                                    │
//! │  background draft save ── re-key ──┼──► SqlitePool (1 connection)       │
//! │  startup scan ── order_ids ────────┘          │                         │
//! │                                               ▼                         │
//! │                                   tavola.db (WAL, synchronous FULL)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshot writes are tiny and strictly ordered per order, so a single
//! connection serializes them without any lock contention inside SQLite.
//! A write that returned `Ok` is on disk: synchronous FULL syncs the WAL on
//! every commit, which is what "never lose the open order" needs.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::snapshot::SnapshotRepository;

/// Where the snapshot database lives.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file; `:memory:` for a throwaway database.
    pub database_path: PathBuf,

    /// How long a snapshot write waits for the connection before failing.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// File-backed snapshot database; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// In-memory database that lives as long as the [`Database`] (tests).
    pub fn in_memory() -> Self {
        DbConfig::new(":memory:")
    }
}

/// Handle to the snapshot database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening snapshot database");

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(config.busy_timeout);

        // The single connection is never recycled, so an in-memory
        // database keeps its rows for the life of the pool
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(config.busy_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Returns the snapshot repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let payload = db.snapshots().get("order_data_1842").await?;
    /// ```
    pub fn snapshots(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.pool.clone())
    }

    /// Closes the pool; later repository calls fail.
    pub async fn close(&self) {
        info!("Closing snapshot database");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
