//! # tavola-db: Local Snapshot Store for Tavola POS
//!
//! Keeps the open order's snapshot on the terminal, so a crash or a power
//! cut never loses what the waiter has keyed in.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavola POS Data Flow                             │
//! │                                                                         │
//! │  DraftSession::apply (tavola-sync)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tavola-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repositories    │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │   (snapshot.rs)    │  │ (embedded) │  │   │
//! │  │   │               │    │                    │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ SnapshotRepository │  │ 001_order_ │  │   │
//! │  │   │ WAL           │    │ get/put/delete     │  │ snapshots  │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/tavola.db                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Opening the snapshot database
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tavola_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tavola.db")).await?;
//! db.snapshots().put("order_data_1842", &json).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::snapshot::SnapshotRepository;
