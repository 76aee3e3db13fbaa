//! # tavola-sync: Draft Synchronizer for Tavola POS
//!
//! Keeps the open order safe on the terminal and gets it to the remote order
//! service without ever blocking the waiter.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Draft Synchronizer                                │
//! │                                                                         │
//! │  Checkout screen                                                        │
//! │       │ mount / apply / exit                                            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  DraftSession (session.rs)                                      │   │
//! │  │  OrderAggregate + ExclusionResolver + DraftState                │   │
//! │  └───────────────┬───────────────────────────────┬─────────────────┘   │
//! │                  │ every change                  │ exit / refresh      │
//! │                  ▼                               ▼                     │
//! │  ┌───────────────────────────┐   ┌─────────────────────────────────┐   │
//! │  │ SnapshotStore (store.rs)  │   │ RemoteOrderService (remote.rs)  │   │
//! │  │ SQLite / in-memory        │   │ HTTP / offline                  │   │
//! │  └───────────────────────────┘   └─────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`session`] - Mount, apply, refresh, save and exit
//! - [`state`] - Empty / LocalDraft / RemotePersisted machine
//! - [`store`] - Snapshot store trait and implementations
//! - [`remote`] - Remote order service trait and HTTP client
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tavola_sync::{DraftSynchronizer, HttpOrderService, MountParams};
//!
//! let sync = DraftSynchronizer::new(Arc::new(db.snapshots()), Arc::new(http));
//! let mut session = sync.mount(MountParams::new(None).guest_count(2), resolver).await?;
//! session.apply(|order, r| order.add_item_to_selected(r, item_ref, price)).await?;
//! if let ExitOutcome::SavingDraft(save) = session.exit().await {
//!     // navigation goes on; the save finishes on its own
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod state;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{RemoteSettings, StorageSettings, SyncConfig, TerminalConfig};
pub use error::{SyncError, SyncResult};
pub use remote::{HttpOrderService, OfflineOrderService, RemoteOrderService};
pub use session::{DraftSession, DraftSynchronizer, ExitOutcome, MountParams, MountSource};
pub use state::DraftState;
pub use store::{MemorySnapshotStore, SnapshotStore};
