//! # Draft State
//!
//! Where the open order lives, as a three-state machine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Empty ──first mutation──► LocalDraft ──draft save──► RemotePersisted  │
//! │   no snapshot, no remote     local id, snapshot        durable id       │
//! │                                              (guard: ≥ 1 item)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use tavola_core::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    /// Nothing stored anywhere yet.
    Empty,
    /// Snapshot stored under a local placeholder id.
    LocalDraft,
    /// The remote service knows the order.
    RemotePersisted,
}

impl DraftState {
    /// State right after mounting `order_id`.
    pub fn for_mount(order_id: &OrderId, snapshot_found: bool) -> Self {
        if order_id.is_durable() {
            DraftState::RemotePersisted
        } else if snapshot_found {
            DraftState::LocalDraft
        } else {
            DraftState::Empty
        }
    }

    /// State after any mutation has been written to the snapshot store.
    pub fn after_mutation(self) -> Self {
        match self {
            DraftState::Empty => DraftState::LocalDraft,
            other => other,
        }
    }

    /// State after an explicit draft save of `order_id`.
    ///
    /// Only a local draft holding at least one item may be saved.
    pub fn after_draft_saved(self, order_id: &OrderId, has_items: bool) -> SyncResult<Self> {
        match self {
            DraftState::RemotePersisted => Err(SyncError::AlreadyPersisted(order_id.to_string())),
            _ if !has_items => Err(SyncError::NothingToSave(order_id.to_string())),
            _ => Ok(DraftState::RemotePersisted),
        }
    }

    /// True when a snapshot exists in the local store.
    pub fn is_stored_locally(&self) -> bool {
        !matches!(self, DraftState::Empty)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, DraftState::RemotePersisted)
    }
}

impl std::fmt::Display for DraftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftState::Empty => write!(f, "empty"),
            DraftState::LocalDraft => write!(f, "local_draft"),
            DraftState::RemotePersisted => write!(f, "remote_persisted"),
        }
    }
}
