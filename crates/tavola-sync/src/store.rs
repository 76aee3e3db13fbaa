//! # Snapshot Store
//!
//! The key-value seam between the synchronizer and wherever snapshots live.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     SnapshotStore (trait)                               │
//! │                                                                         │
//! │  DraftSession ──► Arc<dyn SnapshotStore>                                │
//! │                        │                                                │
//! │          ┌─────────────┴──────────────┐                                 │
//! │          ▼                            ▼                                 │
//! │  SnapshotRepository           MemorySnapshotStore                       │
//! │  (tavola-db, SQLite)          (tokio Mutex<HashMap>)                    │
//! │  migrate = one transaction    tests and offline demos                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are whole serialized snapshots: every write replaces the full
//! value, never a field of it.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::SyncResult;
use tavola_db::SnapshotRepository;

/// Key-value storage for serialized order snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Reads the value under `key`.
    async fn load(&self, key: &str) -> SyncResult<Option<String>>;

    /// Writes the full value under `key`.
    async fn save(&self, key: &str, value: &str) -> SyncResult<()>;

    /// Removes `key`; removing a missing key is not an error.
    async fn delete(&self, key: &str) -> SyncResult<()>;

    /// Moves a snapshot from `old_key` to `new_key`, writing `value`.
    ///
    /// The default writes the new key first, so a failure in between leaves
    /// a duplicate rather than nothing.
    async fn migrate(&self, old_key: &str, new_key: &str, value: &str) -> SyncResult<()> {
        self.save(new_key, value).await?;
        if old_key != new_key {
            self.delete(old_key).await?;
        }
        Ok(())
    }
}

// =============================================================================
// SQLite
// =============================================================================

#[async_trait]
impl SnapshotStore for SnapshotRepository {
    async fn load(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.get(key).await?)
    }

    async fn save(&self, key: &str, value: &str) -> SyncResult<()> {
        Ok(self.put(key, value).await?)
    }

    async fn delete(&self, key: &str) -> SyncResult<()> {
        SnapshotRepository::delete(self, key).await?;
        Ok(())
    }

    async fn migrate(&self, old_key: &str, new_key: &str, value: &str) -> SyncResult<()> {
        Ok(self.rekey(old_key, new_key, value).await?)
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Snapshot store held in process memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        MemorySnapshotStore {
            entries: Mutex::new(entries),
        }
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> SyncResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> SyncResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn migrate(&self, old_key: &str, new_key: &str, value: &str) -> SyncResult<()> {
        // Single lock: no reader sees both keys or neither
        let mut entries = self.entries.lock().await;
        entries.remove(old_key);
        entries.insert(new_key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
