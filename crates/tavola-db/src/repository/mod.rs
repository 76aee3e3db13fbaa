//! # Repository Module
//!
//! Database repository implementations for Tavola POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  DraftSession (tavola-sync)                                            │
//! │       │                                                                 │
//! │       │  store.save("order_data_local-…", json)                        │
//! │       ▼                                                                 │
//! │  SnapshotRepository                                                     │
//! │  ├── get(&self, key)                                                   │
//! │  ├── put(&self, key, payload)                                          │
//! │  ├── delete(&self, key)                                                │
//! │  └── rekey(&self, old, new, payload)   (one transaction)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: order_snapshots                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`snapshot::SnapshotRepository`] - Order snapshot key-value storage

pub mod snapshot;
