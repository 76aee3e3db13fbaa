//! # tavola-core: Pure Checkout Engine for Tavola POS
//!
//! This crate is the **heart** of the checkout screen. It owns the open
//! restaurant order and all the arithmetic around it, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavola POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Checkout Screen                              │   │
//! │  │    Product grid ──► Guest tabs ──► Discount modal ──► Pay       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tavola-sync (DraftSession)                       │   │
//! │  │    mount, apply(transition), exit                               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tavola-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ exclusion │  │ discount  │  │   guest   │  │   order   │  │   │
//! │  │   │  Resolver │  │ compute_  │  │  Ledger   │  │ Aggregate │  │   │
//! │  │   │  rules    │  │ discount  │  │ LineItem  │  │  totals   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tavola-db (Snapshot Store)                      │   │
//! │  │              SQLite, migrations, snapshot repository            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Reference data (catalog items, rules, customers, order ids)
//! - [`money`] - Decimal money, rounded only for display
//! - [`exclusion`] - Which items a discount may touch
//! - [`discount`] - Discount kinds and the amount calculation
//! - [`guest`] - Line items and per-guest ledgers
//! - [`order`] - The order aggregate and its transitions
//! - [`validation`] - Parsing of free-form screen input
//! - [`snapshot`] - Local snapshot format
//! - [`remote`] - Remote order service shapes
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Transitions**: `(&state, args) -> new state`, the old state is untouched
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Derived Totals**: Every total is a sum of its parts, recomputed on each change
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tavola_core::{DiscountKind, ExclusionResolver, ItemRef, Money, OrderAggregate, OrderId};
//!
//! let resolver = ExclusionResolver::default();
//! let order = OrderAggregate::empty(OrderId::new_local(), 1, Some(4))?
//!     .add_item_to_selected(&resolver, ItemRef::product("soup"), Money::from_major(100))?
//!     .set_selected_discount(&resolver, DiscountKind::Percentage, Decimal::from(10))?;
//!
//! assert_eq!(order.total_discount(), Money::from_major(10));
//! assert_eq!(order.total_amount().to_string(), "90.00");
//! # Ok::<(), tavola_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod exclusion;
pub mod guest;
pub mod money;
pub mod order;
pub mod remote;
pub mod snapshot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tavola_core::Money` instead of
// `use tavola_core::money::Money`

pub use discount::{compute_discount, Discount, DiscountKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use exclusion::{Eligibility, ExclusionReason, ExclusionResolver, ExclusionSplit};
pub use guest::{GuestLedger, LineItem};
pub use money::Money;
pub use order::{GuestPayment, OrderAggregate, OrderIdentity, PaymentHandoff};
pub use remote::{CreateDraftRequest, CreateDraftResponse, DraftItemPayload, RemoteOrder, RemoteOrderItem};
pub use snapshot::OrderSnapshot;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price, in major units
///
/// ## Business Reason
/// Keeps every line, guest and order sum far inside the decimal range, so
/// no total can overflow however the data reached the order.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

/// Maximum distinct lines on one guest
pub const MAX_GUEST_ITEMS: usize = 100;

/// Maximum guests on one order
///
/// ## Business Reason
/// Banquet tables top out well below this; anything larger is a typo in the
/// guest-count field.
pub const MAX_GUESTS: u32 = 50;

/// Highest table number accepted from navigation
pub const MAX_TABLE_NUMBER: u32 = 9999;

/// Default prefix of local snapshot keys; `[storage] key_prefix` overrides it
pub const SNAPSHOT_KEY_PREFIX: &str = "order_data_";
