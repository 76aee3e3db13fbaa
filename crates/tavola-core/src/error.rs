//! # Error Types
//!
//! Domain-specific error types for tavola-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tavola-core errors (this file)                                        │
//! │  ├── CoreError        - Transition precondition failures               │
//! │  └── ValidationError  - Input rejected at the UI boundary              │
//! │                                                                         │
//! │  tavola-db errors (separate crate)                                     │
//! │  └── DbError          - Snapshot store failures                        │
//! │                                                                         │
//! │  tavola-sync errors (separate crate)                                   │
//! │  └── SyncError        - Remote / store / config failures               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → checkout screen       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core checkout errors.
///
/// Most of these are precondition failures of the transition functions. Given
/// the closed set of entry points on the checkout screen they should not occur
/// in practice, but every transition checks them instead of panicking.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Guest number does not reference a guest of the order.
    #[error("Guest {0} does not exist")]
    GuestNotFound(u32),

    /// Line item id is not present on the guest.
    #[error("Item {item_id} not found on guest {guest_number}")]
    ItemNotFound { guest_number: u32, item_id: String },

    /// The order always keeps at least one guest.
    #[error("Cannot remove the last guest of an order")]
    LastGuest,

    /// Source and target of a merge or move are the same guest.
    #[error("Guest {0} cannot be both source and target")]
    SameGuest(u32),

    /// Guests with items are merged away, never removed.
    #[error("Guest {0} still has items")]
    GuestNotEmpty(u32),

    /// Guest limit reached.
    #[error("Order cannot have more than {max} guests")]
    TooManyGuests { max: u32 },

    /// Guest has reached the maximum number of distinct lines.
    #[error("Guest cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Nothing payable on the order.
    #[error("Order {order_id} has nothing to pay")]
    NothingToPay { order_id: String },

    /// A remote order line could not be mapped to a line item.
    #[error("Remote item {item_id} is invalid: {reason}")]
    InvalidRemoteItem { item_id: String, reason: String },

    /// A structural or arithmetic invariant does not hold.
    #[error("Order invariant violated: {0}")]
    InvariantViolation(String),

    /// A stored snapshot could not be decoded or breaks an invariant.
    #[error("Corrupt order snapshot: {0}")]
    CorruptSnapshot(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by the parsing adapter that sits between the free-form text fields
/// of the checkout screen and the typed transitions.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., not a number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
