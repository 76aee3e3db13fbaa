//! # Validation Module
//!
//! The thin adapter between free-form checkout inputs and typed transitions.
//!
//! ## Where Parsing Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Checkout screen                                                        │
//! │  ├── discount field, quantity stepper, table number (text)             │
//! │  └── parsed on blur / submit                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE                                                            │
//! │  ├── text → Decimal / u32 / OrderId                                    │
//! │  └── range checks (percentage ≤ 100, quantity ≤ 999, ...)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Guest / Order transitions                                              │
//! │  └── only ever see validated, typed values                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tavola_core::discount::DiscountKind;
//! use tavola_core::validation::{parse_discount_input, validate_quantity};
//!
//! let value = parse_discount_input(DiscountKind::Percentage, " 12,5 ").unwrap();
//! assert_eq!(value.to_string(), "12.5");
//! assert!(parse_discount_input(DiscountKind::Percentage, "120").is_err());
//! assert!(validate_quantity(5).is_ok());
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::discount::DiscountKind;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{OrderId, LOCAL_ORDER_ID_PREFIX};
use crate::{MAX_GUESTS, MAX_ITEM_QUANTITY, MAX_TABLE_NUMBER, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest order id accepted from navigation parameters.
const MAX_ORDER_ID_LEN: usize = 64;

// =============================================================================
// Numeric Text
// =============================================================================

/// Parses decimal text typed by the operator.
///
/// Accepts a comma as decimal separator, since that is what the numeric
/// keypad produces on most terminals.
fn parse_decimal(field: &str, raw: &str) -> ValidationResult<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Decimal::from_str(&text.replace(',', ".")).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a number".to_string(),
    })
}

/// Parses the discount field for the chosen kind.
///
/// ## Rules
/// - `none`: input ignored, value is zero
/// - `percentage`: number in 0..=100
/// - `fixed`: non-negative number
///
/// Values above 100% are rejected, never clamped.
pub fn parse_discount_input(kind: DiscountKind, raw: &str) -> ValidationResult<Decimal> {
    if kind == DiscountKind::None {
        return Ok(Decimal::ZERO);
    }

    let value = parse_decimal("discount", raw)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        });
    }

    if kind == DiscountKind::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(value)
}

/// Parses a price typed into an open-price field.
pub fn parse_price(raw: &str) -> ValidationResult<Money> {
    let price = Money::from_decimal(parse_decimal("price", raw)?);
    validate_price(price)?;
    Ok(price)
}

// =============================================================================
// Quantity / Price Validators
// =============================================================================

/// Validates an absolute item quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a +/- step. Zero is pointless and rejected.
pub fn validate_quantity_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 || delta.unsigned_abs() > MAX_ITEM_QUANTITY.unsigned_abs() {
        return Err(ValidationError::OutOfRange {
            field: "quantity change".to_string(),
            min: -MAX_ITEM_QUANTITY,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (complimentary items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if price > Money::from_major(MAX_UNIT_PRICE) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

// =============================================================================
// Navigation Parameters
// =============================================================================

/// Validates the guest count handed over when the screen opens.
pub fn validate_guest_count(count: u32) -> ValidationResult<()> {
    if count == 0 || count > MAX_GUESTS {
        return Err(ValidationError::OutOfRange {
            field: "guest count".to_string(),
            min: 1,
            max: i64::from(MAX_GUESTS),
        });
    }

    Ok(())
}

/// Parses an optional table number; blank means "no table" (takeaway).
pub fn validate_table_number(raw: &str) -> ValidationResult<Option<u32>> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let number: u32 = text.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "table number".to_string(),
        reason: "must be a whole number".to_string(),
    })?;

    if number == 0 || number > MAX_TABLE_NUMBER {
        return Err(ValidationError::OutOfRange {
            field: "table number".to_string(),
            min: 1,
            max: i64::from(MAX_TABLE_NUMBER),
        });
    }

    Ok(Some(number))
}

/// Validates an order id from navigation and classifies it.
///
/// ## Rules
/// - Must not be empty, at most 64 characters
/// - Letters, digits, hyphens and underscores only
/// - A local placeholder must carry a valid UUID after the prefix
///
/// ## Example
/// ```rust
/// use tavola_core::validation::validate_order_id;
///
/// assert!(validate_order_id("1842").unwrap().is_durable());
/// assert!(validate_order_id("local-550e8400-e29b-41d4-a716-446655440000").unwrap().is_local());
/// assert!(validate_order_id("local-nope").is_err());
/// ```
pub fn validate_order_id(raw: &str) -> ValidationResult<OrderId> {
    let id = raw.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "order id".to_string(),
        });
    }

    if id.len() > MAX_ORDER_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "order id".to_string(),
            max: MAX_ORDER_ID_LEN,
        });
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "order id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    if let Some(uuid) = id.strip_prefix(LOCAL_ORDER_ID_PREFIX) {
        Uuid::parse_str(uuid).map_err(|_| ValidationError::InvalidFormat {
            field: "order id".to_string(),
            reason: "local id must end in a valid UUID".to_string(),
        })?;
    }

    Ok(OrderId::parse(id))
}

// =============================================================================
// Unit Tests
// =============================================================================
