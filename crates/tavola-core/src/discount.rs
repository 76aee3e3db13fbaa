//! # Discount Calculator
//!
//! Turns an eligible subtotal plus a discount setting into an amount.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kind         amount                          notes                     │
//! │  ──────────   ─────────────────────────────   ───────────────────────   │
//! │  none         0                               value ignored             │
//! │  percentage   eligible × value / 100          value validated 0..=100   │
//! │                                               by the UI adapter         │
//! │  fixed        min(value, eligible)            never below zero total    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exclusions are applied by the caller: the calculator only ever sees the
//! eligible amount. It has no error path.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Discount type selected for a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    #[default]
    None,
    Percentage,
    Fixed,
}

/// Discount value object attached to a guest.
///
/// `value` is a percentage for [`DiscountKind::Percentage`], a currency amount
/// for [`DiscountKind::Fixed`], and zero for [`DiscountKind::None`]. `amount`
/// is derived and refreshed whenever the kind, the value, or the guest's
/// eligible subtotal changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub kind: DiscountKind,
    #[ts(type = "string")]
    pub value: Decimal,
    pub amount: Money,
}

impl Discount {
    /// No discount.
    pub fn none() -> Self {
        Discount::default()
    }

    /// A discount setting with its amount computed against `eligible_amount`.
    pub fn computed(kind: DiscountKind, value: Decimal, eligible_amount: Money) -> Self {
        match kind {
            DiscountKind::None => Discount::none(),
            _ => Discount {
                kind,
                value,
                amount: compute_discount(eligible_amount, kind, value),
            },
        }
    }

    /// Same kind and value, amount refreshed against a new base.
    pub fn recomputed(&self, eligible_amount: Money) -> Self {
        Discount::computed(self.kind, self.value, eligible_amount)
    }

    pub fn is_none(&self) -> bool {
        self.kind == DiscountKind::None
    }
}

/// `computeDiscount(eligibleAmount, type, value)`.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tavola_core::discount::{compute_discount, DiscountKind};
/// use tavola_core::money::Money;
///
/// let eligible = Money::from_major(600);
/// let amount = compute_discount(eligible, DiscountKind::Percentage, Decimal::from(10));
/// assert_eq!(amount, Money::from_major(60));
///
/// let capped = compute_discount(Money::from_major(50), DiscountKind::Fixed, Decimal::from(80));
/// assert_eq!(capped, Money::from_major(50));
/// ```
pub fn compute_discount(eligible_amount: Money, kind: DiscountKind, value: Decimal) -> Money {
    match kind {
        DiscountKind::None => Money::zero(),
        DiscountKind::Percentage => eligible_amount.percentage(value),
        DiscountKind::Fixed => Money::from_decimal(value).min(eligible_amount),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
