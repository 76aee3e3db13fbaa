//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE RECALCULATION PROBLEM                                              │
//! │                                                                         │
//! │  Guest totals are recomputed after EVERY click on the checkout screen. │
//! │  If each pass rounded the discount to cents, a 12.5% discount on       │
//! │  33.33 would drift every time quantities move up and down.             │
//! │                                                                         │
//! │  OUR SOLUTION: exact base-10 decimals, rounded only for display         │
//! │    33.33 × 12.5% = 4.16625    (kept internally)                         │
//! │    shown as      4.17         (Display / rounded())                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tavola_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price.multiply_quantity(3); // 32.97
//! assert_eq!(line, Money::from_cents(3297));
//! assert_eq!(line.to_string(), "32.97");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Decimal places shown to the operator.
pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A currency amount in major units (e.g. 10.99), backed by an exact decimal.
///
/// ## Design Decisions
/// - **Decimal, not f64**: `0.1 + 0.2` is exactly `0.3`
/// - **Full precision internally**: discount amounts are never rounded while
///   being accumulated; see [`Money::rounded`]
/// - **Serialized as a string**: `"10.99"`, which JSON numbers cannot promise
///
/// ## Where Money Flows
/// ```text
/// CatalogItem.price ──► LineItem.unit_price ──► LineItem.line_total
///                                                     │
///                         GuestLedger.subtotal ◄──────┘
///                                │
///                 Discount.amount ──► GuestLedger.final_amount
///                                                     │
///                     OrderAggregate.total_amount ◄───┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tavola_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, DISPLAY_DECIMAL_PLACES))
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Wraps an already-parsed decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact underlying amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tavola_core::money::Money;
    ///
    /// let unit_price = Money::from_major(200);
    /// assert_eq!(unit_price.multiply_quantity(2), Money::from_major(400));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns `pct` percent of this amount, unrounded.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tavola_core::money::Money;
    ///
    /// let base = Money::from_cents(3333);
    /// let part = base.percentage(Decimal::new(125, 1)); // 12.5%
    /// assert_eq!(part.amount(), Decimal::new(416625, 5));
    /// ```
    pub fn percentage(&self, pct: Decimal) -> Money {
        Money(self.0 * pct / Decimal::ONE_HUNDRED)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Rounds to display precision (2 places, half away from zero).
    ///
    /// ## When To Call
    /// Only at the edge: receipts, the checkout screen, payment handoff.
    /// Never feed a rounded value back into a recalculation.
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the rounded amount with exactly two decimals, no symbol.
///
/// ## Note
/// Currency symbols and localisation belong to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shown = self.rounded().0;
        shown.rescale(DISPLAY_DECIMAL_PLACES);
        write!(f, "{}", shown)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
