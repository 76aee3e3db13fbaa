//! # Guest Ledger
//!
//! One diner's sub-bill: line items, optional customer, discount, totals.
//!
//! ## Transition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Guest Ledger Transitions (pure)                        │
//! │                                                                         │
//! │  UI Action              Transition                Effect on items       │
//! │  ─────────              ──────────                ───────────────       │
//! │  Tap product ─────────► add_item() ─────────────► qty += 1 or push      │
//! │  +/- buttons ─────────► change_quantity() ──────► qty += delta          │
//! │                                                   qty ≤ 0 → removed     │
//! │  Trash icon ──────────► remove_item() ──────────► removed               │
//! │  Discount modal ──────► set_discount() ─────────► (none)                │
//! │  Customer picker ─────► assign_customer() ──────► (none)                │
//! │                                                                         │
//! │  Every transition ends with recalculate():                              │
//! │    line_total = quantity × unit_price      (each item)                  │
//! │    subtotal   = Σ line_total                                            │
//! │    discount   = compute(eligible subtotal, kind, value)                 │
//! │    final      = subtotal − discount.amount                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transitions take `&self` and return a new ledger; the caller decides
//! whether to keep it. A failed transition leaves the original untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::discount::{Discount, DiscountKind};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::exclusion::{ExclusionResolver, ExclusionSplit};
use crate::money::Money;
use crate::types::{Customer, ItemRef};
use crate::validation::validate_price;
use crate::{MAX_GUEST_ITEMS, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

// =============================================================================
// Line Item
// =============================================================================

/// One orderable unit within a guest's bill.
///
/// ## Price Freezing
/// `unit_price` is captured when the item is added. A later catalog price
/// change does not touch open orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Locally generated, stable for the session.
    pub id: String,
    pub item_ref: ItemRef,
    /// Always positive; an item reaching zero is removed instead.
    pub quantity: i64,
    pub unit_price: Money,
    /// `quantity × unit_price`.
    pub line_total: Money,
}

impl LineItem {
    /// Creates an item with a fresh id.
    pub fn new(item_ref: ItemRef, unit_price: Money, quantity: i64) -> Self {
        LineItem::restore(Uuid::new_v4().to_string(), item_ref, unit_price, quantity)
    }

    /// Rebuilds an item with a known id (remote order, snapshot).
    pub fn restore(id: impl Into<String>, item_ref: ItemRef, unit_price: Money, quantity: i64) -> Self {
        LineItem {
            id: id.into(),
            item_ref,
            quantity,
            unit_price,
            line_total: unit_price.multiply_quantity(quantity),
        }
    }

    fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.line_total = self.unit_price.multiply_quantity(quantity);
    }
}

/// Checks a quantity and unit price against the limits every transition
/// enforces. Data from outside (snapshots, remote orders) must pass this
/// before anything is multiplied.
pub(crate) fn check_line_bounds(quantity: i64, unit_price: Money) -> Result<(), String> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(format!("quantity {} outside 1..={}", quantity, MAX_ITEM_QUANTITY));
    }
    if unit_price.is_negative() {
        return Err(format!("negative unit price {}", unit_price.amount()));
    }
    if unit_price > Money::from_major(MAX_UNIT_PRICE) {
        return Err(format!("unit price {} above {}", unit_price.amount(), MAX_UNIT_PRICE));
    }
    Ok(())
}

// =============================================================================
// Guest Ledger
// =============================================================================

/// A guest's bill.
///
/// ## Invariants
/// - `subtotal == Σ item.line_total`
/// - `final_amount == subtotal − discount.amount`
/// - every item has `quantity > 0`
/// - `add_item` never creates a second line for a reference already present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GuestLedger {
    guest_number: u32,
    items: Vec<LineItem>,
    customer: Option<Customer>,
    discount: Discount,
    subtotal: Money,
    final_amount: Money,
}

impl GuestLedger {
    /// An empty guest with no discount.
    pub fn new(guest_number: u32) -> Self {
        GuestLedger {
            guest_number,
            items: Vec::new(),
            customer: None,
            discount: Discount::none(),
            subtotal: Money::zero(),
            final_amount: Money::zero(),
        }
    }

    /// Builds a guest from already-known items (remote order reconstruction).
    pub fn with_items(guest_number: u32, items: Vec<LineItem>, resolver: &ExclusionResolver) -> Self {
        GuestLedger {
            items,
            ..GuestLedger::new(guest_number)
        }
        .recalculate(resolver)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn guest_number(&self) -> u32 {
        self.guest_number
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn discount(&self) -> &Discount {
        &self.discount
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn final_amount(&self) -> Money {
        self.final_amount
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn find_item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Discount base for this guest.
    pub fn eligible_subtotal(&self, resolver: &ExclusionResolver) -> Money {
        resolver.eligible_amount(&self.items)
    }

    /// Items partitioned by eligibility.
    pub fn split<'a>(&'a self, resolver: &ExclusionResolver) -> ExclusionSplit<'a> {
        resolver.split_by_exclusion(&self.items)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// `addItem`: increments an existing line for the same reference, or
    /// appends a new line with quantity 1.
    pub fn add_item(
        &self,
        resolver: &ExclusionResolver,
        item_ref: ItemRef,
        unit_price: Money,
    ) -> CoreResult<Self> {
        self.add_units(resolver, item_ref, unit_price, 1)
    }

    /// Adds `quantity` units of a reference.
    ///
    /// When a line already exists, its frozen unit price wins.
    pub fn add_units(
        &self,
        resolver: &ExclusionResolver,
        item_ref: ItemRef,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<Self> {
        self.add_matching(resolver, item_ref, unit_price, quantity, false)
    }

    /// Like [`GuestLedger::add_units`], but only joins a line with the same
    /// unit price. Used when units move between guests so money is conserved.
    pub(crate) fn absorb_units(
        &self,
        resolver: &ExclusionResolver,
        item_ref: ItemRef,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<Self> {
        self.add_matching(resolver, item_ref, unit_price, quantity, true)
    }

    fn add_matching(
        &self,
        resolver: &ExclusionResolver,
        item_ref: ItemRef,
        unit_price: Money,
        quantity: i64,
        same_price_only: bool,
    ) -> CoreResult<Self> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        validate_price(unit_price)?;

        let mut next = self.clone();

        let existing = next
            .items
            .iter_mut()
            .find(|i| i.item_ref == item_ref && (!same_price_only || i.unit_price == unit_price));

        if let Some(item) = existing {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.set_quantity(new_qty);
        } else {
            if next.items.len() >= MAX_GUEST_ITEMS {
                return Err(CoreError::TooManyItems {
                    max: MAX_GUEST_ITEMS,
                });
            }
            if quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            next.items.push(LineItem::new(item_ref, unit_price, quantity));
        }

        Ok(next.recalculate(resolver))
    }

    /// `changeQuantity`: applies `delta`; a result of zero or less removes the
    /// line entirely.
    pub fn change_quantity(
        &self,
        resolver: &ExclusionResolver,
        item_id: &str,
        delta: i64,
    ) -> CoreResult<Self> {
        let mut next = self.clone();

        let position = next
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound {
                guest_number: self.guest_number,
                item_id: item_id.to_string(),
            })?;

        let new_qty = next.items[position].quantity.saturating_add(delta);
        if new_qty <= 0 {
            next.items.remove(position);
        } else if new_qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_qty,
                max: MAX_ITEM_QUANTITY,
            });
        } else {
            next.items[position].set_quantity(new_qty);
        }

        Ok(next.recalculate(resolver))
    }

    /// `removeItem`: `change_quantity` by minus the current quantity.
    pub fn remove_item(&self, resolver: &ExclusionResolver, item_id: &str) -> CoreResult<Self> {
        let current = self
            .find_item(item_id)
            .map(|i| i.quantity)
            .ok_or_else(|| CoreError::ItemNotFound {
                guest_number: self.guest_number,
                item_id: item_id.to_string(),
            })?;
        self.change_quantity(resolver, item_id, -current)
    }

    /// `setDiscount`: recomputes the amount against the current eligible
    /// subtotal. Kind `None` clears value and amount.
    ///
    /// `value` must already be validated (see
    /// [`crate::validation::parse_discount_input`]).
    pub fn set_discount(&self, resolver: &ExclusionResolver, kind: DiscountKind, value: Decimal) -> Self {
        let mut next = self.clone();
        next.discount = Discount::computed(kind, value, next.eligible_subtotal(resolver));
        next.refresh_final();
        next
    }

    /// Drops the discount.
    pub fn clear_discount(&self) -> Self {
        let mut next = self.clone();
        next.discount = Discount::none();
        next.refresh_final();
        next
    }

    /// `assignCustomer`: replaces the guest's customer.
    ///
    /// - customer with a group discount → percentage discount of the group
    /// - customer removed → discount reset to none
    /// - customer without a group discount → current discount kept
    ///
    /// Uniqueness across guests is enforced by the order, see
    /// [`crate::order::OrderAggregate::assign_customer`].
    pub fn assign_customer(&self, resolver: &ExclusionResolver, customer: Option<Customer>) -> Self {
        let group_discount = customer.as_ref().and_then(Customer::group_discount);
        let removed = customer.is_none();

        let mut next = self.clone();
        next.customer = customer;

        match group_discount {
            Some(pct) => next.set_discount(resolver, DiscountKind::Percentage, pct),
            None if removed => next.clear_discount(),
            None => next,
        }
    }

    /// Re-derives every total, e.g. after the exclusion rules changed.
    pub fn recompute(&self, resolver: &ExclusionResolver) -> Self {
        self.clone().recalculate(resolver)
    }

    // =========================================================================
    // Crate-internal helpers (order-level guest management)
    // =========================================================================

    pub(crate) fn renumbered(mut self, guest_number: u32) -> Self {
        self.guest_number = guest_number;
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<LineItem>, Option<Customer>) {
        (self.items, self.customer)
    }

    fn refresh_final(&mut self) {
        self.final_amount = self.subtotal - self.discount.amount;
    }

    fn recalculate(mut self, resolver: &ExclusionResolver) -> Self {
        for item in &mut self.items {
            item.line_total = item.unit_price.multiply_quantity(item.quantity);
        }
        self.subtotal = self.items.iter().map(|i| i.line_total).sum();
        self.discount = self.discount.recomputed(self.eligible_subtotal(resolver));
        self.refresh_final();
        self
    }

    /// Checks the arithmetic and structural invariants.
    ///
    /// Bounds are checked before any product or sum, so a hostile ledger is
    /// refused instead of overflowing.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let fail = |what: String| Err(format!("guest {} {}", self.guest_number, what));

        if self.items.len() > MAX_GUEST_ITEMS {
            return fail(format!("has {} items", self.items.len()));
        }
        for item in &self.items {
            if let Err(e) = check_line_bounds(item.quantity, item.unit_price) {
                return fail(format!("item {}: {}", item.id, e));
            }
            if item.line_total != item.unit_price.multiply_quantity(item.quantity) {
                return fail(format!("item {} line total mismatch", item.id));
            }
        }
        let subtotal: Money = self.items.iter().map(|i| i.line_total).sum();
        if subtotal != self.subtotal {
            return fail("subtotal mismatch".to_string());
        }

        let discount = &self.discount;
        let value_ok = match discount.kind {
            DiscountKind::None => true,
            DiscountKind::Percentage => {
                discount.value >= Decimal::ZERO && discount.value <= Decimal::ONE_HUNDRED
            }
            DiscountKind::Fixed => discount.value >= Decimal::ZERO,
        };
        if !value_ok {
            return fail(format!("discount value {} out of range", discount.value));
        }
        if discount.amount.is_negative() || discount.amount > self.subtotal {
            return fail(format!("discount amount {} out of range", discount.amount.amount()));
        }
        if self.final_amount != self.subtotal - discount.amount {
            return fail("final amount mismatch".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogItem, CustomerGroup, ItemKind};

    fn catalog(excluded: &[&str]) -> Vec<CatalogItem> {
        ["p100", "p200", "p50"]
            .iter()
            .map(|id| CatalogItem {
                id: id.to_string(),
                kind: ItemKind::Product,
                name: id.to_string(),
                price: Money::zero(),
                category_id: Some("food".to_string()),
                exclude_from_discounts: excluded.contains(id),
            })
            .collect()
    }

    fn customer(id: &str, pct: Option<i64>) -> Customer {
        Customer {
            id: id.to_string(),
            name: format!("Customer {}", id),
            phone: None,
            group: pct.map(|p| CustomerGroup {
                id: "g".to_string(),
                name: "Regulars".to_string(),
                discount_percentage: Decimal::from(p),
            }),
        }
    }

    /// 1 × 100 and 2 × 200.
    fn two_item_guest(resolver: &ExclusionResolver) -> GuestLedger {
        GuestLedger::new(1)
            .add_item(resolver, ItemRef::product("p100"), Money::from_major(100))
            .and_then(|g| g.add_item(resolver, ItemRef::product("p200"), Money::from_major(200)))
            .and_then(|g| g.add_item(resolver, ItemRef::product("p200"), Money::from_major(200)))
            .unwrap()
    }

    #[test]
    fn test_add_same_reference_increments_quantity() {
        let resolver = ExclusionResolver::new(&[], &catalog(&[]));
        let guest = two_item_guest(&resolver);

        assert_eq!(guest.item_count(), 2);
        assert_eq!(guest.total_quantity(), 3);
        assert_eq!(guest.items()[1].line_total, Money::from_major(400));
        assert_eq!(guest.subtotal(), Money::from_major(500));
    }

    #[test]
    fn test_product_and_tech_card_with_same_id_are_separate_lines() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("7"), Money::from_major(1))
            .and_then(|g| g.add_item(&resolver, ItemRef::tech_card("7"), Money::from_major(2)))
            .unwrap();
        assert_eq!(guest.item_count(), 2);
    }

    #[test]
    fn test_unit_price_frozen_on_existing_line() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(10))
            .and_then(|g| g.add_item(&resolver, ItemRef::product("p"), Money::from_major(12)))
            .unwrap();
        assert_eq!(guest.items()[0].unit_price, Money::from_major(10));
        assert_eq!(guest.subtotal(), Money::from_major(20));
    }

    #[test]
    fn test_ten_percent_discount_via_quantity_change() {
        let resolver = ExclusionResolver::new(&[], &catalog(&[]));
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p100"), Money::from_major(100))
            .and_then(|g| g.add_item(&resolver, ItemRef::product("p200"), Money::from_major(200)))
            .unwrap();
        let p200 = guest.items()[1].id.clone();
        let guest = guest.change_quantity(&resolver, &p200, 1).unwrap();
        assert_eq!(guest.items()[1].line_total, Money::from_major(400));
        assert_eq!(guest.subtotal(), Money::from_major(500));

        let guest = guest.set_discount(&resolver, DiscountKind::Percentage, Decimal::from(10));
        assert_eq!(guest.discount().amount, Money::from_major(50));
        assert_eq!(guest.final_amount(), Money::from_major(450));
    }

    #[test]
    fn test_subtotal_600_discount_scenarios() {
        // Lines: 100 × 1 = 100 and 250 × 2 = 500 → subtotal 600
        let plain = ExclusionResolver::new(&[], &catalog(&[]));
        let excluded = ExclusionResolver::new(&[], &catalog(&["p200"]));

        let build = |resolver: &ExclusionResolver| {
            GuestLedger::new(1)
                .add_item(resolver, ItemRef::product("p100"), Money::from_major(100))
                .and_then(|g| g.add_item(resolver, ItemRef::product("p200"), Money::from_major(250)))
                .and_then(|g| g.add_item(resolver, ItemRef::product("p200"), Money::from_major(250)))
                .map(|g| g.set_discount(resolver, DiscountKind::Percentage, Decimal::from(10)))
                .unwrap()
        };

        let guest = build(&plain);
        assert_eq!(guest.subtotal(), Money::from_major(600));
        assert_eq!(guest.discount().amount, Money::from_major(60));
        assert_eq!(guest.final_amount(), Money::from_major(540));

        let guest = build(&excluded);
        assert_eq!(guest.eligible_subtotal(&excluded), Money::from_major(100));
        assert_eq!(guest.discount().amount, Money::from_major(10));
        assert_eq!(guest.final_amount(), Money::from_major(590));
    }

    #[test]
    fn test_discount_follows_item_changes() {
        let resolver = ExclusionResolver::new(&[], &catalog(&[]));
        let guest = GuestLedger::new(1)
            .set_discount(&resolver, DiscountKind::Percentage, Decimal::from(10))
            .add_item(&resolver, ItemRef::product("p100"), Money::from_major(100))
            .unwrap();
        assert_eq!(guest.discount().amount, Money::from_major(10));
        assert_eq!(guest.final_amount(), Money::from_major(90));
    }

    #[test]
    fn test_quantity_reaching_zero_removes_item() {
        let resolver = ExclusionResolver::new(&[], &catalog(&[]));
        let guest = two_item_guest(&resolver);
        let id = guest.items()[1].id.clone();

        let guest = guest.change_quantity(&resolver, &id, -2).unwrap();
        assert!(guest.find_item(&id).is_none());
        assert_eq!(guest.subtotal(), Money::from_major(100));
    }

    #[test]
    fn test_overshooting_delta_removes_instead_of_flooring() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(3))
            .unwrap();
        let id = guest.items()[0].id.clone();

        let guest = guest.change_quantity(&resolver, &id, -5).unwrap();
        assert!(!guest.has_items());
        assert!(guest.subtotal().is_zero());
    }

    #[test]
    fn test_remove_item_and_unknown_item() {
        let resolver = ExclusionResolver::default();
        let guest = two_item_guest(&resolver);
        let id = guest.items()[0].id.clone();

        let guest = guest.remove_item(&resolver, &id).unwrap();
        assert_eq!(guest.item_count(), 1);

        let err = guest.remove_item(&resolver, "missing").unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound { guest_number: 1, .. }));
    }

    #[test]
    fn test_quantity_limit() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(1))
            .unwrap();
        let id = guest.items()[0].id.clone();

        let err = guest.change_quantity(&resolver, &id, MAX_ITEM_QUANTITY).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        // Original untouched
        assert_eq!(guest.items()[0].quantity, 1);
    }

    #[test]
    fn test_fixed_discount_never_makes_final_negative() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(30))
            .unwrap()
            .set_discount(&resolver, DiscountKind::Fixed, Decimal::from(50));
        assert_eq!(guest.discount().amount, Money::from_major(30));
        assert!(guest.final_amount().is_zero());

        // Removing the item drops the amount to zero but keeps the setting
        let id = guest.items()[0].id.clone();
        let guest = guest.remove_item(&resolver, &id).unwrap();
        assert_eq!(guest.discount().kind, DiscountKind::Fixed);
        assert!(guest.discount().amount.is_zero());
    }

    #[test]
    fn test_set_discount_none_clears_value() {
        let resolver = ExclusionResolver::default();
        let guest = two_item_guest(&resolver)
            .set_discount(&resolver, DiscountKind::Fixed, Decimal::from(20))
            .set_discount(&resolver, DiscountKind::None, Decimal::from(20));
        assert_eq!(*guest.discount(), Discount::none());
        assert_eq!(guest.final_amount(), guest.subtotal());
    }

    #[test]
    fn test_assign_customer_with_group_discount() {
        let resolver = ExclusionResolver::default();
        let guest = two_item_guest(&resolver).assign_customer(&resolver, Some(customer("c1", Some(20))));

        assert_eq!(guest.customer().map(|c| c.id.as_str()), Some("c1"));
        assert_eq!(guest.discount().kind, DiscountKind::Percentage);
        assert_eq!(guest.discount().amount, Money::from_major(100));

        let guest = guest.assign_customer(&resolver, None);
        assert!(guest.customer().is_none());
        assert!(guest.discount().is_none());
        assert_eq!(guest.final_amount(), Money::from_major(500));
    }

    #[test]
    fn test_assign_customer_without_group_keeps_manual_discount() {
        let resolver = ExclusionResolver::default();
        let guest = two_item_guest(&resolver)
            .set_discount(&resolver, DiscountKind::Fixed, Decimal::from(5))
            .assign_customer(&resolver, Some(customer("c2", None)));
        assert_eq!(guest.discount().kind, DiscountKind::Fixed);
        assert_eq!(guest.discount().amount, Money::from_major(5));
    }

    #[test]
    fn test_negative_price_is_refused() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(10))
            .unwrap();

        let err = guest
            .add_item(&resolver, ItemRef::product("q"), Money::from_cents(-300))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Negative { .. })
        ));

        // Same guard when joining an existing line
        let err = guest
            .add_units(&resolver, ItemRef::product("p"), Money::from_major(-1), 2)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(guest.subtotal(), Money::from_major(10));
    }

    #[test]
    fn test_price_above_ceiling_is_refused() {
        let resolver = ExclusionResolver::default();
        let err = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(MAX_UNIT_PRICE + 1))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_invariant_check_refuses_out_of_bounds_lines() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(2)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(4))
            .unwrap();
        assert!(guest.check_invariants().is_ok());

        let mut negative = guest.clone();
        negative.items[0] = LineItem::restore("x", ItemRef::product("p"), Money::from_major(-4), 1);
        negative.subtotal = Money::from_major(-4);
        negative.final_amount = Money::from_major(-4);
        let err = negative.check_invariants().unwrap_err();
        assert!(err.contains("negative unit price"));

        // Huge values are caught before the line total is multiplied out
        let mut huge = guest.clone();
        huge.items[0].quantity = 9_000_000_000_000_000_000;
        huge.items[0].unit_price = Money::from_major(100_000_000_000);
        let err = huge.check_invariants().unwrap_err();
        assert!(err.contains("quantity"));

        let mut huge_price = guest.clone();
        huge_price.items[0].unit_price = Money::from_decimal(Decimal::MAX);
        assert!(huge_price.check_invariants().is_err());
    }

    #[test]
    fn test_invariant_check_refuses_bad_discount() {
        let resolver = ExclusionResolver::default();
        let guest = GuestLedger::new(1)
            .add_item(&resolver, ItemRef::product("p"), Money::from_major(10))
            .unwrap();

        let mut over = guest.clone();
        over.discount = Discount {
            kind: DiscountKind::Percentage,
            value: Decimal::from(1_000_000),
            amount: Money::zero(),
        };
        assert!(over.check_invariants().is_err());

        let mut negative = guest.clone();
        negative.discount = Discount {
            kind: DiscountKind::Fixed,
            value: Decimal::from(-5),
            amount: Money::from_major(-5),
        };
        negative.final_amount = Money::from_major(15);
        assert!(negative.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_hold_after_mixed_operations() {
        let resolver = ExclusionResolver::new(&[], &catalog(&["p50"]));
        let mut guest = GuestLedger::new(3)
            .set_discount(&resolver, DiscountKind::Percentage, Decimal::from(15));
        for (id, price) in [("p100", 100), ("p50", 50), ("p100", 100), ("p200", 200)] {
            guest = guest
                .add_item(&resolver, ItemRef::product(id), Money::from_major(price))
                .unwrap();
            assert!(guest.check_invariants().is_ok());
        }
        let first = guest.items()[0].id.clone();
        guest = guest.change_quantity(&resolver, &first, -1).unwrap();
        assert!(guest.check_invariants().is_ok());

        let line_sum: Money = guest.items().iter().map(|i| i.line_total).sum();
        assert_eq!(guest.subtotal(), line_sum);
    }
}
