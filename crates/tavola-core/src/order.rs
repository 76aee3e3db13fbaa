//! # Order Aggregate
//!
//! The open order behind the checkout screen: guests, selection, table and
//! order-level totals.
//!
//! ## Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         OrderAggregate                                  │
//! │                                                                         │
//! │  order_id: local-<uuid> | durable id        table_number: Option<u32>   │
//! │                                                                         │
//! │  guests ─┬─ GuestLedger #1 ◄── selected_guest_number                   │
//! │          ├─ GuestLedger #2                                              │
//! │          └─ GuestLedger #n      (numbers contiguous from 1, n ≥ 1)      │
//! │                                                                         │
//! │  subtotal       = Σ guest.subtotal                                      │
//! │  total_discount = Σ guest.discount.amount                               │
//! │  total_amount   = Σ guest.final_amount        (the payable amount)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are never set directly. Every transition rebuilds the affected
//! guest and then re-sums the order in `refresh_totals`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::DiscountKind;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::exclusion::ExclusionResolver;
use crate::guest::GuestLedger;
use crate::money::Money;
use crate::remote::{CreateDraftRequest, DraftItemPayload};
use crate::types::{Customer, ItemRef, OrderId};
use crate::MAX_GUESTS;

// =============================================================================
// Identity
// =============================================================================

/// Where the order stands in its persistence lifecycle, judged from the
/// aggregate alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderIdentity {
    /// Local id, nothing ordered yet.
    Empty,
    /// Local id with items, never sent to the remote service.
    LocalDraft,
    /// Durable id issued by the remote service.
    RemotePersisted,
}

// =============================================================================
// Payment Handoff
// =============================================================================

/// Per-guest line of a payment handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GuestPayment {
    pub guest_number: u32,
    pub customer_id: Option<String>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
}

/// What the payment screen receives once the operator confirms payment.
///
/// Amounts are rounded to display precision here; this is the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHandoff {
    pub order_id: OrderId,
    pub table_number: Option<u32>,
    pub guests: Vec<GuestPayment>,
    pub subtotal: Money,
    pub total_discount: Money,
    pub total_amount: Money,
}

// =============================================================================
// Order Aggregate
// =============================================================================

/// An open restaurant order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderAggregate {
    order_id: OrderId,
    table_number: Option<u32>,
    guests: Vec<GuestLedger>,
    selected_guest_number: u32,
    subtotal: Money,
    total_discount: Money,
    total_amount: Money,
}

impl OrderAggregate {
    /// A fresh order with `guest_count` empty guests, guest 1 selected.
    pub fn empty(order_id: OrderId, guest_count: u32, table_number: Option<u32>) -> CoreResult<Self> {
        if guest_count == 0 || guest_count > MAX_GUESTS {
            return Err(ValidationError::OutOfRange {
                field: "guest count".to_string(),
                min: 1,
                max: i64::from(MAX_GUESTS),
            }
            .into());
        }

        Ok(OrderAggregate {
            order_id,
            table_number,
            guests: (1..=guest_count).map(GuestLedger::new).collect(),
            selected_guest_number: 1,
            subtotal: Money::zero(),
            total_discount: Money::zero(),
            total_amount: Money::zero(),
        })
    }

    /// Builds an order from already-numbered guests (remote reconstruction).
    ///
    /// Guests must be numbered `1..=n` in order.
    pub(crate) fn from_guests(
        order_id: OrderId,
        table_number: Option<u32>,
        guests: Vec<GuestLedger>,
    ) -> CoreResult<Self> {
        let order = OrderAggregate {
            order_id,
            table_number,
            guests,
            selected_guest_number: 1,
            subtotal: Money::zero(),
            total_discount: Money::zero(),
            total_amount: Money::zero(),
        }
        .refresh_totals();
        order.check_invariants()?;
        Ok(order)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn table_number(&self) -> Option<u32> {
        self.table_number
    }

    pub fn guests(&self) -> &[GuestLedger] {
        &self.guests
    }

    pub fn guest_count(&self) -> u32 {
        self.guests.len() as u32
    }

    pub fn guest(&self, guest_number: u32) -> Option<&GuestLedger> {
        self.guests.iter().find(|g| g.guest_number() == guest_number)
    }

    pub fn selected_guest_number(&self) -> u32 {
        self.selected_guest_number
    }

    pub fn selected_guest(&self) -> Option<&GuestLedger> {
        self.guest(self.selected_guest_number)
    }

    /// True when any guest has at least one item.
    pub fn has_items(&self) -> bool {
        self.guests.iter().any(GuestLedger::has_items)
    }

    /// Number of lines across all guests.
    pub fn item_count(&self) -> usize {
        self.guests.iter().map(GuestLedger::item_count).sum()
    }

    /// Σ guest subtotals, before discounts.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Σ guest discount amounts.
    pub fn total_discount(&self) -> Money {
        self.total_discount
    }

    /// Σ guest final amounts.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// The payable amount; same value as [`OrderAggregate::total_amount`].
    pub fn final_amount(&self) -> Money {
        self.total_amount
    }

    pub fn identity(&self) -> OrderIdentity {
        if self.order_id.is_durable() {
            OrderIdentity::RemotePersisted
        } else if self.has_items() {
            OrderIdentity::LocalDraft
        } else {
            OrderIdentity::Empty
        }
    }

    // =========================================================================
    // Order-level Transitions
    // =========================================================================

    /// `addGuest`: appends guest `n + 1` and selects it.
    pub fn add_guest(&self) -> CoreResult<Self> {
        if self.guest_count() >= MAX_GUESTS {
            return Err(CoreError::TooManyGuests { max: MAX_GUESTS });
        }

        let mut next = self.clone();
        let number = next.guest_count() + 1;
        next.guests.push(GuestLedger::new(number));
        next.selected_guest_number = number;
        Ok(next.refresh_totals())
    }

    /// `selectGuest`.
    pub fn select_guest(&self, guest_number: u32) -> CoreResult<Self> {
        self.require_guest(guest_number)?;
        let mut next = self.clone();
        next.selected_guest_number = guest_number;
        Ok(next)
    }

    /// Removes an empty guest and renumbers the rest.
    ///
    /// A guest with items has to be merged into another guest first, so no
    /// money disappears with it.
    pub fn remove_guest(&self, guest_number: u32) -> CoreResult<Self> {
        let index = self.guest_index(guest_number)?;
        if self.guests.len() == 1 {
            return Err(CoreError::LastGuest);
        }
        if self.guests[index].has_items() {
            return Err(CoreError::GuestNotEmpty(guest_number));
        }

        let mut next = self.clone();
        next.guests.remove(index);
        next.selected_guest_number = shifted_selection(self.selected_guest_number, guest_number);
        Ok(next.renumber().refresh_totals())
    }

    /// Moves every item of `source` onto `target` and drops `source`.
    ///
    /// `target` keeps its own customer; the customer of `source` is released.
    /// The merged guest ends up selected.
    pub fn merge_guests(
        &self,
        resolver: &ExclusionResolver,
        source: u32,
        target: u32,
    ) -> CoreResult<Self> {
        if source == target {
            return Err(CoreError::SameGuest(source));
        }
        let source_index = self.guest_index(source)?;
        let target_index = self.guest_index(target)?;

        let (items, _released_customer) = self.guests[source_index].clone().into_parts();
        let mut merged = self.guests[target_index].clone();
        for item in items {
            merged = merged.absorb_units(resolver, item.item_ref, item.unit_price, item.quantity)?;
        }

        let mut next = self.clone();
        next.guests[target_index] = merged;
        next.guests.remove(source_index);
        next.selected_guest_number = shifted_selection(target, source);
        Ok(next.renumber().refresh_totals())
    }

    /// Moves `quantity` units of one line from guest `from` to guest `to`.
    ///
    /// Moving the whole quantity removes the line from `from`.
    pub fn move_item(
        &self,
        resolver: &ExclusionResolver,
        from: u32,
        item_id: &str,
        to: u32,
        quantity: i64,
    ) -> CoreResult<Self> {
        if from == to {
            return Err(CoreError::SameGuest(from));
        }
        let from_index = self.guest_index(from)?;
        let to_index = self.guest_index(to)?;

        let item = self.guests[from_index]
            .find_item(item_id)
            .ok_or_else(|| CoreError::ItemNotFound {
                guest_number: from,
                item_id: item_id.to_string(),
            })?;
        if quantity <= 0 || quantity > item.quantity {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: item.quantity,
            }
            .into());
        }

        let receiving = self.guests[to_index].absorb_units(
            resolver,
            item.item_ref.clone(),
            item.unit_price,
            quantity,
        )?;
        let giving = self.guests[from_index].change_quantity(resolver, item_id, -quantity)?;

        let mut next = self.clone();
        next.guests[from_index] = giving;
        next.guests[to_index] = receiving;
        Ok(next.refresh_totals())
    }

    pub fn set_table_number(&self, table_number: Option<u32>) -> Self {
        let mut next = self.clone();
        next.table_number = table_number;
        next
    }

    /// Same order under the id issued by the remote service.
    pub fn with_durable_id(&self, order_id: OrderId) -> Self {
        let mut next = self.clone();
        next.order_id = order_id;
        next
    }

    /// Re-derives every guest, e.g. after the exclusion rules changed.
    pub fn recompute(&self, resolver: &ExclusionResolver) -> Self {
        let mut next = self.clone();
        next.guests = next.guests.iter().map(|g| g.recompute(resolver)).collect();
        next.refresh_totals()
    }

    // =========================================================================
    // Guest-level Transitions
    // =========================================================================

    pub fn add_item(
        &self,
        resolver: &ExclusionResolver,
        guest_number: u32,
        item_ref: ItemRef,
        unit_price: Money,
    ) -> CoreResult<Self> {
        self.update_guest(guest_number, |g| g.add_item(resolver, item_ref, unit_price))
    }

    pub fn change_quantity(
        &self,
        resolver: &ExclusionResolver,
        guest_number: u32,
        item_id: &str,
        delta: i64,
    ) -> CoreResult<Self> {
        self.update_guest(guest_number, |g| g.change_quantity(resolver, item_id, delta))
    }

    pub fn remove_item(
        &self,
        resolver: &ExclusionResolver,
        guest_number: u32,
        item_id: &str,
    ) -> CoreResult<Self> {
        self.update_guest(guest_number, |g| g.remove_item(resolver, item_id))
    }

    pub fn set_discount(
        &self,
        resolver: &ExclusionResolver,
        guest_number: u32,
        kind: DiscountKind,
        value: Decimal,
    ) -> CoreResult<Self> {
        self.update_guest(guest_number, |g| Ok(g.set_discount(resolver, kind, value)))
    }

    pub fn clear_discount(&self, guest_number: u32) -> CoreResult<Self> {
        self.update_guest(guest_number, |g| Ok(g.clear_discount()))
    }

    /// `assignCustomer` with order-wide uniqueness: a customer already sitting
    /// on another guest is taken off that guest, whose discount resets.
    pub fn assign_customer(
        &self,
        resolver: &ExclusionResolver,
        guest_number: u32,
        customer: Option<Customer>,
    ) -> CoreResult<Self> {
        let index = self.guest_index(guest_number)?;
        let mut next = self.clone();

        if let Some(incoming) = &customer {
            for (i, guest) in next.guests.iter_mut().enumerate() {
                let holds_customer = guest.customer().is_some_and(|c| c.id == incoming.id);
                if i != index && holds_customer {
                    *guest = guest.assign_customer(resolver, None);
                }
            }
        }

        next.guests[index] = next.guests[index].assign_customer(resolver, customer);
        Ok(next.refresh_totals())
    }

    // Selected-guest shortcuts used by the product grid and the totals panel

    pub fn add_item_to_selected(
        &self,
        resolver: &ExclusionResolver,
        item_ref: ItemRef,
        unit_price: Money,
    ) -> CoreResult<Self> {
        self.add_item(resolver, self.selected_guest_number, item_ref, unit_price)
    }

    pub fn change_selected_quantity(
        &self,
        resolver: &ExclusionResolver,
        item_id: &str,
        delta: i64,
    ) -> CoreResult<Self> {
        self.change_quantity(resolver, self.selected_guest_number, item_id, delta)
    }

    pub fn set_selected_discount(
        &self,
        resolver: &ExclusionResolver,
        kind: DiscountKind,
        value: Decimal,
    ) -> CoreResult<Self> {
        self.set_discount(resolver, self.selected_guest_number, kind, value)
    }

    pub fn assign_customer_to_selected(
        &self,
        resolver: &ExclusionResolver,
        customer: Option<Customer>,
    ) -> CoreResult<Self> {
        self.assign_customer(resolver, self.selected_guest_number, customer)
    }

    // =========================================================================
    // Outbound Shapes
    // =========================================================================

    /// Every guest's items flattened, tagged with the guest number.
    pub fn items_payload(&self) -> Vec<DraftItemPayload> {
        self.guests
            .iter()
            .flat_map(|guest| {
                guest
                    .items()
                    .iter()
                    .map(move |item| DraftItemPayload::from_line(item, guest.guest_number()))
            })
            .collect()
    }

    /// The body of a remote draft-create call.
    pub fn create_draft_request(&self) -> CreateDraftRequest {
        CreateDraftRequest {
            items: self.items_payload(),
            total_amount: self.total_amount.rounded(),
            table_number: self.table_number,
            guest_count: Some(self.guest_count()),
        }
    }

    /// Summary for the payment screen; fails when nothing is payable.
    pub fn payment_handoff(&self) -> CoreResult<PaymentHandoff> {
        if !self.total_amount.is_positive() {
            return Err(CoreError::NothingToPay {
                order_id: self.order_id.to_string(),
            });
        }

        Ok(PaymentHandoff {
            order_id: self.order_id.clone(),
            table_number: self.table_number,
            guests: self
                .guests
                .iter()
                .map(|g| GuestPayment {
                    guest_number: g.guest_number(),
                    customer_id: g.customer().map(|c| c.id.clone()),
                    subtotal: g.subtotal().rounded(),
                    discount_amount: g.discount().amount.rounded(),
                    final_amount: g.final_amount().rounded(),
                })
                .collect(),
            subtotal: self.subtotal.rounded(),
            total_discount: self.total_discount.rounded(),
            total_amount: self.total_amount.rounded(),
        })
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Verifies every structural and arithmetic invariant of the order.
    pub fn check_invariants(&self) -> CoreResult<()> {
        let violation = |msg: String| Err(CoreError::InvariantViolation(msg));

        if self.guests.is_empty() {
            return violation("order has no guests".to_string());
        }
        if self.guest_count() > MAX_GUESTS {
            return violation(format!("order has {} guests", self.guests.len()));
        }
        for (index, guest) in self.guests.iter().enumerate() {
            let expected = index as u32 + 1;
            if guest.guest_number() != expected {
                return violation(format!(
                    "guest at position {} is numbered {}",
                    expected,
                    guest.guest_number()
                ));
            }
            guest.check_invariants().map_err(CoreError::InvariantViolation)?;
        }
        if self.guest(self.selected_guest_number).is_none() {
            return violation(format!(
                "selected guest {} does not exist",
                self.selected_guest_number
            ));
        }

        let mut customers: Vec<&str> = self
            .guests
            .iter()
            .filter_map(|g| g.customer().map(|c| c.id.as_str()))
            .collect();
        let assigned = customers.len();
        customers.sort_unstable();
        customers.dedup();
        if customers.len() != assigned {
            return violation("a customer is assigned to more than one guest".to_string());
        }

        let totals = self.clone().refresh_totals();
        if totals.subtotal != self.subtotal
            || totals.total_discount != self.total_discount
            || totals.total_amount != self.total_amount
        {
            return violation("order totals do not match guest sums".to_string());
        }

        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn guest_index(&self, guest_number: u32) -> CoreResult<usize> {
        self.guests
            .iter()
            .position(|g| g.guest_number() == guest_number)
            .ok_or(CoreError::GuestNotFound(guest_number))
    }

    fn require_guest(&self, guest_number: u32) -> CoreResult<()> {
        self.guest_index(guest_number).map(|_| ())
    }

    fn update_guest<F>(&self, guest_number: u32, transition: F) -> CoreResult<Self>
    where
        F: FnOnce(&GuestLedger) -> CoreResult<GuestLedger>,
    {
        let index = self.guest_index(guest_number)?;
        let updated = transition(&self.guests[index])?;

        let mut next = self.clone();
        next.guests[index] = updated;
        Ok(next.refresh_totals())
    }

    fn renumber(mut self) -> Self {
        self.guests = self
            .guests
            .into_iter()
            .enumerate()
            .map(|(index, guest)| guest.renumbered(index as u32 + 1))
            .collect();
        self
    }

    fn refresh_totals(mut self) -> Self {
        self.subtotal = self.guests.iter().map(GuestLedger::subtotal).sum();
        self.total_discount = self.guests.iter().map(|g| g.discount().amount).sum();
        self.total_amount = self.guests.iter().map(GuestLedger::final_amount).sum();
        self
    }
}

/// Where the selection lands after guest `removed` leaves and the remaining
/// guests shift down.
fn shifted_selection(selected: u32, removed: u32) -> u32 {
    if selected > removed {
        selected - 1
    } else if selected == removed {
        removed.saturating_sub(1).max(1)
    } else {
        selected
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
