//! # Remote Order Shapes
//!
//! Wire shapes exchanged with the remote order service, and the mapping from
//! a remote order back into an [`OrderAggregate`].
//!
//! ## Reconstruction
//! ```text
//! RemoteOrder.items (flat, tagged with guestNumber)
//!        │
//!        ├── quantity ≤ 0            → dropped
//!        ├── no / both references    → InvalidRemoteItem
//!        ├── quantity / price limits → InvalidRemoteItem
//!        ▼
//! grouped by guestNumber ──► GuestLedger #1..#n   (gaps become empty guests)
//!        │
//!        ▼
//! OrderAggregate { id: durable, discounts: none }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::exclusion::ExclusionResolver;
use crate::guest::{check_line_bounds, GuestLedger, LineItem};
use crate::money::Money;
use crate::order::OrderAggregate;
use crate::types::{ItemRef, OrderId};
use crate::MAX_GUESTS;

fn default_guest_number() -> u32 {
    1
}

// =============================================================================
// Read Side
// =============================================================================

/// An order as returned by `GET /orders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    pub id: String,
    #[serde(default)]
    pub table_number: Option<u32>,
    /// Explicit guest count; inferred from the items when absent.
    #[serde(default)]
    pub guest_count: Option<u32>,
    #[serde(default)]
    pub items: Vec<RemoteOrderItem>,
}

/// One flat order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrderItem {
    pub id: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub tech_card_id: Option<String>,
    #[serde(default = "default_guest_number")]
    pub guest_number: u32,
    pub quantity: i64,
    pub price: Money,
}

impl RemoteOrderItem {
    /// The tagged reference; exactly one id must be present.
    pub fn item_ref(&self) -> CoreResult<ItemRef> {
        match (&self.product_id, &self.tech_card_id) {
            (Some(product), None) => Ok(ItemRef::product(product.clone())),
            (None, Some(card)) => Ok(ItemRef::tech_card(card.clone())),
            (None, None) => Err(self.invalid("no product or tech card reference")),
            (Some(_), Some(_)) => Err(self.invalid("both product and tech card references")),
        }
    }

    /// Quantity and price must fit the limits of a local line before the
    /// line total is computed.
    fn check_bounds(&self) -> CoreResult<()> {
        check_line_bounds(self.quantity, self.price).map_err(|reason| self.invalid(&reason))
    }

    /// Guest number 0 is how older orders mark "no guest"; it lands on guest 1.
    fn effective_guest_number(&self) -> u32 {
        self.guest_number.max(1)
    }

    fn invalid(&self, reason: &str) -> CoreError {
        CoreError::InvalidRemoteItem {
            item_id: self.id.clone(),
            reason: reason.to_string(),
        }
    }
}

impl RemoteOrder {
    /// Guest count: explicit when given, never fewer than the highest guest
    /// number on an item, at least 1.
    pub fn inferred_guest_count(&self) -> u32 {
        let highest = self
            .items
            .iter()
            .map(RemoteOrderItem::effective_guest_number)
            .max()
            .unwrap_or(1);
        self.guest_count.unwrap_or(highest).max(highest).max(1)
    }

    /// Rebuilds the aggregate under the remote (durable) id.
    ///
    /// Remote discounts are not part of the read shape, so every guest starts
    /// with none.
    pub fn into_aggregate(self, resolver: &ExclusionResolver) -> CoreResult<OrderAggregate> {
        let guest_count = self.inferred_guest_count();
        if guest_count > MAX_GUESTS {
            return Err(CoreError::TooManyGuests { max: MAX_GUESTS });
        }

        let mut groups: Vec<Vec<LineItem>> = vec![Vec::new(); guest_count as usize];
        for item in &self.items {
            if item.quantity <= 0 {
                continue;
            }
            let item_ref = item.item_ref()?;
            item.check_bounds()?;
            let slot = (item.effective_guest_number() - 1) as usize;
            groups[slot].push(LineItem::restore(item.id.clone(), item_ref, item.price, item.quantity));
        }

        let guests = groups
            .into_iter()
            .enumerate()
            .map(|(index, items)| GuestLedger::with_items(index as u32 + 1, items, resolver))
            .collect();

        OrderAggregate::from_guests(OrderId::durable(self.id), self.table_number, guests)
    }
}

// =============================================================================
// Write Side
// =============================================================================

/// One line of a draft-create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftItemPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_card_id: Option<String>,
    pub quantity: i64,
    pub guest_number: u32,
}

impl DraftItemPayload {
    pub fn from_line(item: &LineItem, guest_number: u32) -> Self {
        DraftItemPayload {
            product_id: item.item_ref.product_id().map(str::to_string),
            tech_card_id: item.item_ref.tech_card_id().map(str::to_string),
            quantity: item.quantity,
            guest_number,
        }
    }
}

/// Body of `POST /orders/draft`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftRequest {
    pub items: Vec<DraftItemPayload>,
    pub total_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<u32>,
}

/// Response of `POST /orders/draft`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateDraftResponse {
    pub id: String,
}

impl CreateDraftResponse {
    pub fn order_id(&self) -> OrderId {
        OrderId::durable(self.id.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_json() -> &'static str {
        r#"{
            "id": "1842",
            "tableNumber": 4,
            "items": [
                {"id": "a", "productId": "soup", "guestNumber": 1, "quantity": 2, "price": "100"},
                {"id": "b", "techCardId": "tc9", "guestNumber": 3, "quantity": 1, "price": 45.5},
                {"id": "c", "productId": "bread", "guestNumber": 3, "quantity": 0, "price": "5"}
            ]
        }"#
    }

    #[test]
    fn test_into_aggregate_groups_by_guest() {
        let remote: RemoteOrder = serde_json::from_str(remote_json()).unwrap();
        assert_eq!(remote.inferred_guest_count(), 3);

        let order = remote.into_aggregate(&ExclusionResolver::default()).unwrap();
        assert_eq!(order.order_id().as_str(), "1842");
        assert!(order.order_id().is_durable());
        assert_eq!(order.table_number(), Some(4));
        assert_eq!(order.guest_count(), 3);

        // Guest 2 is a gap, the zero-quantity bread is dropped
        assert!(!order.guest(2).unwrap().has_items());
        assert_eq!(order.guest(3).unwrap().item_count(), 1);
        assert_eq!(order.guest(1).unwrap().items()[0].id, "a");
        assert_eq!(order.total_amount(), Money::from_cents(24550));
        assert!(order.check_invariants().is_ok());
    }

    #[test]
    fn test_explicit_guest_count_wins_when_larger() {
        let remote = RemoteOrder {
            id: "9".to_string(),
            table_number: None,
            guest_count: Some(4),
            items: vec![],
        };
        assert_eq!(remote.inferred_guest_count(), 4);

        let order = remote.into_aggregate(&ExclusionResolver::default()).unwrap();
        assert_eq!(order.guest_count(), 4);
        assert!(!order.has_items());
    }

    #[test]
    fn test_item_with_both_references_is_rejected() {
        let remote = RemoteOrder {
            id: "9".to_string(),
            table_number: None,
            guest_count: None,
            items: vec![RemoteOrderItem {
                id: "x".to_string(),
                product_id: Some("p".to_string()),
                tech_card_id: Some("t".to_string()),
                guest_number: 1,
                quantity: 1,
                price: Money::from_major(1),
            }],
        };
        let err = remote.into_aggregate(&ExclusionResolver::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRemoteItem { .. }));
    }

    fn single_item_order(quantity: i64, price: &str) -> RemoteOrder {
        let raw = format!(
            r#"{{"id":"5","items":[{{"id":"x","productId":"p","quantity":{},"price":"{}"}}]}}"#,
            quantity, price
        );
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_oversized_item_is_rejected_without_overflow() {
        let remote = single_item_order(9_000_000_000_000_000_000, "100000000000");
        let err = remote.into_aggregate(&ExclusionResolver::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRemoteItem { ref item_id, .. } if item_id == "x"));

        let remote = single_item_order(crate::MAX_ITEM_QUANTITY + 1, "1");
        assert!(remote.into_aggregate(&ExclusionResolver::default()).is_err());

        let remote = single_item_order(1, "79228162514264337593543950335");
        assert!(remote.into_aggregate(&ExclusionResolver::default()).is_err());
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let remote = single_item_order(5000, "-3");
        assert!(remote.into_aggregate(&ExclusionResolver::default()).is_err());

        let remote = single_item_order(5, "-3");
        let err = remote.into_aggregate(&ExclusionResolver::default()).unwrap_err();
        assert!(err.to_string().contains("negative unit price"));
    }

    #[test]
    fn test_draft_payload_wire_shape() {
        let item = LineItem::new(ItemRef::tech_card("tc1"), Money::from_major(3), 2);
        let payload = DraftItemPayload::from_line(&item, 2);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["techCardId"], "tc1");
        assert_eq!(json["guestNumber"], 2);
        assert!(json.get("productId").is_none());

        let response: CreateDraftResponse = serde_json::from_str(r#"{"id":"77"}"#).unwrap();
        assert!(response.order_id().is_durable());
    }
}
