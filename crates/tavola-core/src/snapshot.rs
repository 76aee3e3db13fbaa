//! # Order Snapshot
//!
//! The full serialized order kept in the local snapshot store so an abrupt
//! shutdown never loses the open order.
//!
//! ## Format
//! ```text
//! key:   key prefix ("order_data_" by default) + order_id
//! value: {"version":1,"savedAt":"2026-…Z","order":{…OrderAggregate…}}
//! ```
//!
//! The whole snapshot is written on every change; there are no partial
//! updates. Decoding re-checks every invariant of the order, so a snapshot
//! edited by hand or written by a buggy build is refused as a whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::order::OrderAggregate;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Versioned envelope around an [`OrderAggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub version: u32,
    #[ts(as = "String")]
    pub saved_at: DateTime<Utc>,
    pub order: OrderAggregate,
}

impl OrderSnapshot {
    /// Wraps the order, stamped now.
    pub fn capture(order: &OrderAggregate) -> Self {
        OrderSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            order: order.clone(),
        }
    }

    /// Serializes to the stored JSON text.
    pub fn encode(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|e| CoreError::CorruptSnapshot(e.to_string()))
    }

    /// Parses stored JSON text and verifies it.
    pub fn decode(raw: &str) -> CoreResult<Self> {
        let snapshot: OrderSnapshot =
            serde_json::from_str(raw).map_err(|e| CoreError::CorruptSnapshot(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CoreError::CorruptSnapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }

        snapshot
            .order
            .check_invariants()
            .map_err(|e| CoreError::CorruptSnapshot(e.to_string()))?;

        Ok(snapshot)
    }

    pub fn into_order(self) -> OrderAggregate {
        self.order
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::DiscountKind;
    use crate::exclusion::ExclusionResolver;
    use crate::money::Money;
    use crate::types::{CatalogItem, ItemKind, ItemRef, OrderId};
    use rust_decimal::Decimal;

    fn sample_order() -> (OrderAggregate, ExclusionResolver) {
        let resolver = ExclusionResolver::new(
            &[],
            &[CatalogItem {
                id: "beer".to_string(),
                kind: ItemKind::Product,
                name: "Beer".to_string(),
                price: Money::from_cents(450),
                category_id: Some("bar".to_string()),
                exclude_from_discounts: true,
            }],
        );
        let order = OrderAggregate::empty(OrderId::new_local(), 2, Some(3))
            .and_then(|o| o.add_item(&resolver, 1, ItemRef::product("beer"), Money::from_cents(450)))
            .and_then(|o| o.add_item(&resolver, 2, ItemRef::tech_card("pasta"), Money::from_cents(1333)))
            .and_then(|o| o.set_discount(&resolver, 2, DiscountKind::Percentage, Decimal::new(125, 1)))
            .unwrap();
        (order, resolver)
    }

    #[test]
    fn test_round_trip_keeps_totals() {
        let (order, _) = sample_order();
        let raw = OrderSnapshot::capture(&order).encode().unwrap();
        let decoded = OrderSnapshot::decode(&raw).unwrap().into_order();

        assert_eq!(decoded.subtotal(), order.subtotal());
        assert_eq!(decoded.total_discount(), order.total_discount());
        assert_eq!(decoded.total_amount(), order.total_amount());
        // Unrounded precision survives: 13.33 × 12.5% = 1.66625
        assert_eq!(decoded.total_discount().amount(), Decimal::new(166625, 5));
        assert_eq!(decoded, order);
    }

    #[test]
    fn test_decode_refuses_overflowing_line_instead_of_panicking() {
        let (order, _) = sample_order();
        let mut value = serde_json::to_value(OrderSnapshot::capture(&order)).unwrap();
        let item = &mut value["order"]["guests"][0]["items"][0];
        item["quantity"] = serde_json::json!(9_000_000_000_000_000_000i64);
        item["unitPrice"] = serde_json::json!("100000000000");

        let err = OrderSnapshot::decode(&value.to_string()).unwrap_err();
        assert!(matches!(err, CoreError::CorruptSnapshot(ref msg) if msg.contains("quantity")));
    }

    #[test]
    fn test_decode_refuses_negative_price() {
        let (order, _) = sample_order();
        let mut value = serde_json::to_value(OrderSnapshot::capture(&order)).unwrap();
        value["order"]["guests"][0]["items"][0]["unitPrice"] = serde_json::json!("-4.50");

        assert!(matches!(
            OrderSnapshot::decode(&value.to_string()),
            Err(CoreError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage_and_unknown_version() {
        assert!(matches!(
            OrderSnapshot::decode("{not json"),
            Err(CoreError::CorruptSnapshot(_))
        ));

        let (order, _) = sample_order();
        let mut snapshot = OrderSnapshot::capture(&order);
        snapshot.version = 99;
        let raw = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(OrderSnapshot::decode(&raw), Err(CoreError::CorruptSnapshot(_))));
    }

    #[test]
    fn test_decode_rejects_tampered_totals() {
        let (order, _) = sample_order();
        let mut value = serde_json::to_value(OrderSnapshot::capture(&order)).unwrap();
        value["order"]["totalAmount"] = serde_json::json!("1.00");

        let raw = value.to_string();
        assert!(matches!(OrderSnapshot::decode(&raw), Err(CoreError::CorruptSnapshot(_))));
    }
}
