//! # Domain Types
//!
//! Reference data the checkout engine consumes but does not own.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CatalogItem   │   │  ExclusionRule  │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id + kind      │   │  kind           │   │  id, name       │       │
//! │  │  price          │   │  entity_id      │   │  phone          │       │
//! │  │  category_id    │   │  active         │   │  group ──────┐  │       │
//! │  │  exclude flag   │   └─────────────────┘   └──────────────┼──┘       │
//! │  └─────────────────┘                                        ▼          │
//! │                                              ┌─────────────────┐       │
//! │  ┌─────────────────┐   ┌─────────────────┐   │  CustomerGroup  │       │
//! │  │     ItemRef     │   │     OrderId     │   │  discount %     │       │
//! │  │  kind: Product  │   │  local-<uuid>   │   └─────────────────┘       │
//! │  │      | TechCard │   │  or durable id  │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

/// Prefix that marks an order id as generated on this terminal.
pub const LOCAL_ORDER_ID_PREFIX: &str = "local-";

// =============================================================================
// Item Reference
// =============================================================================

/// What a line item points at in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A plain catalog product.
    Product,
    /// A technical card (a recipe sold as one dish).
    TechCard,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Product => write!(f, "product"),
            ItemKind::TechCard => write!(f, "tech_card"),
        }
    }
}

/// A tagged catalog reference: exactly one of product id or tech card id.
///
/// The kind is carried from creation, so nothing downstream ever has to sniff
/// which id field happens to be present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: String,
}

impl ItemRef {
    pub fn product(id: impl Into<String>) -> Self {
        ItemRef {
            kind: ItemKind::Product,
            id: id.into(),
        }
    }

    pub fn tech_card(id: impl Into<String>) -> Self {
        ItemRef {
            kind: ItemKind::TechCard,
            id: id.into(),
        }
    }

    /// Returns the id when this is a product reference.
    pub fn product_id(&self) -> Option<&str> {
        match self.kind {
            ItemKind::Product => Some(&self.id),
            ItemKind::TechCard => None,
        }
    }

    /// Returns the id when this is a tech card reference.
    pub fn tech_card_id(&self) -> Option<&str> {
        match self.kind {
            ItemKind::TechCard => Some(&self.id),
            ItemKind::Product => None,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog lookup shape, as delivered by the catalog directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub exclude_from_discounts: bool,
}

impl CatalogItem {
    /// The reference a line item created from this entry will carry.
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

// =============================================================================
// Exclusion Rules
// =============================================================================

/// Target type of an exclusion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    Product,
    Category,
}

/// A configured rule marking a product or a category as not discountable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionRule {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ExclusionKind,
    pub entity_id: String,
    pub active: bool,
}

// =============================================================================
// Customers
// =============================================================================

/// Customer group with an optional automatic discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerGroup {
    pub id: String,
    pub name: String,
    /// Percentage 0-100; zero means the group carries no discount.
    #[ts(type = "string")]
    pub discount_percentage: Decimal,
}

/// A customer-directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub group: Option<CustomerGroup>,
}

impl Customer {
    /// The percentage applied automatically when this customer is assigned,
    /// capped at 100.
    pub fn group_discount(&self) -> Option<Decimal> {
        self.group
            .as_ref()
            .map(|g| g.discount_percentage.min(Decimal::ONE_HUNDRED))
            .filter(|pct| *pct > Decimal::ZERO)
    }
}

// =============================================================================
// Order Id
// =============================================================================

/// Identifier of an order: a local placeholder or a durable server id.
///
/// ## Identity
/// ```text
/// "local-6f1c…"  ← generated on this terminal, never seen by the server
/// "1842"         ← issued by the remote order service on first draft save
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderId(#[ts(type = "string")] String);

impl OrderId {
    /// Generates a fresh local placeholder id.
    pub fn new_local() -> Self {
        OrderId(format!("{}{}", LOCAL_ORDER_ID_PREFIX, Uuid::new_v4()))
    }

    /// Wraps an id handed over by navigation or by the remote service.
    pub fn parse(raw: impl Into<String>) -> Self {
        OrderId(raw.into())
    }

    /// Wraps an id issued by the remote service.
    pub fn durable(raw: impl Into<String>) -> Self {
        OrderId(raw.into())
    }

    /// True when the id was generated locally and never persisted remotely.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ORDER_ID_PREFIX)
    }

    /// True when the id was issued by the remote service.
    pub fn is_durable(&self) -> bool {
        !self.is_local()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_order_ids() {
        let id = OrderId::new_local();
        assert!(id.is_local());
        assert!(id.as_str().starts_with("local-"));
        assert_ne!(id, OrderId::new_local());

        let durable = OrderId::parse("1842");
        assert!(durable.is_durable());
        assert_eq!(durable.to_string(), "1842");
    }

    #[test]
    fn test_order_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&OrderId::durable("77")).unwrap();
        assert_eq!(json, "\"77\"");
    }

    #[test]
    fn test_item_ref_accessors() {
        let product = ItemRef::product("p1");
        assert_eq!(product.product_id(), Some("p1"));
        assert_eq!(product.tech_card_id(), None);

        let card = ItemRef::tech_card("t1");
        assert_eq!(card.tech_card_id(), Some("t1"));
        assert_ne!(ItemRef::product("x"), ItemRef::tech_card("x"));
    }

    #[test]
    fn test_group_discount_ignores_zero() {
        let mut customer = Customer {
            id: "c1".into(),
            name: "Ana".into(),
            phone: None,
            group: Some(CustomerGroup {
                id: "g1".into(),
                name: "Staff".into(),
                discount_percentage: Decimal::ZERO,
            }),
        };
        assert_eq!(customer.group_discount(), None);

        if let Some(group) = customer.group.as_mut() {
            group.discount_percentage = Decimal::from(15);
        }
        assert_eq!(customer.group_discount(), Some(Decimal::from(15)));

        if let Some(group) = customer.group.as_mut() {
            group.discount_percentage = Decimal::from(150);
        }
        assert_eq!(customer.group_discount(), Some(Decimal::ONE_HUNDRED));
    }

    #[test]
    fn test_exclusion_rule_wire_shape() {
        let json = r#"{"id":"r1","type":"category","entityId":"drinks","active":true}"#;
        let rule: ExclusionRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.kind, ExclusionKind::Category);
        assert_eq!(rule.entity_id, "drinks");
    }
}
