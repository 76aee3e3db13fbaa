//! # Exclusion Resolver
//!
//! Decides which line items may be discounted.
//!
//! ## Decision Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  classify(item_ref)                                                     │
//! │       │                                                                 │
//! │       ├── active PRODUCT rule on this product id?  → Excluded           │
//! │       │                                                                 │
//! │       ├── catalog metadata missing?                → Unresolved         │
//! │       │                                            (counted ELIGIBLE)   │
//! │       │                                                                 │
//! │       ├── catalog flag exclude_from_discounts?     → Excluded           │
//! │       │                                                                 │
//! │       ├── active CATEGORY rule on its category?    → Excluded           │
//! │       │                                                                 │
//! │       └── otherwise                                → Eligible           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failing Open
//! An item whose catalog entry cannot be found is discountable. Missing
//! metadata must not block checkout; [`ExclusionSplit::unresolved`] lists those
//! items so the screen can tell the operator.

use std::collections::{HashMap, HashSet};

use crate::guest::LineItem;
use crate::money::Money;
use crate::types::{CatalogItem, ExclusionKind, ExclusionRule, ItemKind, ItemRef};

/// Why an item is not discountable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The catalog entry itself is flagged.
    ItemFlag,
    /// An active product rule names this product.
    ProductRule,
    /// An active category rule names the item's category.
    CategoryRule,
}

/// Classification of a single reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Excluded(ExclusionReason),
    /// No catalog metadata; treated as eligible.
    Unresolved,
}

impl Eligibility {
    pub fn is_excluded(&self) -> bool {
        matches!(self, Eligibility::Excluded(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ItemMeta {
    category_id: Option<String>,
    exclude_from_discounts: bool,
}

/// Partition of a guest's items by discount eligibility.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSplit<'a> {
    pub excluded: Vec<&'a LineItem>,
    pub eligible: Vec<&'a LineItem>,
    /// Sum of `line_total` over `eligible`; the discount base.
    pub eligible_amount: Money,
    /// Ids of eligible items that were only eligible because metadata was missing.
    pub unresolved: Vec<&'a str>,
}

/// Pure function of the active rule set and catalog metadata.
#[derive(Debug, Clone, Default)]
pub struct ExclusionResolver {
    excluded_products: HashSet<String>,
    excluded_categories: HashSet<String>,
    catalog: HashMap<ItemRef, ItemMeta>,
}

impl ExclusionResolver {
    /// Builds a resolver; inactive rules are dropped here.
    pub fn new(rules: &[ExclusionRule], catalog: &[CatalogItem]) -> Self {
        let mut resolver = ExclusionResolver::default();
        resolver.load_rules(rules);
        resolver.extend_catalog(catalog);
        resolver
    }

    /// Returns a copy with the rule list replaced and the catalog kept.
    pub fn with_rules(&self, rules: &[ExclusionRule]) -> Self {
        let mut resolver = ExclusionResolver {
            excluded_products: HashSet::new(),
            excluded_categories: HashSet::new(),
            catalog: self.catalog.clone(),
        };
        resolver.load_rules(rules);
        resolver
    }

    /// Adds or replaces catalog metadata.
    pub fn extend_catalog(&mut self, catalog: &[CatalogItem]) {
        for item in catalog {
            self.catalog.insert(
                item.item_ref(),
                ItemMeta {
                    category_id: item.category_id.clone(),
                    exclude_from_discounts: item.exclude_from_discounts,
                },
            );
        }
    }

    fn load_rules(&mut self, rules: &[ExclusionRule]) {
        for rule in rules.iter().filter(|r| r.active) {
            match rule.kind {
                ExclusionKind::Product => {
                    self.excluded_products.insert(rule.entity_id.clone());
                }
                ExclusionKind::Category => {
                    self.excluded_categories.insert(rule.entity_id.clone());
                }
            }
        }
    }

    /// Number of active rules (product + category).
    pub fn active_rule_count(&self) -> usize {
        self.excluded_products.len() + self.excluded_categories.len()
    }

    /// Classifies a catalog reference.
    pub fn classify(&self, item_ref: &ItemRef) -> Eligibility {
        // Product rules need no metadata, only the reference id
        if item_ref.kind == ItemKind::Product && self.excluded_products.contains(&item_ref.id) {
            return Eligibility::Excluded(ExclusionReason::ProductRule);
        }

        let Some(meta) = self.catalog.get(item_ref) else {
            return Eligibility::Unresolved;
        };

        if meta.exclude_from_discounts {
            return Eligibility::Excluded(ExclusionReason::ItemFlag);
        }

        match &meta.category_id {
            Some(category) if self.excluded_categories.contains(category) => {
                Eligibility::Excluded(ExclusionReason::CategoryRule)
            }
            _ => Eligibility::Eligible,
        }
    }

    /// `isExcluded(item)`.
    pub fn is_excluded(&self, item: &LineItem) -> bool {
        self.classify(&item.item_ref).is_excluded()
    }

    /// Partitions items and sums the eligible line totals.
    pub fn split_by_exclusion<'a>(&self, items: &'a [LineItem]) -> ExclusionSplit<'a> {
        let mut split = ExclusionSplit::default();

        for item in items {
            match self.classify(&item.item_ref) {
                Eligibility::Excluded(_) => split.excluded.push(item),
                eligibility => {
                    if eligibility == Eligibility::Unresolved {
                        split.unresolved.push(item.id.as_str());
                    }
                    split.eligible_amount += item.line_total;
                    split.eligible.push(item);
                }
            }
        }

        split
    }

    /// Shortcut for the discount base only.
    pub fn eligible_amount(&self, items: &[LineItem]) -> Money {
        items
            .iter()
            .filter(|item| !self.is_excluded(item))
            .map(|item| item.line_total)
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
