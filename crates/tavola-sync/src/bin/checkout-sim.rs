//! # Checkout Simulator
//!
//! Runs one checkout screen visit end to end against the configured
//! snapshot store and remote order service.
//!
//! ## Usage
//! ```bash
//! # New order, two guests, table 12
//! cargo run -p tavola-sync --bin checkout-sim
//!
//! # Reopen an existing order
//! cargo run -p tavola-sync --bin checkout-sim -- 1842
//!
//! # Point at a server and a throwaway database
//! TAVOLA_REMOTE_URL=http://localhost:8080/api \
//! TAVOLA_DATABASE_PATH=./data/tavola.db \
//!     cargo run -p tavola-sync --bin checkout-sim
//! ```
//!
//! Without a remote URL the draft save fails with `RemoteDisabled` and the
//! snapshot stays under its local key, which is what the terminal does
//! offline.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tavola_core::validation::{parse_discount_input, validate_order_id};
use tavola_core::{
    CatalogItem, Customer, CustomerGroup, DiscountKind, ExclusionKind, ExclusionResolver,
    ExclusionRule, ItemKind, Money,
};
use tavola_db::{Database, DbConfig};
use tavola_sync::{
    DraftSynchronizer, ExitOutcome, HttpOrderService, MountParams, OfflineOrderService,
    RemoteOrderService, SnapshotStore, SyncConfig,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tavola=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// A small bar menu: two drinks, a dish and a tech card for the house
/// cocktail. Wine is excluded from discounts by category.
fn demo_catalog() -> (Vec<CatalogItem>, Vec<ExclusionRule>) {
    let item = |id: &str, kind, name: &str, cents, category: &str| CatalogItem {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        price: Money::from_cents(cents),
        category_id: Some(category.to_string()),
        exclude_from_discounts: false,
    };

    let catalog = vec![
        item("espresso", ItemKind::Product, "Espresso", 250, "coffee"),
        item("chianti", ItemKind::Product, "Chianti (glass)", 900, "wine"),
        item("carbonara", ItemKind::Product, "Carbonara", 1450, "kitchen"),
        item("negroni", ItemKind::TechCard, "House Negroni", 1100, "bar"),
    ];

    let rules = vec![ExclusionRule {
        id: "no-wine-discounts".to_string(),
        kind: ExclusionKind::Category,
        entity_id: "wine".to_string(),
        active: true,
    }];

    (catalog, rules)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = SyncConfig::load_or_default(None);
    info!(terminal = %config.terminal.name, remote = config.is_remote_enabled(), "Checkout simulator starting");

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let store: Arc<dyn SnapshotStore> = Arc::new(db.snapshots());
    let remote: Arc<dyn RemoteOrderService> = match HttpOrderService::from_config(&config)? {
        Some(http) => Arc::new(http),
        None => Arc::new(OfflineOrderService),
    };
    let sync = DraftSynchronizer::new(store, remote)
        .with_key_prefix(config.storage.key_prefix.clone());

    let order_id = std::env::args()
        .nth(1)
        .map(|raw| validate_order_id(&raw))
        .transpose()?;

    let leftovers = db.snapshots().order_ids(&config.storage.key_prefix).await?;
    if !leftovers.is_empty() {
        info!(count = leftovers.len(), "Orders with a stored snapshot on this terminal");
    }

    let (catalog, rules) = demo_catalog();
    let resolver = ExclusionResolver::new(&rules, &catalog);
    let price_of = |id: &str| {
        catalog
            .iter()
            .find(|c| c.id == id)
            .map(|c| (c.item_ref(), c.price))
    };

    let mut session = sync
        .mount(
            MountParams::new(order_id).guest_count(2).table_number(Some(12)),
            resolver,
        )
        .await?;

    if session.needs_refresh() {
        if let Err(e) = session.refresh_from_remote().await {
            warn!(error = %e, "Showing the local snapshot");
        }
    }

    // Guest 1: coffee and wine, 10% off (wine stays full price)
    for id in ["espresso", "espresso", "chianti"] {
        if let Some((item_ref, price)) = price_of(id) {
            session
                .apply(|o, r| o.add_item(r, 1, item_ref, price))
                .await?;
        }
    }
    let ten_percent = parse_discount_input(DiscountKind::Percentage, "10")?;
    session
        .apply(|o, r| o.set_discount(r, 1, DiscountKind::Percentage, ten_percent))
        .await?;

    // Guest 2: a regular with a group discount
    let regular = Customer {
        id: "cust-17".to_string(),
        name: "Giulia".to_string(),
        phone: None,
        group: Some(CustomerGroup {
            id: "friends".to_string(),
            name: "Friends of the house".to_string(),
            discount_percentage: Decimal::from(15),
        }),
    };
    for id in ["carbonara", "negroni"] {
        if let Some((item_ref, price)) = price_of(id) {
            session
                .apply(|o, r| o.add_item(r, 2, item_ref, price))
                .await?;
        }
    }
    session
        .apply(|o, r| o.assign_customer(r, 2, Some(regular)))
        .await?;

    let order = session.order();
    for guest in order.guests() {
        info!(
            guest = guest.guest_number(),
            items = guest.item_count(),
            subtotal = %guest.subtotal(),
            discount = %guest.discount().amount,
            total = %guest.final_amount(),
            "Guest bill"
        );
    }
    info!(
        order_id = %order.order_id(),
        subtotal = %order.subtotal(),
        discount = %order.total_discount(),
        total = %order.total_amount(),
        "Order totals"
    );

    match session.exit().await {
        ExitOutcome::Discarded => info!("Nothing to keep"),
        ExitOutcome::Retained => info!("Order already on the server"),
        ExitOutcome::SavingDraft(save) => match save.await {
            Ok(Ok(id)) => info!(order_id = %id, "Draft stored remotely"),
            Ok(Err(e)) => warn!(error = %e, "Draft kept locally"),
            Err(e) => error!(error = %e, "Draft save task failed"),
        },
    }

    db.close().await;
    Ok(())
}
