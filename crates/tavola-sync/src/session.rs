//! # Draft Session
//!
//! Keeps one open order in step with the local snapshot store and the
//! remote order service, from screen mount to screen exit.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Draft Session Flow                              │
//! │                                                                         │
//! │  mount(order_id?)                                                       │
//! │    ├── snapshot found ──────────► hydrate now (refresh_from_remote     │
//! │    │                              later replaces it for durable ids)   │
//! │    ├── durable id, no snapshot ─► fetch remote ──fail──► empty order   │
//! │    └── local id, no snapshot ───► empty order (not stored yet)         │
//! │                                                                         │
//! │  apply(transition)  ──► new aggregate ──► full snapshot write          │
//! │                                                                         │
//! │  exit()                                                                 │
//! │    ├── total 0 or no items ─────► delete snapshot        (Discarded)   │
//! │    ├── local id ────────────────► background create draft (Saving)     │
//! │    │                               ok:   re-key snapshot to durable id │
//! │    │                               fail: snapshot stays for retry      │
//! │    └── durable id ──────────────► nothing to do           (Retained)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteOrderService;
use crate::state::DraftState;
use crate::store::SnapshotStore;
use tavola_core::{
    CoreResult, ExclusionResolver, ExclusionRule, OrderAggregate, OrderId, OrderSnapshot,
    SNAPSHOT_KEY_PREFIX,
};

// =============================================================================
// Mount Parameters & Outcomes
// =============================================================================

/// Navigation-time parameters of the checkout screen.
#[derive(Debug, Clone)]
pub struct MountParams {
    /// Order to open; `None` starts a new order under a local placeholder id.
    pub order_id: Option<OrderId>,
    /// Guests for a fresh order.
    pub guest_count: u32,
    /// Table for a fresh order.
    pub table_number: Option<u32>,
}

impl MountParams {
    pub fn new(order_id: Option<OrderId>) -> Self {
        MountParams {
            order_id,
            guest_count: 1,
            table_number: None,
        }
    }

    pub fn guest_count(mut self, guest_count: u32) -> Self {
        self.guest_count = guest_count;
        self
    }

    pub fn table_number(mut self, table_number: Option<u32>) -> Self {
        self.table_number = table_number;
        self
    }
}

/// Where the mounted aggregate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountSource {
    LocalSnapshot,
    Remote,
    Fresh,
}

/// What happened to the order when the screen was left.
#[derive(Debug)]
pub enum ExitOutcome {
    /// Nothing payable: snapshot deleted, no remote call.
    Discarded,
    /// Already durable: snapshot kept as is.
    Retained,
    /// Local draft being created remotely in the background. Resolves to
    /// the durable id, or to the error after which the snapshot stays put.
    SavingDraft(JoinHandle<SyncResult<OrderId>>),
}

impl ExitOutcome {
    pub fn is_saving(&self) -> bool {
        matches!(self, ExitOutcome::SavingDraft(_))
    }
}

// =============================================================================
// Synchronizer
// =============================================================================

/// Opens draft sessions against a snapshot store and a remote service.
///
/// ## Example
/// ```rust,ignore
/// let sync = DraftSynchronizer::new(Arc::new(db.snapshots()), Arc::new(http));
/// let mut session = sync.mount(MountParams::new(None), resolver).await?;
/// session.apply(|o, r| o.add_item_to_selected(r, item_ref, price)).await?;
/// let outcome = session.exit().await;
/// ```
#[derive(Clone)]
pub struct DraftSynchronizer {
    store: Arc<dyn SnapshotStore>,
    remote: Arc<dyn RemoteOrderService>,
    key_prefix: String,
}

impl DraftSynchronizer {
    pub fn new(store: Arc<dyn SnapshotStore>, remote: Arc<dyn RemoteOrderService>) -> Self {
        DraftSynchronizer {
            store,
            remote,
            key_prefix: SNAPSHOT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Store key for `order_id`.
    pub fn snapshot_key(&self, order_id: &OrderId) -> String {
        format!("{}{}", self.key_prefix, order_id)
    }

    /// Opens the checkout screen on an order.
    ///
    /// Store and network failures never fail the mount; they degrade to the
    /// next source. Only invalid navigation parameters are an error.
    pub async fn mount(
        &self,
        params: MountParams,
        resolver: ExclusionResolver,
    ) -> SyncResult<DraftSession> {
        let order_id = params.order_id.clone().unwrap_or_else(OrderId::new_local);
        let cached = self.load_snapshot(&order_id).await;
        let state = DraftState::for_mount(&order_id, cached.is_some());

        let (order, source) = match cached {
            Some(order) => (order.recompute(&resolver), MountSource::LocalSnapshot),
            None if order_id.is_durable() => match self.fetch(&order_id, &resolver).await {
                Ok(order) => (order, MountSource::Remote),
                Err(e) => {
                    warn!(order_id = %order_id, error = %e, "Remote order unavailable, starting empty");
                    (fresh_order(&order_id, &params)?, MountSource::Fresh)
                }
            },
            None => (fresh_order(&order_id, &params)?, MountSource::Fresh),
        };

        info!(
            order_id = %order.order_id(),
            ?source,
            %state,
            guests = order.guest_count(),
            "Draft session mounted"
        );

        let session = DraftSession {
            sync: self.clone(),
            order,
            resolver,
            state,
            source,
        };

        if source == MountSource::Remote {
            if let Err(e) = session.persist().await {
                warn!(order_id = %session.order.order_id(), error = %e, "Could not cache remote order");
            }
        }

        Ok(session)
    }

    /// Reads and verifies the stored snapshot; anything unusable counts as
    /// no snapshot.
    async fn load_snapshot(&self, order_id: &OrderId) -> Option<OrderAggregate> {
        let key = self.snapshot_key(order_id);
        let raw = match self.store.load(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "Snapshot store read failed");
                return None;
            }
        };

        match OrderSnapshot::decode(&raw) {
            Ok(snapshot) => Some(snapshot.into_order()),
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring unusable snapshot");
                None
            }
        }
    }

    async fn fetch(
        &self,
        order_id: &OrderId,
        resolver: &ExclusionResolver,
    ) -> SyncResult<OrderAggregate> {
        let remote = self.remote.fetch_order(order_id).await?;
        Ok(remote.into_aggregate(resolver)?)
    }

    async fn write_snapshot(&self, order: &OrderAggregate) -> SyncResult<()> {
        let payload = OrderSnapshot::capture(order).encode()?;
        self.store
            .save(&self.snapshot_key(order.order_id()), &payload)
            .await
    }

    /// Creates `order` remotely and moves its snapshot to the durable key.
    async fn create_remote_draft(&self, order: OrderAggregate) -> SyncResult<OrderAggregate> {
        let old_key = self.snapshot_key(order.order_id());
        let request = order.create_draft_request();

        let response = match self.remote.create_draft(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    order_id = %order.order_id(),
                    error = %e,
                    retryable = e.is_retryable(),
                    "Draft save failed, snapshot kept under local key"
                );
                return Err(e);
            }
        };

        let saved = order.with_durable_id(response.order_id());
        let new_key = self.snapshot_key(saved.order_id());
        let payload = OrderSnapshot::capture(&saved).encode()?;

        // The order exists remotely either way; a failed re-key only costs the cache
        if let Err(e) = self.store.migrate(&old_key, &new_key, &payload).await {
            error!(old_key = %old_key, new_key = %new_key, error = %e, "Snapshot re-key failed");
        }

        info!(
            order_id = %saved.order_id(),
            items = request.items.len(),
            total = %request.total_amount,
            "Draft saved"
        );
        Ok(saved)
    }
}

fn fresh_order(order_id: &OrderId, params: &MountParams) -> CoreResult<OrderAggregate> {
    OrderAggregate::empty(order_id.clone(), params.guest_count, params.table_number)
}

// =============================================================================
// Session
// =============================================================================

/// One open order on the checkout screen.
pub struct DraftSession {
    sync: DraftSynchronizer,
    order: OrderAggregate,
    resolver: ExclusionResolver,
    state: DraftState,
    source: MountSource,
}

impl DraftSession {
    pub fn order(&self) -> &OrderAggregate {
        &self.order
    }

    pub fn resolver(&self) -> &ExclusionResolver {
        &self.resolver
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn source(&self) -> MountSource {
        self.source
    }

    /// True when the order was hydrated from a snapshot but the remote
    /// service holds the authoritative copy.
    pub fn needs_refresh(&self) -> bool {
        self.source == MountSource::LocalSnapshot && self.order.order_id().is_durable()
    }

    /// Runs a pure transition and writes the resulting snapshot.
    ///
    /// A rejected transition leaves everything untouched. When only the
    /// snapshot write fails, the new aggregate is kept in memory and the
    /// store error is returned.
    pub async fn apply<F>(&mut self, transition: F) -> SyncResult<&OrderAggregate>
    where
        F: FnOnce(&OrderAggregate, &ExclusionResolver) -> CoreResult<OrderAggregate>,
    {
        self.order = transition(&self.order, &self.resolver)?;
        self.persist().await?;
        self.state = self.state.after_mutation();
        Ok(&self.order)
    }

    /// Swaps in a refreshed rule list and re-derives every discount.
    pub async fn update_rules(&mut self, rules: &[ExclusionRule]) -> SyncResult<()> {
        self.resolver = self.resolver.with_rules(rules);
        self.order = self.order.recompute(&self.resolver);
        debug!(
            order_id = %self.order.order_id(),
            active_rules = self.resolver.active_rule_count(),
            "Exclusion rules refreshed"
        );

        if self.state.is_stored_locally() {
            self.persist().await?;
        }
        Ok(())
    }

    /// Replaces the aggregate with the remote copy of a durable order.
    ///
    /// ## Returns
    /// `false` for local drafts, which have no remote copy.
    pub async fn refresh_from_remote(&mut self) -> SyncResult<bool> {
        let order_id = self.order.order_id().clone();
        if order_id.is_local() {
            return Ok(false);
        }

        let fresh = match self.sync.fetch(&order_id, &self.resolver).await {
            Ok(order) => order,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Remote refresh failed, keeping snapshot");
                return Err(e);
            }
        };

        // Keep the operator's guest selection when that guest still exists
        let selected = fresh.select_guest(self.order.selected_guest_number()).ok();
        self.order = selected.unwrap_or(fresh);
        self.source = MountSource::Remote;
        self.persist().await?;

        debug!(order_id = %order_id, items = self.order.item_count(), "Remote order superseded snapshot");
        Ok(true)
    }

    /// Explicit draft save: creates the order remotely now.
    pub async fn save_draft(&mut self) -> SyncResult<OrderId> {
        let next_state = self
            .state
            .after_draft_saved(self.order.order_id(), self.order.has_items())?;

        self.order = self.sync.create_remote_draft(self.order.clone()).await?;
        self.state = next_state;
        Ok(self.order.order_id().clone())
    }

    /// Leaves the screen. Never waits on the network.
    pub async fn exit(self) -> ExitOutcome {
        let order_id = self.order.order_id().clone();

        if self.order.total_amount().is_zero() || !self.order.has_items() {
            let key = self.sync.snapshot_key(&order_id);
            if let Err(e) = self.sync.store.delete(&key).await {
                warn!(key = %key, error = %e, "Could not delete empty order snapshot");
            }
            info!(order_id = %order_id, "Empty order discarded");
            return ExitOutcome::Discarded;
        }

        if order_id.is_local() {
            debug!(order_id = %order_id, "Saving draft in background");
            let sync = self.sync;
            let order = self.order;
            let handle = tokio::spawn(async move {
                let saved = sync.create_remote_draft(order).await?;
                Ok(saved.order_id().clone())
            });
            return ExitOutcome::SavingDraft(handle);
        }

        ExitOutcome::Retained
    }

    async fn persist(&self) -> SyncResult<()> {
        self.sync.write_snapshot(&self.order).await.map_err(|e| {
            error!(order_id = %self.order.order_id(), error = %e, "Snapshot write failed");
            e
        })
    }
}

impl std::fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSession")
            .field("order_id", self.order.order_id())
            .field("state", &self.state)
            .field("source", &self.source)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySnapshotStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use tavola_core::{
        CreateDraftRequest, CreateDraftResponse, DiscountKind, ItemRef, Money, RemoteOrder,
        RemoteOrderItem,
    };
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingRemote {
        drafts: Mutex<Vec<CreateDraftRequest>>,
        fetches: Mutex<Vec<String>>,
        orders: Vec<RemoteOrder>,
        fail_create: bool,
    }

    impl RecordingRemote {
        fn failing() -> Self {
            RecordingRemote {
                fail_create: true,
                ..Default::default()
            }
        }

        fn serving(order: RemoteOrder) -> Self {
            RecordingRemote {
                orders: vec![order],
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl RemoteOrderService for RecordingRemote {
        async fn fetch_order(&self, order_id: &OrderId) -> SyncResult<RemoteOrder> {
            self.fetches.lock().await.push(order_id.to_string());
            self.orders
                .iter()
                .find(|o| o.id == order_id.as_str())
                .cloned()
                .ok_or_else(|| SyncError::NotFound(order_id.to_string()))
        }

        async fn create_draft(&self, request: &CreateDraftRequest) -> SyncResult<CreateDraftResponse> {
            self.drafts.lock().await.push(request.clone());
            if self.fail_create {
                return Err(SyncError::ConnectionFailed("network unreachable".into()));
            }
            Ok(CreateDraftResponse { id: "1842".into() })
        }
    }

    fn setup(remote: RecordingRemote) -> (DraftSynchronizer, Arc<MemorySnapshotStore>, Arc<RecordingRemote>) {
        let store = Arc::new(MemorySnapshotStore::new());
        let remote = Arc::new(remote);
        let sync = DraftSynchronizer::new(store.clone(), remote.clone());
        (sync, store, remote)
    }

    fn resolver() -> ExclusionResolver {
        ExclusionResolver::new(&[], &[])
    }

    fn remote_order() -> RemoteOrder {
        RemoteOrder {
            id: "1842".into(),
            table_number: Some(7),
            guest_count: None,
            items: vec![RemoteOrderItem {
                id: "r1".into(),
                product_id: Some("p9".into()),
                tech_card_id: None,
                guest_number: 2,
                quantity: 2,
                price: Money::from_major(100),
            }],
        }
    }

    async fn add(session: &mut DraftSession, id: &str, price: i64) {
        session
            .apply(|o, r| o.add_item_to_selected(r, ItemRef::product(id), Money::from_major(price)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fresh_local_order_is_not_stored_until_first_change() {
        let (sync, store, _) = setup(RecordingRemote::default());

        let mut session = sync
            .mount(MountParams::new(None).guest_count(3).table_number(Some(12)), resolver())
            .await
            .unwrap();

        assert_eq!(session.source(), MountSource::Fresh);
        assert_eq!(session.state(), DraftState::Empty);
        assert_eq!(session.order().guest_count(), 3);
        assert_eq!(session.order().table_number(), Some(12));
        assert!(store.is_empty().await);

        add(&mut session, "p1", 100).await;

        assert_eq!(session.state(), DraftState::LocalDraft);
        let key = sync.snapshot_key(session.order().order_id());
        assert_eq!(store.keys().await, vec![key]);
    }

    #[tokio::test]
    async fn test_every_change_rewrites_snapshot() {
        let (sync, store, _) = setup(RecordingRemote::default());
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();

        add(&mut session, "p1", 100).await;
        add(&mut session, "p2", 250).await;
        session
            .apply(|o, r| o.set_selected_discount(r, DiscountKind::Percentage, Decimal::from(10)))
            .await
            .unwrap();

        let key = sync.snapshot_key(session.order().order_id());
        let raw = store.load(&key).await.unwrap().unwrap();
        let restored = OrderSnapshot::decode(&raw).unwrap().into_order();
        assert_eq!(restored.total_amount(), Money::from_major(315));
        assert_eq!(&restored, session.order());
    }

    #[tokio::test]
    async fn test_rejected_transition_changes_nothing() {
        let (sync, store, _) = setup(RecordingRemote::default());
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();

        let err = session.apply(|o, _| o.select_guest(9)).await.unwrap_err();

        assert!(matches!(err, SyncError::Core(_)));
        assert_eq!(session.state(), DraftState::Empty);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_exit_deletes_snapshot_without_remote_call() {
        let (sync, store, remote) = setup(RecordingRemote::default());
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();

        add(&mut session, "p1", 100).await;
        let item_id = session.order().guests()[0].items()[0].id.clone();
        session
            .apply(|o, r| o.remove_item(r, 1, &item_id))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        let outcome = session.exit().await;

        assert!(matches!(outcome, ExitOutcome::Discarded));
        assert!(store.is_empty().await);
        assert!(remote.drafts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_fully_discounted_exit_is_discarded_with_items() {
        let (sync, store, remote) = setup(RecordingRemote::default());
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();

        add(&mut session, "p1", 30).await;
        session
            .apply(|o, r| o.set_selected_discount(r, DiscountKind::Fixed, Decimal::from(50)))
            .await
            .unwrap();
        assert!(session.order().has_items());
        assert!(session.order().total_amount().is_zero());
        assert_eq!(store.len().await, 1);

        let outcome = session.exit().await;

        assert!(matches!(outcome, ExitOutcome::Discarded));
        assert!(store.is_empty().await);
        assert!(remote.drafts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_local_exit_creates_draft_and_rekeys_snapshot() {
        let (sync, store, remote) = setup(RecordingRemote::default());
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();
        let local_key = sync.snapshot_key(session.order().order_id());

        add(&mut session, "p1", 100).await;
        add(&mut session, "p1", 100).await;
        session.apply(|o, _| o.add_guest()).await.unwrap();
        add(&mut session, "p2", 40).await;

        let handle = match session.exit().await {
            ExitOutcome::SavingDraft(handle) => handle,
            other => panic!("expected a background save, got {:?}", other),
        };
        let durable = handle.await.unwrap().unwrap();
        assert_eq!(durable, OrderId::durable("1842"));

        let drafts = remote.drafts.lock().await;
        assert_eq!(drafts.len(), 1);
        let guests: Vec<u32> = drafts[0].items.iter().map(|i| i.guest_number).collect();
        assert_eq!(guests, vec![1, 2]);
        assert_eq!(drafts[0].items[0].quantity, 2);
        assert_eq!(drafts[0].total_amount, Money::from_major(240));

        let new_key = sync.snapshot_key(&durable);
        assert_eq!(store.keys().await, vec![new_key.clone()]);
        assert!(store.load(&local_key).await.unwrap().is_none());

        let raw = store.load(&new_key).await.unwrap().unwrap();
        let restored = OrderSnapshot::decode(&raw).unwrap().into_order();
        assert_eq!(restored.order_id(), &durable);
    }

    #[tokio::test]
    async fn test_failed_draft_save_keeps_local_snapshot() {
        let (sync, store, remote) = setup(RecordingRemote::failing());
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();
        let local_key = sync.snapshot_key(session.order().order_id());
        add(&mut session, "p1", 100).await;

        let ExitOutcome::SavingDraft(handle) = session.exit().await else {
            panic!("expected a background save");
        };
        let err = handle.await.unwrap().unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(remote.drafts.lock().await.len(), 1);
        assert_eq!(store.keys().await, vec![local_key]);
    }

    #[tokio::test]
    async fn test_snapshot_wins_at_mount_then_remote_supersedes() {
        let durable = OrderId::durable("1842");
        let cached = OrderAggregate::empty(durable.clone(), 1, None)
            .unwrap()
            .add_item_to_selected(&resolver(), ItemRef::product("stale"), Money::from_major(5))
            .unwrap();

        let store = Arc::new(MemorySnapshotStore::with_entry(
            "order_data_1842",
            OrderSnapshot::capture(&cached).encode().unwrap(),
        ));
        let remote = Arc::new(RecordingRemote::serving(remote_order()));
        let sync = DraftSynchronizer::new(store.clone(), remote.clone());

        let mut session = sync
            .mount(MountParams::new(Some(durable.clone())), resolver())
            .await
            .unwrap();

        assert_eq!(session.source(), MountSource::LocalSnapshot);
        assert_eq!(session.state(), DraftState::RemotePersisted);
        assert!(session.needs_refresh());
        assert!(remote.fetches.lock().await.is_empty());
        assert_eq!(session.order().total_amount(), Money::from_major(5));

        assert!(session.refresh_from_remote().await.unwrap());

        assert_eq!(session.order().guest_count(), 2);
        assert_eq!(session.order().total_amount(), Money::from_major(200));
        assert!(!session.needs_refresh());

        let raw = store.load("order_data_1842").await.unwrap().unwrap();
        let stored = OrderSnapshot::decode(&raw).unwrap().into_order();
        assert_eq!(stored.total_amount(), Money::from_major(200));
    }

    #[tokio::test]
    async fn test_durable_order_without_snapshot_is_fetched() {
        let (sync, store, remote) = setup(RecordingRemote::serving(remote_order()));

        let session = sync
            .mount(MountParams::new(Some(OrderId::durable("1842"))), resolver())
            .await
            .unwrap();

        assert_eq!(session.source(), MountSource::Remote);
        assert_eq!(session.order().table_number(), Some(7));
        assert_eq!(session.order().guest(2).unwrap().item_count(), 1);
        assert_eq!(*remote.fetches.lock().await, vec!["1842".to_string()]);
        assert_eq!(store.keys().await, vec!["order_data_1842".to_string()]);

        assert!(matches!(session.exit().await, ExitOutcome::Retained));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unreachable_remote_falls_back_to_empty_order() {
        let (sync, store, _) = setup(RecordingRemote::default());

        let session = sync
            .mount(
                MountParams::new(Some(OrderId::durable("77"))).guest_count(2),
                resolver(),
            )
            .await
            .unwrap();

        assert_eq!(session.source(), MountSource::Fresh);
        assert_eq!(session.order().order_id(), &OrderId::durable("77"));
        assert_eq!(session.order().guest_count(), 2);
        assert!(!session.order().has_items());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_ignored() {
        let id = OrderId::new_local();
        let store = Arc::new(MemorySnapshotStore::with_entry(
            format!("order_data_{}", id),
            "{not json",
        ));
        let sync = DraftSynchronizer::new(store, Arc::new(RecordingRemote::default()));

        let session = sync
            .mount(MountParams::new(Some(id.clone())), resolver())
            .await
            .unwrap();

        assert_eq!(session.source(), MountSource::Fresh);
        assert_eq!(session.state(), DraftState::Empty);
        assert_eq!(session.order().order_id(), &id);
    }

    #[tokio::test]
    async fn test_overflowing_snapshot_counts_as_absent() {
        let id = OrderId::new_local();
        let order = OrderAggregate::empty(id.clone(), 1, None)
            .unwrap()
            .add_item_to_selected(&resolver(), ItemRef::product("p"), Money::from_major(1))
            .unwrap();
        let mut value = serde_json::to_value(OrderSnapshot::capture(&order)).unwrap();
        value["order"]["guests"][0]["items"][0]["quantity"] =
            serde_json::json!(9_000_000_000_000_000_000i64);
        value["order"]["guests"][0]["items"][0]["unitPrice"] = serde_json::json!("100000000000");

        let store = Arc::new(MemorySnapshotStore::with_entry(
            format!("order_data_{}", id),
            value.to_string(),
        ));
        let sync = DraftSynchronizer::new(store, Arc::new(RecordingRemote::default()));

        let session = sync
            .mount(MountParams::new(Some(id.clone())), resolver())
            .await
            .unwrap();

        assert_eq!(session.source(), MountSource::Fresh);
        assert!(!session.order().has_items());
    }

    #[tokio::test]
    async fn test_overflowing_remote_order_falls_back_to_empty() {
        let mut order = remote_order();
        order.items[0].quantity = 9_000_000_000_000_000_000;
        order.items[0].price = Money::from_major(100_000_000_000);
        let (sync, store, remote) = setup(RecordingRemote::serving(order));

        let session = sync
            .mount(MountParams::new(Some(OrderId::durable("1842"))), resolver())
            .await
            .unwrap();

        assert_eq!(session.source(), MountSource::Fresh);
        assert_eq!(remote.fetches.lock().await.len(), 1);
        assert!(!session.order().has_items());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_guest_count_fails_mount() {
        let (sync, _, _) = setup(RecordingRemote::default());
        let err = sync
            .mount(MountParams::new(None).guest_count(0), resolver())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Core(_)));
    }

    #[tokio::test]
    async fn test_save_draft_guard_and_success() {
        let (sync, store, remote) = setup(RecordingRemote::default());
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();

        let err = session.save_draft().await.unwrap_err();
        assert!(matches!(err, SyncError::NothingToSave(_)));
        assert!(remote.drafts.lock().await.is_empty());

        add(&mut session, "p1", 100).await;
        let durable = session.save_draft().await.unwrap();

        assert_eq!(session.state(), DraftState::RemotePersisted);
        assert_eq!(session.order().order_id(), &durable);
        assert_eq!(store.keys().await, vec!["order_data_1842".to_string()]);

        let again = session.save_draft().await.unwrap_err();
        assert!(matches!(again, SyncError::AlreadyPersisted(_)));
    }

    #[tokio::test]
    async fn test_custom_key_prefix() {
        let store = Arc::new(MemorySnapshotStore::new());
        let sync = DraftSynchronizer::new(store.clone(), Arc::new(RecordingRemote::default()))
            .with_key_prefix("bar2_");
        let mut session = sync.mount(MountParams::new(None), resolver()).await.unwrap();

        add(&mut session, "p1", 100).await;

        let keys = store.keys().await;
        assert!(keys[0].starts_with("bar2_local-"));
    }
}
