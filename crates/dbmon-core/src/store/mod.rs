// ── Instance store ──
//
// One store owns one state container. Views read snapshots, subscribe to
// typed events, and change state only through `actions()`.
//
// Layout:
//   state       -- the container and its snapshot type
//   selection   -- selection ⊆ available bookkeeping
//   operations  -- per-id in-flight sets
//   events      -- the event union and channel kinds
//   actions     -- the public mutators

pub mod actions;
pub mod events;
pub mod operations;
pub mod selection;
pub mod state;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace, warn};

use crate::adapter::ServiceAdapter;
use crate::config::StoreConfig;
use crate::emitter::{ChannelEmitter, Emitter, Event, SubscriptionId};
use crate::error::StoreError;
use crate::model::{EntityId, EntityInput, Filters, InstanceStats, Outcome};
use crate::stream::{EventStream, StateStream};

pub use actions::{InstanceActions, LoadOptions};
pub use events::{ErrorMeta, ErrorTarget, EventKind, SelectionReason, StoreEvent};
pub use operations::{OperationKind, OperationTracker};
pub use selection::Selection;
pub use state::{LoadingFlags, LoadingTarget, Snapshot, StoreState};

type SyncAllFlight = Shared<BoxFuture<'static, Result<Outcome, StoreError>>>;

/// Reactive store for the instance grid.
///
/// Cheaply cloneable; all clones share the same container.
#[derive(Clone)]
pub struct InstanceStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: StoreConfig,
    adapter: Arc<dyn ServiceAdapter>,
    emitter: Arc<dyn Emitter<StoreEvent>>,
    state: watch::Sender<Snapshot>,
    event_tx: broadcast::Sender<StoreEvent>,
    /// Handlers registered through this store, detached on destroy.
    subscriptions: DashMap<SubscriptionId, EventKind>,
    /// The collection-wide sync currently in flight, if any.
    sync_all: Mutex<Option<SyncAllFlight>>,
    destroyed: AtomicBool,
}

impl InstanceStore {
    /// Store with the default in-process emitter and namespace.
    pub fn new(adapter: Arc<dyn ServiceAdapter>) -> Self {
        Self::with_emitter(
            adapter,
            Arc::new(ChannelEmitter::<StoreEvent>::new()),
            StoreConfig::default(),
        )
    }

    pub fn with_emitter(
        adapter: Arc<dyn ServiceAdapter>,
        emitter: Arc<dyn Emitter<StoreEvent>>,
        config: StoreConfig,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(StoreState::default()));
        let (event_tx, _) = broadcast::channel(config.event_buffer.max(1));
        debug!(namespace = %config.namespace, "instance store created");
        Self {
            inner: Arc::new(StoreInner {
                config,
                adapter,
                emitter,
                state,
                event_tx,
                subscriptions: DashMap::new(),
                sync_all: Mutex::new(None),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Apply `seed`, emit `updated`, and (unless disabled) load stats.
    ///
    /// Resolves with the snapshot taken after both steps. A failed stats
    /// load fails `init` too; the seed stays applied.
    pub async fn init(&self, seed: StoreSeed) -> Result<Snapshot, StoreError> {
        self.ensure_alive()?;
        let StoreSeed {
            filters,
            instances,
            selection,
            stats,
            fetch_stats,
        } = seed;

        let (selection_changed, snapshot) = self.update(|s| {
            if let Some(filters) = filters {
                s.filters = filters;
            }
            if let Some(stats) = stats {
                s.stats = stats;
            }
            if let Some(rows) = instances {
                s.replace_instances(rows.into_iter().filter_map(EntityInput::resolve).collect());
            }
            selection.is_some_and(|ids| {
                s.selection
                    .set(ids.iter().filter_map(EntityInput::id).collect::<Vec<_>>())
            })
        });
        info!(
            namespace = %self.namespace(),
            instances = snapshot.instances.len(),
            "store initialised"
        );
        self.emit(StoreEvent::Updated {
            state: Arc::clone(&snapshot),
        });
        if selection_changed {
            self.emit(StoreEvent::SelectionChanged {
                selected_ids: snapshot.selected_ids(),
                reason: SelectionReason::Seed,
                state: snapshot,
            });
        }

        if fetch_stats {
            self.actions().load_stats(LoadOptions::default()).await?;
        }
        Ok(self.get_state())
    }

    /// Tear the store down.
    ///
    /// Clears rows, available ids and selection, and detaches every
    /// handler registered through `subscribe`. Nothing is emitted, and
    /// every later action fails with `StoreError::Destroyed`.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.update(|s| {
            s.instances.clear();
            s.selection.reset();
        });
        let subs: Vec<(SubscriptionId, EventKind)> = self
            .inner
            .subscriptions
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        for (id, kind) in &subs {
            self.inner.emitter.off(*kind, *id);
        }
        self.inner.subscriptions.clear();
        info!(
            namespace = %self.namespace(),
            detached = subs.len(),
            "store destroyed"
        );
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    // ── Reading ──────────────────────────────────────────────────────

    /// Current snapshot.
    pub fn get_state(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    /// Snapshot stream, yielding after every mutation.
    pub fn watch_state(&self) -> StateStream {
        StateStream::new(self.inner.state.subscribe())
    }

    /// Every event emitted from now on, in order.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.inner.event_tx.subscribe())
    }

    pub fn namespace(&self) -> &str {
        &self.inner.config.namespace
    }

    /// Full channel name for `kind` (`instances:statsUpdated`).
    pub fn channel(&self, kind: EventKind) -> String {
        kind.channel(self.namespace())
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register `handler` for events of `kind`.
    ///
    /// On a destroyed store this returns an inert subscription and the
    /// handler is never called.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let channel = self.channel(kind);
        if self.is_destroyed() {
            return Subscription {
                kind,
                channel,
                id: None,
            };
        }
        let id = self.inner.emitter.on(kind, Arc::new(handler));
        self.inner.subscriptions.insert(id, kind);
        trace!(%channel, %id, "subscribed");
        Subscription {
            kind,
            channel,
            id: Some(id),
        }
    }

    /// Detach a handler. Returns `false` if it was already detached.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let Some(id) = subscription.id else {
            return false;
        };
        self.inner.subscriptions.remove(&id);
        self.inner.emitter.off(subscription.kind, id)
    }

    /// The action set.
    pub fn actions(&self) -> InstanceActions<'_> {
        InstanceActions::new(self)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_alive(&self) -> Result<(), StoreError> {
        if self.is_destroyed() {
            return Err(StoreError::Destroyed);
        }
        Ok(())
    }

    fn adapter(&self) -> &dyn ServiceAdapter {
        self.inner.adapter.as_ref()
    }

    fn sync_all_slot(&self) -> MutexGuard<'_, Option<SyncAllFlight>> {
        self.inner
            .sync_all
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the container copy-on-write and return the new snapshot.
    ///
    /// Snapshots already handed out keep pointing at the old value.
    fn update<R: Default>(&self, f: impl FnOnce(&mut StoreState) -> R) -> (R, Snapshot) {
        let mut out = R::default();
        let mut snapshot = None;
        self.inner.state.send_modify(|current| {
            out = f(Arc::make_mut(current));
            snapshot = Some(Arc::clone(current));
        });
        let snapshot = snapshot.unwrap_or_else(|| self.get_state());
        (out, snapshot)
    }

    /// Deliver an event to handlers and stream consumers.
    ///
    /// Silent once the store is destroyed.
    fn emit(&self, event: StoreEvent) {
        if self.is_destroyed() {
            return;
        }
        trace!(channel = %self.channel(event.kind()), "emit");
        let _ = self.inner.event_tx.send(event.clone());
        self.inner.emitter.emit(&event);
    }

    fn mark_operation(&self, kind: OperationKind, id: EntityId, in_progress: bool) {
        let ((), snapshot) = self.update(|s| {
            s.operations.mark(kind, id, in_progress);
        });
        self.emit_operations(snapshot);
    }

    fn set_collection_busy(&self, busy: bool) -> Snapshot {
        let ((), snapshot) = self.update(|s| {
            s.operations.set_collection_busy(busy);
        });
        snapshot
    }

    fn emit_operations(&self, snapshot: Snapshot) {
        self.emit(StoreEvent::Operation {
            operations: snapshot.operations.clone(),
            state: snapshot,
        });
    }

    fn set_loading(&self, target: LoadingTarget, loading: bool) {
        let ((), snapshot) = self.update(|s| {
            s.loading.set(target, loading);
        });
        self.emit(StoreEvent::Loading {
            state: snapshot,
            target,
            loading,
        });
    }

    /// Store an error, announce it, and hand it back for the caller.
    fn fail(&self, error: StoreError, meta: ErrorMeta) -> StoreError {
        warn!(
            namespace = %self.namespace(),
            target = %meta.target,
            instance_id = ?meta.instance_id,
            error = %error,
            "action failed"
        );
        let ((), snapshot) = self.update(|s| s.last_error = Some(error.clone()));
        self.emit(StoreEvent::Error {
            state: snapshot,
            error: error.clone(),
            meta,
        });
        error
    }

    fn clear_error(&self, f: impl FnOnce(&mut StoreState)) -> Snapshot {
        let ((), snapshot) = self.update(|s| {
            f(s);
            s.last_error = None;
        });
        snapshot
    }

    /// Enter the pending state for a tracked action.
    fn begin(&self, step: Settle) -> SettleGuard {
        match step {
            Settle::Operation(kind, id) => self.mark_operation(kind, id, true),
            Settle::Loading(target) => self.set_loading(target, true),
            Settle::CollectionWide | Settle::Nothing => {}
        }
        SettleGuard {
            store: self.clone(),
            step,
            armed: true,
        }
    }
}

impl std::fmt::Debug for InstanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceStore")
            .field("namespace", &self.inner.config.namespace)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

impl InstanceStore {
    /// Run remote work on the runtime so that dropping the caller's future
    /// does not cancel it; the settle step still runs when it completes.
    ///
    /// A task that panics or is cancelled is recorded under `meta` like
    /// any other failure.
    async fn detached<T, F>(&self, meta: ErrorMeta, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        match tokio::spawn(work).await {
            Ok(result) => result,
            Err(e) => Err(self.fail(
                StoreError::Internal(format!("store task failed: {e}")),
                meta,
            )),
        }
    }
}

// ── Settle step ──────────────────────────────────────────────────────

/// What a pending action must undo on settlement.
#[derive(Debug, Clone, Copy)]
enum Settle {
    Operation(OperationKind, EntityId),
    Loading(LoadingTarget),
    /// Clears the single-flight slot and the collection-wide flag.
    CollectionWide,
    Nothing,
}

/// Returns an action to idle exactly once: on `release()` or, failing
/// that, on drop (including unwinding out of a panicking adapter).
struct SettleGuard {
    store: InstanceStore,
    step: Settle,
    armed: bool,
}

impl SettleGuard {
    fn release(mut self) {
        self.settle();
    }

    fn settle(&mut self) {
        if !std::mem::replace(&mut self.armed, false) {
            return;
        }
        match self.step {
            Settle::Operation(kind, id) => self.store.mark_operation(kind, id, false),
            Settle::Loading(target) => self.store.set_loading(target, false),
            Settle::CollectionWide => {
                let snapshot = {
                    let mut slot = self.store.sync_all_slot();
                    *slot = None;
                    self.store.set_collection_busy(false)
                };
                self.store.emit_operations(snapshot);
            }
            Settle::Nothing => {}
        }
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.settle();
    }
}

// ── Seeds & subscriptions ────────────────────────────────────────────

/// Initial content for `InstanceStore::init`.
#[derive(Debug, Clone)]
pub struct StoreSeed {
    pub filters: Option<Filters>,
    pub instances: Option<Vec<EntityInput>>,
    pub selection: Option<Vec<EntityInput>>,
    pub stats: Option<InstanceStats>,
    /// Run `load_stats` before resolving. Defaults to `true`.
    pub fetch_stats: bool,
}

impl Default for StoreSeed {
    fn default() -> Self {
        Self {
            filters: None,
            instances: None,
            selection: None,
            stats: None,
            fetch_stats: true,
        }
    }
}

impl StoreSeed {
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn instances<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<EntityInput>,
    {
        self.instances = Some(rows.into_iter().map(Into::into).collect());
        self
    }

    pub fn selection<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<EntityInput>,
    {
        self.selection = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn stats(mut self, stats: InstanceStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn fetch_stats(mut self, fetch: bool) -> Self {
        self.fetch_stats = fetch;
        self
    }
}

/// Handle returned by `InstanceStore::subscribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    kind: EventKind,
    channel: String,
    id: Option<SubscriptionId>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// `false` for subscriptions made on a destroyed store.
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }
}
