#![allow(clippy::unwrap_used)]
// Integration tests for `InstanceStore` against a scripted adapter.
//
// The stub can hold every call on a semaphore so tests observe the store
// while a remote call is still unresolved, then release it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use dbmon_api::{ActionResponse, BatchCreateResponse};
use dbmon_core::{
    AdapterError, EntityId, ErrorTarget, EventKind, FilterValue, Filters, InstanceStats,
    InstanceStore, LoadOptions, OperationKind, SelectionReason, ServiceAdapter, StoreError,
    StoreEvent, StoreSeed, UploadPayload,
};

// ── Stub adapter ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct Script {
    /// `None` makes `fetch_statistics` fail.
    stats: Option<InstanceStats>,
    rows: Vec<Value>,
    outcome: ActionResponse,
    create: BatchCreateResponse,
    /// Mutating endpoints fail at the transport level.
    fail_remote: bool,
    /// Every call panics inside the adapter.
    panic: bool,
}

#[derive(Default)]
struct StubAdapter {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl StubAdapter {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            ..Self::default()
        })
    }

    fn gated(script: Script) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let stub = Arc::new(Self {
            script: Mutex::new(script),
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        });
        (stub, gate)
    }

    async fn enter(&self, call: String) -> Script {
        self.calls.lock().unwrap().push(call);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let script = self.script.lock().unwrap().clone();
        assert!(!script.panic, "adapter blew up");
        script
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

fn remote_error() -> AdapterError {
    dbmon_api::Error::Http {
        status: 502,
        message: "bad gateway".into(),
    }
}

fn outcome(script: &Script) -> Result<ActionResponse, AdapterError> {
    if script.fail_remote {
        Err(remote_error())
    } else {
        Ok(script.outcome.clone())
    }
}

#[async_trait]
impl ServiceAdapter for StubAdapter {
    async fn fetch_statistics(&self) -> Result<InstanceStats, AdapterError> {
        let script = self.enter("stats".into()).await;
        script.stats.ok_or_else(|| dbmon_api::Error::Http {
            status: 500,
            message: "statistics unavailable".into(),
        })
    }

    async fn fetch_instances(&self, filters: &Filters) -> Result<Vec<Value>, AdapterError> {
        let keys: Vec<&str> = filters.keys().map(String::as_str).collect();
        let script = self.enter(format!("instances:{}", keys.join(","))).await;
        Ok(script.rows)
    }

    async fn sync_instance_accounts(&self, id: EntityId) -> Result<ActionResponse, AdapterError> {
        let script = self.enter(format!("sync_accounts:{id}")).await;
        outcome(&script)
    }

    async fn sync_instance_capacity(&self, id: EntityId) -> Result<ActionResponse, AdapterError> {
        let script = self.enter(format!("sync_capacity:{id}")).await;
        outcome(&script)
    }

    async fn sync_all_accounts(&self) -> Result<ActionResponse, AdapterError> {
        let script = self.enter("sync_all".into()).await;
        outcome(&script)
    }

    async fn batch_delete_instances(
        &self,
        ids: &[EntityId],
    ) -> Result<ActionResponse, AdapterError> {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let script = self.enter(format!("delete:{}", ids.join(","))).await;
        outcome(&script)
    }

    async fn batch_create_instances(
        &self,
        payload: UploadPayload,
    ) -> Result<BatchCreateResponse, AdapterError> {
        let script = self.enter(format!("create:{}", payload.file_name)).await;
        if script.fail_remote {
            return Err(remote_error());
        }
        Ok(script.create)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn ok_outcome(message: &str) -> ActionResponse {
    ActionResponse {
        success: Some(true),
        message: Some(message.into()),
        data: None,
    }
}

fn ids(raw: &[i64]) -> Vec<EntityId> {
    raw.iter().copied().map(EntityId::new).collect()
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached in time");
}

fn drain(stream: &mut dbmon_core::EventStream) -> Vec<StoreEvent> {
    std::iter::from_fn(|| stream.try_recv()).collect()
}

fn kinds(events: &[StoreEvent]) -> Vec<EventKind> {
    use dbmon_core::Event;
    events.iter().map(Event::kind).collect()
}

// ── Selection ───────────────────────────────────────────────────────

#[tokio::test]
async fn shrinking_available_prunes_selection_and_announces_it() {
    let store = InstanceStore::new(StubAdapter::new(Script::default()));
    let actions = store.actions();
    actions.set_available_instances([1_i64, 2, 3]).unwrap();
    actions.set_selection([2_i64, 3], "manual").unwrap();

    let mut events = store.events();
    let snap = actions
        .set_available_instances([json!({ "id": 1 }), json!({ "id": 2 })])
        .unwrap();

    assert_eq!(snap.selected_ids(), ids(&[2]));
    assert_eq!(snap.available_ids(), ids(&[1, 2]));
    let events = drain(&mut events);
    let changed = events
        .iter()
        .find_map(|e| match e {
            StoreEvent::SelectionChanged {
                selected_ids,
                reason,
                ..
            } => Some((selected_ids.clone(), reason.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(changed, (ids(&[2]), SelectionReason::AvailableChanged));
}

#[tokio::test]
async fn selection_stays_within_available_ids() {
    let store = InstanceStore::new(StubAdapter::new(Script::default()));
    let actions = store.actions();
    let check = |store: &InstanceStore| {
        let s = store.get_state();
        assert!(s.selection.selected().is_subset(s.selection.available()));
    };

    actions.set_available_instances([1_i64, 2, 3, 4]).unwrap();
    check(&store);
    actions.select_all().unwrap();
    check(&store);
    actions.toggle_selection(9_i64).unwrap();
    check(&store);
    actions
        .set_available_instances([json!("3"), json!(4), json!(5), json!("x"), json!(null)])
        .unwrap();
    check(&store);
    actions.set_selection([1_i64, 5, 77], "manual").unwrap();
    check(&store);
    actions.toggle_selection(4_i64).unwrap();
    check(&store);

    assert_eq!(store.get_state().selected_ids(), ids(&[4, 5]));
}

#[tokio::test]
async fn set_selection_only_emits_on_change_but_toggle_always_does() {
    let store = InstanceStore::new(StubAdapter::new(Script::default()));
    let actions = store.actions();
    actions.set_available_instances([1_i64, 2]).unwrap();

    let mut events = store.events();
    actions.set_selection([1_i64], "manual").unwrap();
    actions.set_selection([1_i64, 1, 99], "manual").unwrap();
    actions.toggle_selection(2_i64).unwrap();
    actions.toggle_selection(2_i64).unwrap();
    actions.toggle_selection(42_i64).unwrap();

    let reasons: Vec<String> = drain(&mut events)
        .iter()
        .filter_map(|e| match e {
            StoreEvent::SelectionChanged { reason, .. } => Some(reason.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec!["manual", "toggle", "toggle"]);
}

// ── Operation tracking ──────────────────────────────────────────────

#[tokio::test]
async fn id_is_tracked_exactly_while_its_call_is_unresolved() {
    let (stub, gate) = StubAdapter::gated(Script {
        outcome: ok_outcome("synced"),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let id = EntityId::new(3);
    assert!(!store.get_state().operations.is_in_flight(OperationKind::SyncAccounts, id));

    let task = {
        let store = store.clone();
        tokio::spawn(async move { store.actions().sync_instance_accounts(3_i64).await })
    };
    wait_until(|| stub.count("sync_accounts") == 1).await;
    let state = store.get_state();
    assert!(state.operations.is_in_flight(OperationKind::SyncAccounts, id));
    assert!(!state.operations.is_in_flight(OperationKind::SyncCapacity, id));

    gate.add_permits(1);
    let response = task.await.unwrap().unwrap();
    assert_eq!(response.message.as_deref(), Some("synced"));
    assert!(store.get_state().operations.is_idle());
}

#[tokio::test]
async fn tracker_clears_and_error_is_announced_on_remote_failure() {
    let store = InstanceStore::new(StubAdapter::new(Script {
        fail_remote: true,
        ..Script::default()
    }));
    let mut events = store.events();

    let err = store.actions().sync_instance_capacity(8_i64).await.unwrap_err();
    assert!(matches!(err, StoreError::Remote { status: Some(502), .. }), "{err:?}");

    let state = store.get_state();
    assert!(state.operations.is_idle());
    assert_eq!(state.last_error, Some(err));

    let events = drain(&mut events);
    assert_eq!(
        kinds(&events),
        vec![EventKind::Operation, EventKind::Operation, EventKind::Error]
    );
    let Some(StoreEvent::Error { meta, .. }) = events.last() else {
        panic!("expected error event");
    };
    assert_eq!(meta.target, ErrorTarget::SyncCapacity);
    assert_eq!(meta.instance_id, Some(EntityId::new(8)));
}

#[tokio::test]
async fn explicit_failure_outcome_is_a_logic_error() {
    let store = InstanceStore::new(StubAdapter::new(Script {
        outcome: ActionResponse {
            success: Some(false),
            message: Some("credential expired".into()),
            data: None,
        },
        ..Script::default()
    }));

    let err = store.actions().sync_instance_accounts(4_i64).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Rejected {
            message: "credential expired".into()
        }
    );
    assert!(store.get_state().operations.is_idle());
}

#[tokio::test]
async fn successful_sync_emits_success_with_instance_id() {
    let store = InstanceStore::new(StubAdapter::new(Script {
        outcome: ok_outcome("12 accounts"),
        ..Script::default()
    }));
    let mut events = store.events();

    store.actions().sync_instance_accounts("12").await.unwrap();

    let events = drain(&mut events);
    let success = events
        .iter()
        .find_map(|e| match e {
            StoreEvent::SyncAccountsSuccess {
                instance_id,
                response,
                ..
            } => Some((*instance_id, response.message.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(success, (EntityId::new(12), Some("12 accounts".into())));
}

#[tokio::test]
async fn dropped_caller_still_settles() {
    let (stub, gate) = StubAdapter::gated(Script {
        outcome: ok_outcome("done"),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let mut events = store.events();

    let caller = {
        let store = store.clone();
        tokio::spawn(async move { store.actions().sync_instance_accounts(6_i64).await })
    };
    wait_until(|| stub.count("sync_accounts") == 1).await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    gate.add_permits(1);
    wait_until(|| store.get_state().operations.is_idle()).await;
    wait_until(|| {
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, StoreEvent::SyncAccountsSuccess { .. }))
    })
    .await;
}

// ── Single flight ───────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_sync_all_calls_share_one_request() {
    let (stub, gate) = StubAdapter::gated(Script {
        outcome: ok_outcome("synced 40 instances"),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let first = store.actions();
    let second = store.actions();

    let (a, b, ()) = tokio::join!(first.sync_all_accounts(), second.sync_all_accounts(), async {
        wait_until(|| stub.count("sync_all") == 1).await;
        assert!(store.get_state().operations.collection_busy());
        gate.add_permits(1);
    });

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a.message.as_deref(), Some("synced 40 instances"));
    assert_eq!(stub.count("sync_all"), 1);
    assert!(!store.get_state().operations.collection_busy());

    gate.add_permits(1);
    store.actions().sync_all_accounts().await.unwrap();
    assert_eq!(stub.count("sync_all"), 2);
}

#[tokio::test]
async fn sync_all_failure_reaches_every_caller() {
    let (stub, gate) = StubAdapter::gated(Script {
        fail_remote: true,
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let (first, second) = (store.actions(), store.actions());
    let mut events = store.events();

    let (a, b, ()) = tokio::join!(first.sync_all_accounts(), second.sync_all_accounts(), async {
        wait_until(|| stub.count("sync_all") == 1).await;
        gate.add_permits(1);
    });
    assert!(a.is_err());
    assert_eq!(a, b);

    let errors = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, StoreEvent::Error { .. }))
        .count();
    assert_eq!(errors, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sync_all_announces_busy_before_idle() {
    let store = InstanceStore::new(StubAdapter::new(Script {
        outcome: ok_outcome("synced"),
        ..Script::default()
    }));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(EventKind::Operation, move |e| {
        if let StoreEvent::Operation { operations, .. } = e {
            sink.lock().unwrap().push(operations.collection_busy());
        }
    });

    for round in 0..200 {
        seen.lock().unwrap().clear();
        store.actions().sync_all_accounts().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![true, false], "round {round}");
        assert!(!store.get_state().operations.collection_busy());
    }
}

#[tokio::test]
async fn sync_all_handler_may_call_back_into_the_store() {
    let (stub, gate) = StubAdapter::gated(Script {
        outcome: ok_outcome("synced"),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let joined = Arc::new(Mutex::new(Vec::new()));
    let handle = store.clone();
    let sink = Arc::clone(&joined);
    store.subscribe(EventKind::Operation, move |e| {
        let StoreEvent::Operation { operations, .. } = e else {
            return;
        };
        if operations.collection_busy() {
            let store = handle.clone();
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                let result = store.actions().sync_all_accounts().await;
                sink.lock().unwrap().push(result);
            });
        }
    });

    let actions = store.actions();
    let (leader, ()) = tokio::join!(actions.sync_all_accounts(), async {
        wait_until(|| stub.count("sync_all") == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.add_permits(1);
    });
    let leader = leader.unwrap();
    wait_until(|| joined.lock().unwrap().len() == 1).await;

    assert_eq!(joined.lock().unwrap()[0].as_ref().unwrap(), &leader);
    assert_eq!(stub.count("sync_all"), 1);
}

// ── Batch operations ────────────────────────────────────────────────

#[tokio::test]
async fn batch_delete_empties_selection_and_reports_ids() {
    let stub = StubAdapter::new(Script {
        outcome: ok_outcome("2 instances deleted"),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let actions = store.actions();
    actions.set_available_instances([4_i64, 5, 6]).unwrap();
    actions.set_selection([5_i64, 6], "manual").unwrap();
    let mut events = store.events();

    actions.batch_delete_selected().await.unwrap();

    assert!(store.get_state().selection.is_empty());
    assert_eq!(stub.calls(), vec!["delete:5,6".to_owned()]);
    let events = drain(&mut events);
    let deleted = events
        .iter()
        .find_map(|e| match e {
            StoreEvent::BatchDeleteSuccess { instance_ids, .. } => Some(instance_ids.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(deleted, ids(&[5, 6]));
    assert!(events.iter().any(|e| matches!(
        e,
        StoreEvent::SelectionChanged {
            reason: SelectionReason::BatchDelete,
            ..
        }
    )));
}

#[tokio::test]
async fn batch_delete_with_empty_selection_is_local() {
    let stub = StubAdapter::new(Script::default());
    let store = InstanceStore::new(stub.clone());
    let mut events = store.events();

    let err = store.actions().batch_delete_selected().await.unwrap_err();
    assert!(matches!(err, StoreError::Validation { .. }));
    assert!(stub.calls().is_empty());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn batch_create_stores_upload_result() {
    let stub = StubAdapter::new(Script {
        create: BatchCreateResponse {
            success: Some(true),
            message: Some("3 of 4 rows imported".into()),
            errors: vec!["row 4: duplicate name".into()],
            created_count: Some(3),
        },
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());

    let payload = UploadPayload::new("instances.csv", &b"name,db_type\nx,mysql\n"[..]);
    let result = store.actions().batch_create_instances(payload).await.unwrap();

    assert_eq!(result.errors, vec!["row 4: duplicate name".to_owned()]);
    let state = store.get_state();
    assert_eq!(state.upload_result.as_ref(), Some(&result));
    assert!(!state.loading.batch_create);
    assert_eq!(stub.calls(), vec!["create:instances.csv".to_owned()]);
}

#[tokio::test]
async fn empty_upload_never_reaches_adapter() {
    let stub = StubAdapter::new(Script::default());
    let store = InstanceStore::new(stub.clone());

    let err = store
        .actions()
        .batch_create_instances(UploadPayload::new("instances.csv", bytes::Bytes::new()))
        .await
        .unwrap_err();
    assert!(err.is_local());
    assert!(stub.calls().is_empty());
}

// ── Stats ───────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_stats_load_keeps_previous_counters() {
    let store = InstanceStore::new(StubAdapter::new(Script::default()));
    let seeded = InstanceStats {
        total_instances: 10,
        ..InstanceStats::default()
    };
    store
        .init(StoreSeed::default().stats(seeded).fetch_stats(false))
        .await
        .unwrap();
    let mut events = store.events();

    let err = store
        .actions()
        .load_stats(LoadOptions::default())
        .await
        .unwrap_err();

    let state = store.get_state();
    assert_eq!(state.stats.total_instances, 10);
    assert_eq!(state.last_error.as_ref(), Some(&err));
    assert!(!state.loading.stats);
    let events = drain(&mut events);
    let target = events
        .iter()
        .find_map(|e| match e {
            StoreEvent::Error { meta, .. } => Some(meta.target),
            _ => None,
        })
        .unwrap();
    assert_eq!(target, ErrorTarget::Stats);
}

#[tokio::test]
async fn stats_arriving_after_destroy_are_discarded() {
    let (stub, gate) = StubAdapter::gated(Script {
        stats: Some(InstanceStats {
            total_instances: 9,
            ..InstanceStats::default()
        }),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let pending = {
        let store = store.clone();
        tokio::spawn(async move { store.actions().load_stats(LoadOptions::default()).await })
    };
    wait_until(|| stub.count("stats") == 1).await;

    store.destroy();
    gate.add_permits(1);

    assert_eq!(pending.await.unwrap().unwrap_err(), StoreError::Destroyed);
    let state = store.get_state();
    assert_eq!(state.stats, InstanceStats::default());
    assert!(state.stats_updated_at.is_none());
    assert!(!state.loading.stats);
}

#[tokio::test]
async fn sync_result_arriving_after_destroy_is_discarded() {
    let (stub, gate) = StubAdapter::gated(Script {
        outcome: ok_outcome("done"),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let pending = {
        let store = store.clone();
        tokio::spawn(async move { store.actions().sync_instance_capacity(3_i64).await })
    };
    wait_until(|| stub.count("sync_capacity") == 1).await;

    store.destroy();
    gate.add_permits(1);

    assert_eq!(pending.await.unwrap().unwrap_err(), StoreError::Destroyed);
    assert!(store.get_state().operations.is_idle());
}

#[tokio::test]
async fn panicking_adapter_is_recorded_as_an_error() {
    let store = InstanceStore::new(StubAdapter::new(Script {
        panic: true,
        ..Script::default()
    }));
    let mut events = store.events();

    let err = store
        .actions()
        .sync_instance_accounts(8_i64)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Internal(_)));
    let state = store.get_state();
    assert_eq!(state.last_error.as_ref(), Some(&err));
    assert!(state.operations.is_idle());
    let meta = drain(&mut events)
        .into_iter()
        .find_map(|e| match e {
            StoreEvent::Error { meta, .. } => Some(meta),
            _ => None,
        })
        .unwrap();
    assert_eq!(meta.instance_id, Some(EntityId::new(8)));
}

#[tokio::test]
async fn panicking_sync_all_reaches_the_caller_as_an_error() {
    let store = InstanceStore::new(StubAdapter::new(Script {
        panic: true,
        ..Script::default()
    }));

    let err = store.actions().sync_all_accounts().await.unwrap_err();

    assert!(matches!(err, StoreError::Internal(_)));
    assert_eq!(store.get_state().last_error.as_ref(), Some(&err));
    assert!(!store.get_state().operations.collection_busy());
}

#[tokio::test]
async fn silent_stats_load_leaves_loading_flag_alone() {
    let stats = InstanceStats {
        total_instances: 4,
        active_instances: 3,
        ..InstanceStats::default()
    };
    let store = InstanceStore::new(StubAdapter::new(Script {
        stats: Some(stats.clone()),
        ..Script::default()
    }));
    let mut events = store.events();

    let loaded = store.actions().load_stats(LoadOptions::silent()).await.unwrap();
    assert_eq!(loaded, stats);
    assert!(store.get_state().stats_updated_at.is_some());
    assert_eq!(kinds(&drain(&mut events)), vec![EventKind::StatsUpdated]);
}

#[tokio::test]
async fn init_applies_seed_then_loads_stats() {
    let stub = StubAdapter::new(Script {
        stats: Some(InstanceStats {
            total_instances: 7,
            ..InstanceStats::default()
        }),
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());

    let snap = store
        .init(
            StoreSeed::default()
                .instances([json!({ "id": 1, "name": "a" }), json!({ "id": 2, "name": "b" })])
                .selection([2_i64, 3]),
        )
        .await
        .unwrap();

    assert_eq!(snap.stats.total_instances, 7);
    assert_eq!(snap.selected_ids(), ids(&[2]));
    assert_eq!(stub.calls(), vec!["stats".to_owned()]);
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn missing_id_never_reaches_adapter() {
    let stub = StubAdapter::new(Script::default());
    let store = InstanceStore::new(stub.clone());
    let mut events = store.events();

    let err = store
        .actions()
        .sync_instance_accounts(None::<i64>)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Validation { .. }), "{err:?}");
    assert!(stub.calls().is_empty());
    assert!(store.get_state().last_error.is_none());
    assert!(drain(&mut events).is_empty());
}

// ── Filters & rows ──────────────────────────────────────────────────

#[tokio::test]
async fn filters_are_local_and_forwarded_on_load() {
    let stub = StubAdapter::new(Script {
        rows: vec![
            json!({ "id": 11, "name": "orders-mysql" }),
            json!({ "id": "12", "name": "billing-pg" }),
            json!({ "name": "no id" }),
        ],
        ..Script::default()
    });
    let store = InstanceStore::new(stub.clone());
    let mut events = store.events();

    let mut filters = Filters::new();
    filters.insert("db_type".into(), FilterValue::from("mysql"));
    store.actions().apply_filters(filters).unwrap();
    assert!(stub.calls().is_empty());
    assert_eq!(kinds(&drain(&mut events)), vec![EventKind::FiltersUpdated]);

    let snap = store.actions().load_instances().await.unwrap();
    assert_eq!(stub.calls(), vec!["instances:db_type".to_owned()]);
    assert_eq!(snap.available_ids(), ids(&[11, 12]));
    assert_eq!(
        snap.instance(EntityId::new(12)).map(|e| e.name.as_str()),
        Some("billing-pg")
    );
}

// ── Snapshots & lifecycle ───────────────────────────────────────────

#[tokio::test]
async fn earlier_snapshots_do_not_change() {
    let store = InstanceStore::new(StubAdapter::new(Script::default()));
    store.actions().set_available_instances([1_i64, 2]).unwrap();
    let before = store.get_state();

    store.actions().select_all().unwrap();
    store.actions().set_available_instances([9_i64]).unwrap();

    assert!(before.selection.is_empty());
    assert_eq!(before.available_ids(), ids(&[1, 2]));
    assert_eq!(store.get_state().available_ids(), ids(&[9]));
}

#[tokio::test]
async fn subscribe_and_unsubscribe_handlers() {
    let store = InstanceStore::new(StubAdapter::new(Script::default()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = store.subscribe(EventKind::FiltersUpdated, move |event| {
        if let StoreEvent::FiltersUpdated { filters, .. } = event {
            sink.lock().unwrap().push(filters.len());
        }
    });
    assert_eq!(sub.channel(), "instances:filtersUpdated");

    let mut filters = Filters::new();
    filters.insert("status".into(), FilterValue::from("active"));
    store.actions().apply_filters(filters).unwrap();
    assert!(store.unsubscribe(&sub));
    assert!(!store.unsubscribe(&sub));
    store.actions().apply_filters(Filters::new()).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn destroyed_store_rejects_actions_and_detaches_handlers() {
    let stub = StubAdapter::new(Script::default());
    let store = InstanceStore::new(stub.clone());
    let hits = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&hits);
    store.subscribe(EventKind::Updated, move |_| *counter.lock().unwrap() += 1);
    store.actions().set_available_instances([1_i64]).unwrap();
    store.actions().select_all().unwrap();

    store.destroy();

    let state = store.get_state();
    assert!(state.instances.is_empty());
    assert!(state.selection.available().is_empty());
    assert!(state.selection.is_empty());
    assert_eq!(
        store.actions().sync_all_accounts().await.unwrap_err(),
        StoreError::Destroyed
    );
    assert_eq!(
        store.actions().set_available_instances([2_i64]).unwrap_err(),
        StoreError::Destroyed
    );
    assert!(!store.subscribe(EventKind::Updated, |_| {}).is_active());
    assert!(stub.calls().is_empty());
    assert_eq!(*hits.lock().unwrap(), 1);
}
