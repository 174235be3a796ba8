// ── Action set ──
//
// The only sanctioned writers of store state. Remote-backed actions share
// one shape:
//
//   validate → begin (tracker / loading flag set, event) → spawn adapter
//   call → release settle guard → commit result or record error → emit
//
// A result that arrives after `destroy()` is discarded and the caller gets
// `StoreError::Destroyed`.
//
// Validation failures return before `begin`, so they never touch
// `last_error`, the tracker, or the emitter.

use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::convert::upload_result;
use crate::error::{StoreError, ensure_success};
use crate::model::{EntityId, EntityInput, EntityRef, Filters, InstanceStats, Outcome};
use crate::model::{UploadPayload, UploadResult};

use super::events::{ErrorMeta, ErrorTarget, SelectionReason, StoreEvent};
use super::operations::OperationKind;
use super::state::{LoadingTarget, Snapshot};
use super::{InstanceStore, Settle};

/// Options for `load_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Leave the loading flag alone (background polling).
    pub silent: bool,
}

impl LoadOptions {
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

/// Mutators for an `InstanceStore`, borrowed from `InstanceStore::actions`.
#[derive(Debug, Clone, Copy)]
pub struct InstanceActions<'a> {
    store: &'a InstanceStore,
}

impl<'a> InstanceActions<'a> {
    pub(super) fn new(store: &'a InstanceStore) -> Self {
        Self { store }
    }

    // ── Remote-backed ────────────────────────────────────────────────

    /// Fetch aggregate counters and replace `stats`.
    ///
    /// A failed fetch leaves the previous counters in place.
    pub async fn load_stats(&self, options: LoadOptions) -> Result<InstanceStats, StoreError> {
        self.store.ensure_alive()?;
        let step = if options.silent {
            Settle::Nothing
        } else {
            Settle::Loading(LoadingTarget::Stats)
        };
        let meta = ErrorMeta::new(ErrorTarget::Stats);
        let guard = self.store.begin(step);
        let store = self.store.clone();

        self.store
            .detached(meta.clone(), async move {
                let result = store.adapter().fetch_statistics().await;
                guard.release();
                match result {
                    Ok(stats) => {
                        store.ensure_alive()?;
                        let snapshot = store.clear_error(|s| {
                            s.stats = stats;
                            s.stats_updated_at = Some(Utc::now());
                        });
                        let stats = snapshot.stats.clone();
                        debug!(total = stats.total_instances, "stats updated");
                        store.emit(StoreEvent::StatsUpdated {
                            state: snapshot,
                            stats: stats.clone(),
                        });
                        Ok(stats)
                    }
                    Err(e) => Err(store.fail(e.into(), meta)),
                }
            })
            .await
    }

    /// Fetch rows for the current filters and make them the available set.
    pub async fn load_instances(&self) -> Result<Snapshot, StoreError> {
        self.store.ensure_alive()?;
        let filters = self.store.get_state().filters.clone();
        let meta = ErrorMeta::new(ErrorTarget::Instances);
        let guard = self.store.begin(Settle::Loading(LoadingTarget::Instances));
        let store = self.store.clone();

        self.store
            .detached(meta.clone(), async move {
                let result = store.adapter().fetch_instances(&filters).await;
                guard.release();
                match result {
                    Ok(rows) => {
                        store.ensure_alive()?;
                        let rows: Vec<EntityRef> =
                            rows.iter().filter_map(EntityRef::from_value).collect();
                        store.clear_error(|_| {});
                        Ok(store.replace_available(rows))
                    }
                    Err(e) => Err(store.fail(e.into(), meta)),
                }
            })
            .await
    }

    /// Trigger an account sync for one instance.
    pub async fn sync_instance_accounts(
        &self,
        instance: impl Into<EntityInput>,
    ) -> Result<Outcome, StoreError> {
        self.sync_instance(OperationKind::SyncAccounts, instance.into())
            .await
    }

    /// Trigger a capacity collection for one instance.
    pub async fn sync_instance_capacity(
        &self,
        instance: impl Into<EntityInput>,
    ) -> Result<Outcome, StoreError> {
        self.sync_instance(OperationKind::SyncCapacity, instance.into())
            .await
    }

    async fn sync_instance(
        &self,
        kind: OperationKind,
        instance: EntityInput,
    ) -> Result<Outcome, StoreError> {
        self.store.ensure_alive()?;
        let id = instance
            .id()
            .ok_or_else(|| StoreError::validation("an instance id is required"))?;
        let meta = ErrorMeta::new(kind.into()).with_instance(id);
        let guard = self.store.begin(Settle::Operation(kind, id));
        let store = self.store.clone();
        debug!(%kind, instance_id = %id, "sync started");

        self.store
            .detached(meta.clone(), async move {
                let result = match kind {
                    OperationKind::SyncAccounts => store.adapter().sync_instance_accounts(id).await,
                    OperationKind::SyncCapacity => store.adapter().sync_instance_capacity(id).await,
                };
                guard.release();
                match accept(result, "sync failed") {
                    Ok(response) => {
                        store.ensure_alive()?;
                        let snapshot = store.clear_error(|_| {});
                        info!(%kind, instance_id = %id, "sync finished");
                        store.emit(StoreEvent::success(kind, snapshot, id, response.clone()));
                        Ok(response)
                    }
                    Err(e) => Err(store.fail(e, meta)),
                }
            })
            .await
    }

    /// Sync accounts across every instance.
    ///
    /// Single-flight: while one call is outstanding, further calls join it
    /// instead of reaching the adapter, and all callers receive the same
    /// result.
    pub async fn sync_all_accounts(&self) -> Result<Outcome, StoreError> {
        self.store.ensure_alive()?;
        let (flight, leader) = {
            let mut slot = self.store.sync_all_slot();
            if let Some(flight) = slot.as_ref() {
                debug!("joining in-flight sync-all");
                (flight.clone(), None)
            } else {
                let (reply, result) = oneshot::channel();
                let flight = async move {
                    result.await.unwrap_or_else(|_| {
                        Err(StoreError::Internal("sync-all ended without a result".into()))
                    })
                }
                .boxed()
                .shared();
                *slot = Some(flight.clone());
                (flight, Some((reply, self.store.set_collection_busy(true))))
            }
        };
        // Announce busy before the remote call can start, outside the slot
        // lock so handlers may call back into the store.
        if let Some((reply, snapshot)) = leader {
            self.store.emit_operations(snapshot);
            self.start_sync_all(reply);
        }
        flight.await
    }

    /// Spawn the remote call for a reserved sync-all slot and deliver its
    /// result to `reply`.
    fn start_sync_all(&self, reply: oneshot::Sender<Result<Outcome, StoreError>>) {
        let guard = self.store.begin(Settle::CollectionWide);
        let store = self.store.clone();
        info!("sync-all started");

        tokio::spawn(async move {
            let meta = ErrorMeta::new(ErrorTarget::SyncAll);
            let worker = store.clone();
            let failure = meta.clone();
            let work = async move {
                let result = worker.adapter().sync_all_accounts().await;
                guard.release();
                match accept(result, "sync-all failed") {
                    Ok(response) => {
                        worker.ensure_alive()?;
                        let snapshot = worker.clear_error(|_| {});
                        info!("sync-all finished");
                        worker.emit(StoreEvent::SyncAllSuccess {
                            state: snapshot,
                            response: response.clone(),
                        });
                        Ok(response)
                    }
                    Err(e) => Err(worker.fail(e, failure)),
                }
            };
            let _ = reply.send(store.detached(meta, work).await);
        });
    }

    /// Delete every selected instance.
    ///
    /// Fails locally when nothing is selected. On success the selection
    /// is emptied.
    pub async fn batch_delete_selected(&self) -> Result<Outcome, StoreError> {
        self.store.ensure_alive()?;
        let ids = self.store.get_state().selected_ids();
        if ids.is_empty() {
            return Err(StoreError::validation("no instances selected"));
        }
        let meta = ErrorMeta::new(ErrorTarget::BatchDelete).with_instances(ids.clone());
        let guard = self.store.begin(Settle::Loading(LoadingTarget::BatchDelete));
        let store = self.store.clone();
        info!(count = ids.len(), "batch delete started");

        self.store
            .detached(meta.clone(), async move {
                let result = store.adapter().batch_delete_instances(&ids).await;
                guard.release();
                match accept(result, "batch delete failed") {
                    Ok(response) => {
                        store.ensure_alive()?;
                        let snapshot = store.clear_error(|s| {
                            s.selection.clear();
                        });
                        store.emit(StoreEvent::SelectionChanged {
                            state: Arc::clone(&snapshot),
                            selected_ids: Vec::new(),
                            reason: SelectionReason::BatchDelete,
                        });
                        store.emit(StoreEvent::BatchDeleteSuccess {
                            state: snapshot,
                            instance_ids: ids,
                            response: response.clone(),
                        });
                        Ok(response)
                    }
                    Err(e) => Err(store.fail(e, meta)),
                }
            })
            .await
    }

    /// Upload instance definitions for bulk creation.
    pub async fn batch_create_instances(
        &self,
        payload: UploadPayload,
    ) -> Result<UploadResult, StoreError> {
        self.store.ensure_alive()?;
        payload.validate()?;
        let meta = ErrorMeta::new(ErrorTarget::BatchCreate);
        let guard = self.store.begin(Settle::Loading(LoadingTarget::BatchCreate));
        let store = self.store.clone();
        info!(file = %payload.file_name, bytes = payload.content.len(), "batch create started");

        self.store
            .detached(meta.clone(), async move {
                let result = store.adapter().batch_create_instances(payload).await;
                guard.release();
                let response = result.map_err(StoreError::from).and_then(|resp| {
                    ensure_success(resp.success, resp.message.as_deref(), "batch create failed")?;
                    Ok(resp)
                });
                match response {
                    Ok(response) => {
                        store.ensure_alive()?;
                        let result = upload_result(response);
                        let snapshot =
                            store.clear_error(|s| s.upload_result = Some(result.clone()));
                        store.emit(StoreEvent::BatchCreateSuccess {
                            state: snapshot,
                            result: result.clone(),
                        });
                        Ok(result)
                    }
                    Err(e) => Err(store.fail(e, meta)),
                }
            })
            .await
    }

    // ── Local ────────────────────────────────────────────────────────

    /// Replace the filter set. Never touches the network.
    pub fn apply_filters(&self, filters: Filters) -> Result<Snapshot, StoreError> {
        self.store.ensure_alive()?;
        let ((), snapshot) = self.store.update(|s| s.filters = filters);
        self.store.emit(StoreEvent::FiltersUpdated {
            filters: snapshot.filters.clone(),
            state: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }

    /// Replace the rows from raw ids, references, or backend rows.
    ///
    /// Entries without a usable id are dropped. The selection is pruned
    /// against the new ids.
    pub fn set_available_instances<I>(&self, items: I) -> Result<Snapshot, StoreError>
    where
        I: IntoIterator,
        I::Item: Into<EntityInput>,
    {
        self.store.ensure_alive()?;
        let rows = items
            .into_iter()
            .filter_map(|item| item.into().resolve())
            .collect();
        Ok(self.store.replace_available(rows))
    }

    /// Select exactly `ids ∩ available`.
    pub fn set_selection<I>(
        &self,
        ids: I,
        reason: impl Into<SelectionReason>,
    ) -> Result<Snapshot, StoreError>
    where
        I: IntoIterator,
        I::Item: Into<EntityInput>,
    {
        self.store.ensure_alive()?;
        let ids: Vec<EntityId> = ids
            .into_iter()
            .filter_map(|item| item.into().id())
            .collect();
        Ok(self.store.apply_selection(reason.into(), |s| s.set(ids)))
    }

    /// Flip one id. Unavailable or unusable ids are ignored.
    pub fn toggle_selection(&self, instance: impl Into<EntityInput>) -> Result<Snapshot, StoreError> {
        self.store.ensure_alive()?;
        let Some(id) = instance.into().id() else {
            return Ok(self.store.get_state());
        };
        Ok(self
            .store
            .apply_selection(SelectionReason::Toggle, |s| s.toggle(id).is_some()))
    }

    pub fn select_all(&self) -> Result<Snapshot, StoreError> {
        self.store.ensure_alive()?;
        Ok(self
            .store
            .apply_selection(SelectionReason::SelectAll, super::Selection::select_all))
    }

    pub fn clear_selection(&self) -> Result<Snapshot, StoreError> {
        self.store.ensure_alive()?;
        Ok(self
            .store
            .apply_selection(SelectionReason::Clear, super::Selection::clear))
    }
}

/// An adapter outcome with an explicit `success: false` is a failure.
fn accept(
    result: Result<Outcome, crate::adapter::AdapterError>,
    fallback: &str,
) -> Result<Outcome, StoreError> {
    let response = result?;
    ensure_success(response.success, response.message.as_deref(), fallback)?;
    Ok(response)
}

impl InstanceStore {
    /// Swap in new rows, emit `updated`, and announce any pruning.
    fn replace_available(&self, rows: Vec<EntityRef>) -> Snapshot {
        let (pruned, snapshot) = self.update(|s| s.replace_instances(rows));
        debug!(
            instances = snapshot.instances.len(),
            pruned, "available instances replaced"
        );
        self.emit(StoreEvent::Updated {
            state: Arc::clone(&snapshot),
        });
        if pruned {
            self.emit(StoreEvent::SelectionChanged {
                selected_ids: snapshot.selected_ids(),
                reason: SelectionReason::AvailableChanged,
                state: Arc::clone(&snapshot),
            });
        }
        snapshot
    }

    /// Run a selection mutation and emit if it reports a change.
    fn apply_selection(
        &self,
        reason: SelectionReason,
        f: impl FnOnce(&mut super::Selection<EntityId>) -> bool,
    ) -> Snapshot {
        let (changed, snapshot) = self.update(|s| f(&mut s.selection));
        if changed {
            self.emit(StoreEvent::SelectionChanged {
                selected_ids: snapshot.selected_ids(),
                reason,
                state: Arc::clone(&snapshot),
            });
        }
        snapshot
    }
}
