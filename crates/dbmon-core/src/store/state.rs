// ── State container ──
//
// The full record owned by one store. Subscribers only ever see it behind
// `Snapshot` (`Arc<StoreState>`): a snapshot is immutable, and the store
// mutates through `Arc::make_mut`, so a snapshot handed out earlier is
// never touched by a later action.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::StoreError;
use crate::model::{EntityId, EntityRef, Filters, InstanceStats, UploadResult};

use super::operations::{OperationKind, OperationTracker};
use super::selection::Selection;

/// Immutable view of the state container.
pub type Snapshot = Arc<StoreState>;

/// Collection-level operations with a loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, IntoStaticStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum LoadingTarget {
    Stats,
    Instances,
    BatchDelete,
    BatchCreate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct LoadingFlags {
    pub stats: bool,
    pub instances: bool,
    pub batch_delete: bool,
    pub batch_create: bool,
}

impl LoadingFlags {
    pub fn get(&self, target: LoadingTarget) -> bool {
        match target {
            LoadingTarget::Stats => self.stats,
            LoadingTarget::Instances => self.instances,
            LoadingTarget::BatchDelete => self.batch_delete,
            LoadingTarget::BatchCreate => self.batch_create,
        }
    }

    /// Returns `true` if the flag changed.
    pub fn set(&mut self, target: LoadingTarget, loading: bool) -> bool {
        let flag = match target {
            LoadingTarget::Stats => &mut self.stats,
            LoadingTarget::Instances => &mut self.instances,
            LoadingTarget::BatchDelete => &mut self.batch_delete,
            LoadingTarget::BatchCreate => &mut self.batch_create,
        };
        let changed = *flag != loading;
        *flag = loading;
        changed
    }

    pub fn any(&self) -> bool {
        self.stats || self.instances || self.batch_delete || self.batch_create
    }
}

/// Everything one instance store knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub filters: Filters,
    /// Ordered rows; the source of truth for what can be selected.
    pub instances: Vec<EntityRef>,
    /// Available ids (kept in lockstep with `instances`) and the selection.
    pub selection: Selection<EntityId>,
    pub stats: InstanceStats,
    /// When `stats` was last replaced by a successful fetch.
    pub stats_updated_at: Option<DateTime<Utc>>,
    pub loading: LoadingFlags,
    pub operations: OperationTracker<OperationKind, EntityId>,
    pub upload_result: Option<UploadResult>,
    pub last_error: Option<StoreError>,
}

impl StoreState {
    pub fn available_ids(&self) -> Vec<EntityId> {
        self.selection.available().iter().copied().collect()
    }

    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.selection.selected_ids()
    }

    pub fn instance(&self, id: EntityId) -> Option<&EntityRef> {
        self.instances.iter().find(|e| e.id == id)
    }

    /// Replace the rows, collapsing duplicate ids (first occurrence wins).
    ///
    /// Returns `true` if the selection was pruned as a result.
    pub(crate) fn replace_instances(&mut self, rows: Vec<EntityRef>) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        self.instances = rows.into_iter().filter(|e| seen.insert(e.id)).collect();
        self.selection.set_available(seen)
    }
}
