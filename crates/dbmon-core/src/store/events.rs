// ── Store events ──
//
// One closed union of everything a store can announce. Every variant
// carries the snapshot taken right after the mutation that caused it.

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::emitter::Event;
use crate::error::StoreError;
use crate::model::{EntityId, Filters, InstanceStats, Outcome, UploadResult};

use super::operations::{OperationKind, OperationTracker};
use super::state::{LoadingTarget, Snapshot};

/// Channel kinds. The string form is the channel suffix
/// (`instances:batchDelete:success`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum EventKind {
    #[strum(serialize = "updated")]
    Updated,
    #[strum(serialize = "selectionChanged")]
    SelectionChanged,
    #[strum(serialize = "filtersUpdated")]
    FiltersUpdated,
    #[strum(serialize = "statsUpdated")]
    StatsUpdated,
    #[strum(serialize = "loading")]
    Loading,
    #[strum(serialize = "operation")]
    Operation,
    #[strum(serialize = "error")]
    Error,
    #[strum(serialize = "syncAccounts:success")]
    SyncAccountsSuccess,
    #[strum(serialize = "syncCapacity:success")]
    SyncCapacitySuccess,
    #[strum(serialize = "syncAll:success")]
    SyncAllSuccess,
    #[strum(serialize = "batchDelete:success")]
    BatchDeleteSuccess,
    #[strum(serialize = "batchCreate:success")]
    BatchCreateSuccess,
}

impl EventKind {
    /// Full channel name under `namespace`.
    pub fn channel(self, namespace: &str) -> String {
        format!("{namespace}:{self}")
    }
}

/// Why the selection changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionReason {
    AvailableChanged,
    Toggle,
    SelectAll,
    Clear,
    BatchDelete,
    Seed,
    Manual,
    Custom(String),
}

impl SelectionReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AvailableChanged => "availableChanged",
            Self::Toggle => "toggle",
            Self::SelectAll => "selectAll",
            Self::Clear => "clear",
            Self::BatchDelete => "batchDelete",
            Self::Seed => "seed",
            Self::Manual => "manual",
            Self::Custom(reason) => reason,
        }
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SelectionReason {
    fn from(reason: &str) -> Self {
        match reason {
            "availableChanged" => Self::AvailableChanged,
            "toggle" => Self::Toggle,
            "selectAll" => Self::SelectAll,
            "clear" => Self::Clear,
            "batchDelete" => Self::BatchDelete,
            "seed" => Self::Seed,
            "manual" => Self::Manual,
            other => Self::Custom(other.to_owned()),
        }
    }
}

/// Which action an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ErrorTarget {
    Stats,
    Instances,
    SyncAccounts,
    SyncCapacity,
    SyncAll,
    BatchDelete,
    BatchCreate,
}

impl From<OperationKind> for ErrorTarget {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::SyncAccounts => Self::SyncAccounts,
            OperationKind::SyncCapacity => Self::SyncCapacity,
        }
    }
}

/// Context attached to an error event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMeta {
    pub target: ErrorTarget,
    pub instance_id: Option<EntityId>,
    pub instance_ids: Vec<EntityId>,
}

impl ErrorMeta {
    pub fn new(target: ErrorTarget) -> Self {
        Self {
            target,
            instance_id: None,
            instance_ids: Vec::new(),
        }
    }

    pub fn with_instance(mut self, id: EntityId) -> Self {
        self.instance_id = Some(id);
        self
    }

    pub fn with_instances(mut self, ids: Vec<EntityId>) -> Self {
        self.instance_ids = ids;
        self
    }
}

/// Everything a store announces.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Updated {
        state: Snapshot,
    },
    SelectionChanged {
        state: Snapshot,
        selected_ids: Vec<EntityId>,
        reason: SelectionReason,
    },
    FiltersUpdated {
        state: Snapshot,
        filters: Filters,
    },
    StatsUpdated {
        state: Snapshot,
        stats: InstanceStats,
    },
    Loading {
        state: Snapshot,
        target: LoadingTarget,
        loading: bool,
    },
    Operation {
        state: Snapshot,
        operations: OperationTracker<OperationKind, EntityId>,
    },
    Error {
        state: Snapshot,
        error: StoreError,
        meta: ErrorMeta,
    },
    SyncAccountsSuccess {
        state: Snapshot,
        instance_id: EntityId,
        response: Outcome,
    },
    SyncCapacitySuccess {
        state: Snapshot,
        instance_id: EntityId,
        response: Outcome,
    },
    SyncAllSuccess {
        state: Snapshot,
        response: Outcome,
    },
    BatchDeleteSuccess {
        state: Snapshot,
        instance_ids: Vec<EntityId>,
        response: Outcome,
    },
    BatchCreateSuccess {
        state: Snapshot,
        result: UploadResult,
    },
}

impl StoreEvent {
    /// The snapshot carried by this event.
    pub fn state(&self) -> &Snapshot {
        match self {
            Self::Updated { state }
            | Self::SelectionChanged { state, .. }
            | Self::FiltersUpdated { state, .. }
            | Self::StatsUpdated { state, .. }
            | Self::Loading { state, .. }
            | Self::Operation { state, .. }
            | Self::Error { state, .. }
            | Self::SyncAccountsSuccess { state, .. }
            | Self::SyncCapacitySuccess { state, .. }
            | Self::SyncAllSuccess { state, .. }
            | Self::BatchDeleteSuccess { state, .. }
            | Self::BatchCreateSuccess { state, .. } => state,
        }
    }

    pub(crate) fn success(kind: OperationKind, state: Snapshot, id: EntityId, response: Outcome) -> Self {
        match kind {
            OperationKind::SyncAccounts => Self::SyncAccountsSuccess {
                state,
                instance_id: id,
                response,
            },
            OperationKind::SyncCapacity => Self::SyncCapacitySuccess {
                state,
                instance_id: id,
                response,
            },
        }
    }
}

impl Event for StoreEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            Self::Updated { .. } => EventKind::Updated,
            Self::SelectionChanged { .. } => EventKind::SelectionChanged,
            Self::FiltersUpdated { .. } => EventKind::FiltersUpdated,
            Self::StatsUpdated { .. } => EventKind::StatsUpdated,
            Self::Loading { .. } => EventKind::Loading,
            Self::Operation { .. } => EventKind::Operation,
            Self::Error { .. } => EventKind::Error,
            Self::SyncAccountsSuccess { .. } => EventKind::SyncAccountsSuccess,
            Self::SyncCapacitySuccess { .. } => EventKind::SyncCapacitySuccess,
            Self::SyncAllSuccess { .. } => EventKind::SyncAllSuccess,
            Self::BatchDeleteSuccess { .. } => EventKind::BatchDeleteSuccess,
            Self::BatchCreateSuccess { .. } => EventKind::BatchCreateSuccess,
        }
    }
}
