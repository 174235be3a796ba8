// ── Operation tracker ──
//
// Per-kind sets of ids with an unresolved remote call, plus one flag for
// the collection-wide operation. The tracker only records; exclusion for
// the collection-wide operation is enforced by the store.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

/// Per-entity operation kinds tracked by the instance store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OperationKind {
    SyncAccounts,
    SyncCapacity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTracker<K: Ord + Copy, Id: Ord + Copy> {
    in_flight: BTreeMap<K, BTreeSet<Id>>,
    collection_busy: bool,
}

impl<K: Ord + Copy, Id: Ord + Copy> Default for OperationTracker<K, Id> {
    fn default() -> Self {
        Self {
            in_flight: BTreeMap::new(),
            collection_busy: false,
        }
    }
}

impl<K: Ord + Copy, Id: Ord + Copy> OperationTracker<K, Id> {
    /// Add or remove `id` from the in-flight set of `kind`.
    ///
    /// Returns `true` if membership changed. Re-adding an id that is
    /// already in flight is a no-op.
    pub fn mark(&mut self, kind: K, id: Id, in_progress: bool) -> bool {
        if in_progress {
            return self.in_flight.entry(kind).or_default().insert(id);
        }
        let Some(ids) = self.in_flight.get_mut(&kind) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            self.in_flight.remove(&kind);
        }
        removed
    }

    pub fn is_in_flight(&self, kind: K, id: Id) -> bool {
        self.in_flight.get(&kind).is_some_and(|ids| ids.contains(&id))
    }

    /// Ids of `kind` currently in flight, ascending.
    pub fn in_flight(&self, kind: K) -> Vec<Id> {
        self.in_flight
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn collection_busy(&self) -> bool {
        self.collection_busy
    }

    pub fn set_collection_busy(&mut self, busy: bool) -> bool {
        let changed = self.collection_busy != busy;
        self.collection_busy = busy;
        changed
    }

    /// No per-id call and no collection-wide call outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && !self.collection_busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_clear() {
        let mut t = OperationTracker::<OperationKind, i64>::default();
        assert!(t.mark(OperationKind::SyncAccounts, 3, true));
        assert!(!t.mark(OperationKind::SyncAccounts, 3, true));
        assert!(t.is_in_flight(OperationKind::SyncAccounts, 3));
        assert!(!t.is_in_flight(OperationKind::SyncCapacity, 3));

        assert!(t.mark(OperationKind::SyncAccounts, 3, false));
        assert!(!t.mark(OperationKind::SyncAccounts, 3, false));
        assert!(t.is_idle());
    }

    #[test]
    fn kinds_are_independent() {
        let mut t = OperationTracker::<OperationKind, i64>::default();
        t.mark(OperationKind::SyncAccounts, 1, true);
        t.mark(OperationKind::SyncCapacity, 1, true);
        t.mark(OperationKind::SyncCapacity, 2, true);
        t.mark(OperationKind::SyncCapacity, 1, false);

        assert_eq!(t.in_flight(OperationKind::SyncAccounts), vec![1]);
        assert_eq!(t.in_flight(OperationKind::SyncCapacity), vec![2]);
    }

    #[test]
    fn collection_flag_counts_towards_idle() {
        let mut t = OperationTracker::<OperationKind, i64>::default();
        assert!(t.set_collection_busy(true));
        assert!(!t.set_collection_busy(true));
        assert!(!t.is_idle());
        t.set_collection_busy(false);
        assert!(t.is_idle());
    }

    #[test]
    fn kind_names_are_camel_case() {
        assert_eq!(OperationKind::SyncAccounts.to_string(), "syncAccounts");
        let name: &'static str = OperationKind::SyncCapacity.into();
        assert_eq!(name, "syncCapacity");
    }
}
