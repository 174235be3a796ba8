// ── Selection manager ──
//
// Keeps the user's selection a subset of the ids that are currently
// available. Every mutator reports whether the selected set actually
// changed so the caller knows whether to emit.

use std::collections::BTreeSet;

/// Available ids plus the chosen subset.
///
/// Fields are private: the only way to change either set is through the
/// methods below, each of which re-establishes `selected ⊆ available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<Id: Ord + Copy> {
    available: BTreeSet<Id>,
    selected: BTreeSet<Id>,
}

impl<Id: Ord + Copy> Default for Selection<Id> {
    fn default() -> Self {
        Self {
            available: BTreeSet::new(),
            selected: BTreeSet::new(),
        }
    }
}

impl<Id: Ord + Copy> Selection<Id> {
    pub fn available(&self) -> &BTreeSet<Id> {
        &self.available
    }

    pub fn selected(&self) -> &BTreeSet<Id> {
        &self.selected
    }

    /// Selected ids in ascending order.
    pub fn selected_ids(&self) -> Vec<Id> {
        self.selected.iter().copied().collect()
    }

    pub fn is_selected(&self, id: Id) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_available(&self, id: Id) -> bool {
        self.available.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Replace the available set and prune the selection against it.
    ///
    /// Returns `true` if pruning removed anything from the selection.
    pub fn set_available(&mut self, ids: impl IntoIterator<Item = Id>) -> bool {
        self.available = ids.into_iter().collect();
        self.prune()
    }

    /// Drop selected ids that are no longer available.
    pub fn prune(&mut self) -> bool {
        let before = self.selected.len();
        let available = &self.available;
        self.selected.retain(|id| available.contains(id));
        before != self.selected.len()
    }

    /// Replace the selection with `ids ∩ available`.
    pub fn set(&mut self, ids: impl IntoIterator<Item = Id>) -> bool {
        let next: BTreeSet<Id> = ids
            .into_iter()
            .filter(|id| self.available.contains(id))
            .collect();
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    /// Flip membership of an available id.
    ///
    /// Returns the new membership, or `None` if `id` is not available.
    pub fn toggle(&mut self, id: Id) -> Option<bool> {
        if !self.available.contains(&id) {
            return None;
        }
        if self.selected.remove(&id) {
            Some(false)
        } else {
            self.selected.insert(id);
            Some(true)
        }
    }

    pub fn select_all(&mut self) -> bool {
        let all: Vec<Id> = self.available.iter().copied().collect();
        self.set(all)
    }

    pub fn clear(&mut self) -> bool {
        self.set(std::iter::empty())
    }

    /// Forget both sets.
    pub(crate) fn reset(&mut self) {
        self.available.clear();
        self.selected.clear();
    }
}
