//! Selection model: which entities the local user has selected.
//!
//! Selection is client-local and never persisted. It is held in a normalized
//! form: `Empty`, `Single`, or `Many` with two or more ids. Every mutator
//! re-normalizes, so a toggle that leaves one id behind collapses back to
//! `Single` and a set of one is never stored.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::BTreeSet;

use crate::doc::EntityId;

/// Current selection. Ids may refer to notes, connectors, or strokes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Empty,
    Single(EntityId),
    /// Always holds at least two ids.
    Many(BTreeSet<EntityId>),
}

impl Selection {
    fn normalized(mut ids: BTreeSet<EntityId>) -> Self {
        match ids.len() {
            0 => Self::Empty,
            1 => ids.pop_first().map_or(Self::Empty, Self::Single),
            _ => Self::Many(ids),
        }
    }

    /// Replace the selection with a single id.
    pub fn select(&mut self, id: EntityId) {
        *self = Self::Single(id);
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: EntityId) {
        let mut ids = self.to_set();
        if !ids.remove(&id) {
            ids.insert(id);
        }
        *self = Self::normalized(ids);
    }

    /// Replace the selection with `ids`.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        *self = Self::normalized(ids.into_iter().collect());
    }

    pub fn clear(&mut self) {
        *self = Self::Empty;
    }

    /// Drop `id` from the selection if present. Returns true if it was selected.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        let mut ids = self.to_set();
        let removed = ids.remove(id);
        if removed {
            *self = Self::normalized(ids);
        }
        removed
    }

    /// Keep only ids for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&EntityId) -> bool) {
        let mut ids = self.to_set();
        let before = ids.len();
        ids.retain(|id| keep(id));
        if ids.len() != before {
            *self = Self::normalized(ids);
        }
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        match self {
            Self::Empty => false,
            Self::Single(single) => single == id,
            Self::Many(ids) => ids.contains(id),
        }
    }

    /// The id when exactly one entity is selected.
    #[must_use]
    pub fn single(&self) -> Option<EntityId> {
        match self {
            Self::Single(id) => Some(*id),
            _ => None,
        }
    }

    /// Selected ids in stable order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.to_set().into_iter().collect()
    }

    fn to_set(&self) -> BTreeSet<EntityId> {
        match self {
            Self::Empty => BTreeSet::new(),
            Self::Single(id) => BTreeSet::from([*id]),
            Self::Many(ids) => ids.clone(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(ids) => ids.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
