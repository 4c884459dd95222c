//! Selection Tracker
//!
//! Ids marked for a bulk operation. Independent of filter and page, so
//! selections survive page navigation.

use std::collections::BTreeSet;

use crate::domain::Entity;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id; returns whether it is now selected
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Header checkbox. When every visible id is already selected the whole
    /// selection is cleared, otherwise the selection becomes exactly the
    /// visible ids.
    pub fn select_all<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let visible: BTreeSet<String> = visible.into_iter().map(str::to_string).collect();
        if self.is_all_selected(visible.iter().map(String::as_str)) {
            self.ids.clear();
        } else {
            self.ids = visible;
        }
    }

    /// True when there is at least one visible id and all of them are selected
    pub fn is_all_selected<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut any = false;
        for id in visible {
            if !self.ids.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn deselect(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Drop ids that no longer exist in the collection
    pub fn prune<T: Entity>(&mut self, items: &[T]) {
        let existing: BTreeSet<&str> = items.iter().map(Entity::id).collect();
        self.ids.retain(|id| existing.contains(id.as_str()));
    }

    /// Selected ids in collection order; ids missing from `items` are skipped
    pub fn ordered_ids<T: Entity>(&self, items: &[T]) -> Vec<String> {
        items
            .iter()
            .filter(|i| self.ids.contains(i.id()))
            .map(|i| i.id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
