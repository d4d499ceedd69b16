//! Multi-Select State
//!
//! The set of tasks marked for a bulk action. Selection mode is not stored
//! separately: it is active exactly when the set is non-empty, so the two
//! can never disagree.

use std::collections::BTreeSet;

/// Selected task ids
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    /// Empty selection (selection mode off)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether selection mode is active
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.ids.is_empty()
    }

    /// Whether `id` is selected
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Add `id` if absent, remove it if present
    ///
    /// Removing the last id ends selection mode.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Start selection mode with exactly `id` selected
    pub fn enter(&mut self, id: &str) {
        self.ids.clear();
        self.ids.insert(id.to_string());
    }

    /// End selection mode
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
