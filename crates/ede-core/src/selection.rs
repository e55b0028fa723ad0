use std::collections::BTreeSet;

use ede_types::RecordId;

/// Record ids chosen for a bulk action
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RecordId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id, returning whether it is now selected
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Select exactly the loaded page, or clear when it already is.
    ///
    /// Never reaches beyond the records currently loaded.
    pub fn toggle_all(&mut self, loaded: &[RecordId]) {
        let loaded: BTreeSet<RecordId> = loaded.iter().cloned().collect();
        if loaded.is_empty() || self.ids == loaded {
            self.ids.clear();
        } else {
            self.ids = loaded;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.ids.iter().cloned().collect()
    }
}
