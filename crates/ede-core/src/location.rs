use crate::query::{ListSchema, QueryState};

/// Keeps the shareable location of a list view in step with its Query State.
///
/// Only real changes produce a new location, so repeated syncs of the same
/// state never add history entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UrlSync {
    current: String,
}

impl UrlSync {
    pub fn new(initial: &str) -> Self {
        Self {
            current: initial.trim_start_matches('?').to_string(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Returns the new query string when it differs from the last one written
    pub fn sync(&mut self, query: &QueryState, schema: &ListSchema) -> Option<String> {
        let next = query.to_query_string(schema);
        if next == self.current {
            return None;
        }
        self.current = next.clone();
        Some(next)
    }

    /// `view?query`, or just `view` for a default state
    pub fn link(&self, view: &str) -> String {
        if self.current.is_empty() {
            view.to_string()
        } else {
            format!("{view}?{}", self.current)
        }
    }
}
