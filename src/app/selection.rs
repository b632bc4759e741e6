//! Multi-selection of aggregate keys and messages.

use std::collections::BTreeSet;

use crate::query::Dimension;

/// Selected aggregate keys (scoped to one dimension) and message ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    aggregate_keys: BTreeSet<String>,
    /// Dimension the aggregate keys belong to
    aggregate_dimension: Dimension,
    message_ids: BTreeSet<i64>,
}

impl SelectionTracker {
    pub fn aggregate_keys(&self) -> &BTreeSet<String> {
        &self.aggregate_keys
    }

    pub fn aggregate_dimension(&self) -> Dimension {
        self.aggregate_dimension
    }

    pub fn message_ids(&self) -> &BTreeSet<i64> {
        &self.message_ids
    }

    pub fn is_empty(&self) -> bool {
        self.aggregate_keys.is_empty() && self.message_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aggregate_keys.len() + self.message_ids.len()
    }

    pub fn is_key_selected(&self, dimension: Dimension, key: &str) -> bool {
        self.aggregate_dimension == dimension && self.aggregate_keys.contains(key)
    }

    pub fn is_message_selected(&self, id: i64) -> bool {
        self.message_ids.contains(&id)
    }

    /// Drop aggregate keys recorded under a different dimension
    pub fn clear_if_stale(&mut self, dimension: Dimension) {
        if self.aggregate_dimension != dimension {
            if !self.aggregate_keys.is_empty() {
                tracing::debug!(
                    "Dropping {} stale {} selections",
                    self.aggregate_keys.len(),
                    self.aggregate_dimension
                );
            }
            self.aggregate_keys.clear();
            self.aggregate_dimension = dimension;
        }
    }

    pub fn toggle_key(&mut self, dimension: Dimension, key: &str) {
        self.clear_if_stale(dimension);
        if !self.aggregate_keys.remove(key) {
            self.aggregate_keys.insert(key.to_string());
        }
    }

    pub fn select_keys<'a>(&mut self, dimension: Dimension, keys: impl IntoIterator<Item = &'a str>) {
        self.clear_if_stale(dimension);
        self.aggregate_keys.extend(keys.into_iter().map(str::to_string));
    }

    pub fn toggle_message(&mut self, id: i64) {
        if !self.message_ids.remove(&id) {
            self.message_ids.insert(id);
        }
    }

    pub fn select_messages(&mut self, ids: impl IntoIterator<Item = i64>) {
        self.message_ids.extend(ids);
    }

    pub fn clear_aggregates(&mut self) {
        self.aggregate_keys.clear();
    }

    pub fn clear(&mut self) {
        self.aggregate_keys.clear();
        self.message_ids.clear();
    }
}

/// Indices visible on the current page: `offset..offset + page_size`,
/// clipped to `len`. An offset past the end yields an empty range.
pub fn visible_range(offset: usize, page_size: usize, len: usize) -> std::ops::Range<usize> {
    let start = offset.min(len);
    let end = offset.saturating_add(page_size).min(len);
    start..end
}
