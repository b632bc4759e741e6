//! Navigation history for reload-free back navigation.

use super::state::ViewState;

/// Owned snapshot of a view, including the data it displayed
#[derive(Debug, Clone)]
pub struct Breadcrumb {
    pub state: ViewState,
}

#[derive(Debug, Clone, Default)]
pub struct BreadcrumbStack {
    entries: Vec<Breadcrumb>,
}

impl BreadcrumbStack {
    /// Record a copy of `state`. Later edits to the live view never reach it.
    pub fn push(&mut self, state: &ViewState) {
        self.entries.push(Breadcrumb {
            state: state.clone(),
        });
    }

    pub fn pop(&mut self) -> Option<Breadcrumb> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breadcrumb> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::AggregateRow;

    #[test]
    fn test_snapshot_is_independent_of_live_state() {
        let mut live = ViewState::default();
        live.rows.push(AggregateRow {
            key: "a".into(),
            count: 1,
            ..AggregateRow::default()
        });
        live.cursor = 0;

        let mut stack = BreadcrumbStack::default();
        stack.push(&live);

        live.rows[0].count = 99;
        live.rows.clear();
        live.cursor = 5;

        let restored = stack.pop().unwrap().state;
        assert_eq!(restored.rows.len(), 1);
        assert_eq!(restored.rows[0].count, 1);
        assert_eq!(restored.cursor, 0);
        assert!(stack.is_empty());
    }
}
