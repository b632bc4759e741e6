//! Aggregate level actions: drilling, grouping, sorting

use crate::app::requests::RequestKind;
use crate::app::state::Level;
use crate::query::{Dimension, MessageFilter, TotalStats};

use super::super::App;

impl App {
    /// Enter on an aggregate row: open the messages matching it.
    ///
    /// From the top level this starts a fresh drill filter and clears the
    /// selection; from a sub-aggregate the row's constraint is added to the
    /// existing filter and the selection survives.
    pub(crate) fn drill_down(&mut self) {
        let Some(row) = self.state.view.current_row().cloned() else {
            return;
        };
        self.push_breadcrumb();

        let view = &mut self.state.view;
        if view.level == Level::Aggregates {
            view.drill_filter = MessageFilter::scoped(
                self.state.account_filter,
                self.state.attachments_only,
                view.granularity,
            );
            view.drill_dimension = view.dimension;
            self.state.selection.clear();
        }
        view.drill_filter
            .set_dimension(view.dimension, &row.key, view.granularity);
        view.filter_key = row.key.clone();
        view.all_messages = false;
        view.context_stats = Some(TotalStats::from_row(&row));
        view.search_query.clear();
        view.search_filter = MessageFilter::default();

        view.level = Level::MessageList;
        view.cursor = 0;
        view.scroll_offset = 0;
        view.messages.clear();
        self.state.search.snapshot = None;
        self.state.requests.next(RequestKind::Search);
        tracing::debug!("Drill into {}", self.state.view.drill_filter.describe());
        self.load_messages();
    }

    /// Cursor and scroll reset after the grouping changed
    fn reset_aggregate_view(&mut self) {
        let view = &mut self.state.view;
        view.cursor = 0;
        view.scroll_offset = 0;
        self.state.selection.clear_if_stale(view.dimension);
    }

    pub(crate) fn cycle_dimension(&mut self, forward: bool) {
        let view = &mut self.state.view;
        let skip = (view.level == Level::SubAggregate).then_some(view.drill_dimension);
        view.dimension = view.dimension.cycle(forward, skip);
        self.reset_aggregate_view();
        self.load_aggregates();
    }

    /// `t`: switch to time grouping, or step the granularity when already there
    pub(crate) fn time_grouping(&mut self) {
        let view = &mut self.state.view;
        if view.dimension == Dimension::Time {
            view.granularity = view.granularity.next();
            self.state.restore_position = true;
        } else if view.level == Level::SubAggregate && view.drill_dimension == Dimension::Time {
            return;
        } else {
            view.dimension = Dimension::Time;
            self.reset_aggregate_view();
        }
        self.load_aggregates();
    }

    pub(crate) fn cycle_aggregate_sort(&mut self) {
        let sort = &mut self.state.view.aggregate_sort;
        sort.field = sort.field.next();
        self.load_aggregates();
    }

    pub(crate) fn reverse_aggregate_sort(&mut self) {
        let sort = &mut self.state.view.aggregate_sort;
        sort.direction = sort.direction.toggle();
        self.load_aggregates();
    }

    /// `a`: every message at the top level, every drilled message in a sub-aggregate
    pub(crate) fn show_all_messages(&mut self) {
        self.push_breadcrumb();
        let view = &mut self.state.view;
        let is_sub = view.level == Level::SubAggregate;
        view.all_messages = !is_sub;
        if !is_sub {
            view.filter_key.clear();
            view.drill_filter = MessageFilter::default();
        }
        view.level = Level::MessageList;
        view.cursor = 0;
        view.scroll_offset = 0;
        view.messages.clear();
        self.state.clear_error();

        if self.state.view.is_searching() {
            self.state.view.search_filter = self.search_scope();
            self.start_search(false);
        } else {
            self.load_messages();
        }
    }

    /// Esc at an aggregate level: back when possible, else drop the search
    pub(crate) fn aggregate_back(&mut self) {
        if self.go_back() {
            return;
        }
        if self.state.view.is_searching() {
            self.state.view.search_query.clear();
            self.state.view.context_stats = None;
            self.state.search.input.clear();
            self.load_aggregates();
        }
    }
}
