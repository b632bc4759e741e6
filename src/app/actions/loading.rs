//! Building fetch commands from the current view

use crate::app::fetch::Command;
use crate::app::requests::RequestKind;
use crate::app::state::Level;
use crate::constants::{AGGREGATE_LIMIT, MESSAGE_LIST_LIMIT};
use crate::query::{AggregateOptions, MessageFilter, StatsOptions};

use super::super::App;

impl App {
    fn aggregate_options(&self) -> AggregateOptions {
        let view = &self.state.view;
        AggregateOptions {
            source_id: self.state.account_filter,
            sort: view.aggregate_sort,
            limit: AGGREGATE_LIMIT,
            granularity: view.granularity,
            with_attachments_only: self.state.attachments_only,
            search_query: view.is_searching().then(|| view.search_query.clone()),
        }
    }

    /// Load rows for the current dimension, under the drill filter in SubAggregate
    pub(crate) fn load_aggregates(&mut self) {
        self.state.status.loading = true;
        let tag = self.state.requests.next(RequestKind::Aggregate);
        let view = &self.state.view;
        let drill = (view.level == Level::SubAggregate).then(|| {
            let mut filter = view.drill_filter.clone();
            filter.source_id = self.state.account_filter;
            filter.with_attachments_only = self.state.attachments_only;
            filter
        });
        let cmd = Command::LoadAggregates {
            tag,
            dimension: view.dimension,
            drill,
            opts: self.aggregate_options(),
        };
        tracing::debug!("Loading {} aggregates (tag {})", view.dimension, tag);
        self.queue(cmd);
    }

    /// Filter for the message list: drill filter, else a simple filter on
    /// the displayed dimension unless showing all messages
    pub(crate) fn message_filter(&self) -> MessageFilter {
        let view = &self.state.view;
        let mut filter = if view.has_drill_filter() {
            view.drill_filter.clone()
        } else {
            let mut filter = MessageFilter::scoped(None, false, view.granularity);
            if !view.all_messages {
                filter.set_dimension(view.dimension, &view.filter_key, view.granularity);
            }
            filter
        };
        filter.source_id = self.state.account_filter;
        filter.with_attachments_only = self.state.attachments_only;
        filter.sort = view.message_sort;
        filter.limit = MESSAGE_LIST_LIMIT;
        filter.offset = 0;
        filter
    }

    pub(crate) fn load_messages(&mut self) {
        self.state.status.loading = true;
        let tag = self.state.requests.next(RequestKind::Messages);
        let filter = self.message_filter();
        tracing::debug!("Loading messages for {:?} (tag {})", filter.describe(), tag);
        self.queue(Command::LoadMessages { tag, filter });
    }

    /// Reload the message list, through the search when one is active
    pub(crate) fn refresh_message_list(&mut self) {
        if self.state.view.is_searching() {
            self.state.view.search_filter = self.search_scope();
            self.start_search(false);
        } else {
            self.load_messages();
        }
    }

    /// Drill context plus account and attachment scope, used to narrow searches
    pub(crate) fn search_scope(&self) -> MessageFilter {
        let mut filter = self.state.view.drill_filter.clone();
        filter.source_id = self.state.account_filter;
        filter.with_attachments_only = self.state.attachments_only;
        filter.sort = self.state.view.message_sort;
        filter
    }

    /// Query the search collaborator. A replacing search restarts at offset 0;
    /// an appending one continues from the loaded count.
    pub(crate) fn start_search(&mut self, append: bool) {
        let tag = self.state.requests.next(RequestKind::Search);
        if append {
            self.state.search.loading_more = true;
        } else {
            self.state.status.loading = true;
            self.state.search.offset = 0;
        }
        let cmd = Command::Search {
            tag,
            query: self.state.view.search_query.clone(),
            mode: self.state.search.mode,
            filter: self.state.view.search_filter.clone(),
            offset: if append { self.state.search.offset } else { 0 },
            limit: self.state.search.page_size,
            append,
        };
        tracing::debug!(
            "Searching {:?} in {} mode (tag {}, append {})",
            self.state.view.search_query,
            self.state.search.mode.label(),
            tag,
            append
        );
        self.queue(cmd);
    }

    pub(crate) fn load_detail(&mut self, id: i64) {
        self.state.status.loading = true;
        let tag = self.state.requests.next(RequestKind::Detail);
        self.queue(Command::LoadDetail { tag, id });
    }

    pub(crate) fn load_thread(&mut self, conversation_id: i64) {
        self.state.status.loading = true;
        let tag = self.state.requests.next(RequestKind::Thread);
        self.queue(Command::LoadThread {
            tag,
            conversation_id,
        });
    }

    pub(crate) fn load_stats(&mut self) {
        self.queue(Command::LoadStats(StatsOptions {
            source_id: self.state.account_filter,
            with_attachments_only: self.state.attachments_only,
        }));
    }

    /// Reload whatever the current level displays
    pub(crate) fn reload_view(&mut self) {
        match self.state.view.level {
            Level::Aggregates | Level::SubAggregate => self.load_aggregates(),
            Level::MessageList => self.refresh_message_list(),
            Level::MessageDetail | Level::ThreadView => {}
        }
    }
}
