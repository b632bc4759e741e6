//! Inline search bar, debounced queries and result paging

use crate::app::fetch::Command;
use crate::app::requests::RequestKind;
use crate::app::state::{Level, SearchSnapshot};
use crate::constants::SEARCH_LOAD_MORE_THRESHOLD;
use crate::input::Action;
use crate::query::MessageFilter;
use crate::search::SearchMode;

use super::super::App;

impl App {
    /// `/`: open the inline bar. A message list without an active search is
    /// captured so clearing the search can restore it.
    pub(crate) fn activate_search(&mut self) {
        let search = &mut self.state.search;
        search.inline_active = true;
        search.mode = search.default_mode;
        search.input.clear();

        let view = &self.state.view;
        if view.level == Level::MessageList && !view.is_searching() {
            search.snapshot = Some(SearchSnapshot {
                messages: view.messages.clone(),
                cursor: view.cursor,
                scroll_offset: view.scroll_offset,
                context_stats: view.context_stats,
            });
        }
    }

    pub(crate) fn handle_search_bar_action(&mut self, action: Action) {
        match action {
            Action::Open => self.commit_search(),
            Action::Back => self.cancel_search(),
            Action::ToggleSearchMode if self.state.view.level == Level::MessageList => {
                self.toggle_search_mode()
            }
            _ => {}
        }
    }

    /// Schedule a debounced search for the edited input
    pub(crate) fn on_search_input_changed(&mut self) {
        let search = &mut self.state.search;
        let token = search.debouncer.bump();
        search.inline_loading = !search.input.is_empty();
        let cmd = Command::Debounce {
            token,
            query: search.input.clone(),
            delay: search.debouncer.delay(search.mode),
        };
        self.queue(cmd);
    }

    fn toggle_search_mode(&mut self) {
        let search = &mut self.state.search;
        search.mode = search.mode.toggle();
        search.debouncer.cancel();
        tracing::debug!("Search mode {}", search.mode.label());
        if search.input.is_empty() {
            return;
        }
        search.inline_loading = true;
        self.state.view.search_query = search.input.clone();
        self.state.view.search_filter = self.search_scope();
        self.start_search(false);
    }

    /// Enter in the inline bar
    fn commit_search(&mut self) {
        let search = &mut self.state.search;
        search.debouncer.cancel();
        search.inline_active = false;
        search.inline_loading = false;
        let text = search.input.trim().to_string();

        if text.is_empty() {
            self.clear_search_state();
            self.restore_or_reload_after_clear();
            return;
        }

        self.state.view.search_query = text;
        if self.state.view.level == Level::MessageList {
            self.state.view.search_filter = self.search_scope();
            self.start_search(false);
        } else {
            self.load_aggregates();
        }
    }

    /// Esc in the inline bar: drop the search entirely
    fn cancel_search(&mut self) {
        let search = &mut self.state.search;
        search.debouncer.cancel();
        search.inline_active = false;
        search.inline_loading = false;
        search.input.clear();
        self.clear_search_state();
        self.restore_or_reload_after_clear();
    }

    fn restore_or_reload_after_clear(&mut self) {
        if self.state.view.level == Level::MessageList {
            self.restore_snapshot_or_reload();
        } else {
            self.reload_view();
        }
    }

    /// Forget the query and invalidate in-flight searches
    pub(crate) fn clear_search_state(&mut self) {
        let view = &mut self.state.view;
        view.search_query.clear();
        view.search_filter = MessageFilter::default();
        view.context_stats = None;
        self.state.requests.next(RequestKind::Search);
        let search = &mut self.state.search;
        search.total_count = 0;
        search.offset = 0;
        search.loading_more = false;
    }

    /// Put back the list captured when the search started, or reload it
    pub(crate) fn restore_snapshot_or_reload(&mut self) {
        let Some(snapshot) = self.state.search.snapshot.take() else {
            self.load_messages();
            return;
        };
        let view = &mut self.state.view;
        view.messages = snapshot.messages;
        view.cursor = snapshot.cursor;
        view.scroll_offset = snapshot.scroll_offset;
        view.context_stats = snapshot.context_stats;
        view.clamp_cursor(self.state.page_size);
        self.state.status.loading = false;
        self.state.search.inline_loading = false;
    }

    /// A debounce timer elapsed; only the latest keystroke's timer counts
    pub(crate) fn debounce_fired(&mut self, token: u64, query: String) {
        let search = &self.state.search;
        if !search.debouncer.is_current(token) || !search.inline_active {
            tracing::trace!("Dropping stale debounce token {}", token);
            return;
        }

        let empty = query.is_empty();
        self.state.view.search_query = query;
        if empty {
            self.state.view.context_stats = None;
        }

        if self.state.view.level == Level::MessageList {
            if empty {
                self.state.search.inline_loading = false;
                self.state.requests.next(RequestKind::Search);
                self.load_messages();
            } else {
                self.state.view.search_filter = self.search_scope();
                self.start_search(false);
            }
        } else {
            self.load_aggregates();
        }
    }

    /// Fast mode pages in more results as the cursor nears the end
    pub(crate) fn maybe_load_more_fast(&mut self) {
        let search = &self.state.search;
        let view = &self.state.view;
        let len = view.messages.len();
        let eligible = search.mode == SearchMode::Fast
            && view.is_searching()
            && !self.state.status.loading
            && !search.loading_more
            && len > 0
            && search.total_count >= 0
            && (len as i64) < search.total_count
            && view.cursor + SEARCH_LOAD_MORE_THRESHOLD >= len;
        if eligible {
            self.start_search(true);
        }
    }

    /// Deep mode cannot count matches; PageDown at the end asks for more
    pub(crate) fn maybe_load_more_deep(&mut self) {
        let search = &self.state.search;
        let view = &self.state.view;
        let len = view.messages.len();
        let eligible = search.mode == SearchMode::Deep
            && view.is_searching()
            && !self.state.status.loading
            && !search.loading_more
            && search.total_count == -1
            && len > 0
            && view.cursor + 1 >= len;
        if eligible {
            self.start_search(true);
        }
    }
}
