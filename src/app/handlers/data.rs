//! Fetch completions: aggregates, messages, detail, thread, search

use crate::app::fetch::SearchPage;
use crate::app::requests::RequestKind;
use crate::app::state::Level;
use crate::constants::THREAD_MESSAGE_LIMIT;
use crate::query::{AggregateRow, MessageDetail, MessageSummary, TotalStats};

use super::super::App;

/// Summed counters of aggregate rows, used as search context
fn sum_rows(rows: &[AggregateRow]) -> TotalStats {
    rows.iter().fold(TotalStats::default(), |mut acc, row| {
        acc.message_count += row.count;
        acc.total_size += row.total_size;
        acc.attachment_count += row.attachment_count;
        acc.attachment_size += row.attachment_size;
        acc
    })
}

impl App {
    /// True when a `kind` result tagged `tag` may be applied at the current level
    fn accepts(&self, kind: RequestKind, tag: u64) -> bool {
        let level = self.state.view.level;
        let level_ok = match kind {
            RequestKind::Aggregate => level.is_aggregate(),
            RequestKind::Messages | RequestKind::Search => level == Level::MessageList,
            RequestKind::Detail => level == Level::MessageDetail,
            RequestKind::Thread => level == Level::ThreadView,
        };
        let current = self.state.requests.is_current(kind, tag);
        if !(current && level_ok) {
            tracing::trace!("Dropping stale {:?} result (tag {}) at {:?}", kind, tag, level);
        }
        current && level_ok
    }

    pub(super) fn on_aggregates(&mut self, tag: u64, result: Result<Vec<AggregateRow>, String>) {
        if !self.accepts(RequestKind::Aggregate, tag) {
            return;
        }
        self.state.status.loading = false;
        self.state.search.inline_loading = false;

        match result {
            Ok(rows) => {
                self.state.clear_error();
                let view = &mut self.state.view;
                view.rows = rows;
                if !self.state.restore_position {
                    view.cursor = 0;
                    view.scroll_offset = 0;
                }
                self.state.restore_position = false;
                view.clamp_cursor(self.state.page_size);

                if view.is_searching() {
                    view.context_stats = Some(sum_rows(&view.rows));
                } else if view.level == Level::Aggregates {
                    view.context_stats = None;
                }
            }
            Err(e) => {
                tracing::warn!("Aggregate load failed: {}", e);
                self.state.restore_position = false;
                self.state.set_error(e);
            }
        }
    }

    pub(super) fn on_messages(&mut self, tag: u64, result: Result<Vec<MessageSummary>, String>) {
        if !self.accepts(RequestKind::Messages, tag) {
            return;
        }
        self.state.status.loading = false;
        self.state.search.inline_loading = false;

        match result {
            Ok(messages) => {
                self.state.clear_error();
                self.state.view.messages = messages;
                self.state.view.clamp_cursor(self.state.page_size);
            }
            Err(e) => {
                tracing::warn!("Message load failed: {}", e);
                self.state.set_error(e);
            }
        }
    }

    pub(super) fn on_detail(&mut self, tag: u64, result: Result<MessageDetail, String>) {
        if !self.accepts(RequestKind::Detail, tag) {
            return;
        }
        self.state.status.loading = false;

        match result {
            Ok(detail) => {
                self.state.clear_error();
                let view = &mut self.state.view;
                view.detail = Some(detail);
                view.detail_state.scroll = 0;
                view.detail_state.pending_subject.clear();
                self.refresh_detail_layout();
            }
            Err(e) => {
                tracing::warn!("Detail load failed: {}", e);
                self.state.set_error(e);
            }
        }
    }

    pub(super) fn on_thread(
        &mut self,
        tag: u64,
        conversation_id: i64,
        result: Result<(Vec<MessageSummary>, bool), String>,
    ) {
        if !self.accepts(RequestKind::Thread, tag)
            || self.state.view.thread.conversation_id != conversation_id
        {
            return;
        }
        self.state.status.loading = false;

        match result {
            Ok((messages, truncated)) => {
                self.state.clear_error();
                let thread = &mut self.state.view.thread;
                thread.messages = messages;
                thread.truncated = truncated;
                thread.cursor = 0;
                thread.scroll_offset = 0;
                if truncated {
                    self.state
                        .flash(format!("Showing first {THREAD_MESSAGE_LIMIT} messages"));
                }
            }
            Err(e) => {
                tracing::warn!("Thread load failed: {}", e);
                self.state.set_error(e);
            }
        }
    }

    pub(super) fn on_search(&mut self, tag: u64, append: bool, result: Result<SearchPage, String>) {
        if !self.accepts(RequestKind::Search, tag) {
            return;
        }
        self.state.status.loading = false;
        self.state.search.inline_loading = false;
        self.state.search.loading_more = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                self.state.set_error(e);
                return;
            }
        };
        self.state.clear_error();

        if append {
            self.append_search_page(page);
        } else {
            self.replace_search_results(page);
        }
    }

    fn replace_search_results(&mut self, page: SearchPage) {
        let search = &mut self.state.search;
        let view = &mut self.state.view;
        let loaded = page.messages.len();
        search.total_count = page.total_count;
        search.offset = loaded;
        view.messages = page.messages;
        view.cursor = 0;
        view.scroll_offset = 0;

        view.context_stats = match page.stats {
            Some(stats) => Some(stats),
            None => {
                let count = match page.total_count {
                    total if total > 0 => total,
                    -1 => loaded as i64,
                    _ => 0,
                };
                match view.context_stats {
                    // Size and attachment figures from a drill stay meaningful
                    Some(mut stats) if stats.total_size != 0 || stats.attachment_count != 0 => {
                        stats.message_count = count;
                        Some(stats)
                    }
                    _ => Some(TotalStats {
                        message_count: count,
                        ..TotalStats::default()
                    }),
                }
            }
        };
        tracing::debug!("Search returned {} of {} results", loaded, page.total_count);
    }

    fn append_search_page(&mut self, page: SearchPage) {
        let search = &mut self.state.search;
        let view = &mut self.state.view;
        search.offset += page.messages.len();
        search.total_count = page.total_count;
        view.messages.extend(page.messages);
        if search.total_count == -1
            && let Some(stats) = view.context_stats.as_mut()
        {
            stats.message_count = view.messages.len() as i64;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::actions::tests::{app_in, rows};
    use crate::app::fetch::{Completion, SearchPage};
    use crate::app::requests::RequestKind;
    use crate::app::state::Level;
    use crate::query::{MessageDetail, MessageSummary, TotalStats};

    #[test]
    fn test_stale_results_dropped_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());

        let old = app.state.requests.next(RequestKind::Aggregate);
        let new = app.state.requests.next(RequestKind::Aggregate);
        app.handle_completion(Completion::Aggregates {
            tag: old,
            result: Ok(rows(&[("old", 1)])),
        });
        assert!(app.state.view.rows.is_empty());
        app.handle_completion(Completion::Aggregates {
            tag: new,
            result: Ok(rows(&[("new", 1)])),
        });
        assert_eq!(app.state.view.rows[0].key, "new");

        app.state.view.level = Level::MessageList;
        let old = app.state.requests.next(RequestKind::Messages);
        app.state.requests.next(RequestKind::Messages);
        app.handle_completion(Completion::Messages {
            tag: old,
            result: Ok(vec![MessageSummary::default()]),
        });
        assert!(app.state.view.messages.is_empty());

        let old = app.state.requests.next(RequestKind::Search);
        app.state.requests.next(RequestKind::Search);
        app.handle_completion(Completion::Search {
            tag: old,
            append: false,
            result: Ok(SearchPage::default()),
        });
        assert_eq!(app.state.search.total_count, 0);
        assert!(app.state.view.context_stats.is_none());

        app.state.view.level = Level::MessageDetail;
        let old = app.state.requests.next(RequestKind::Detail);
        app.state.requests.next(RequestKind::Detail);
        app.handle_completion(Completion::Detail {
            tag: old,
            result: Ok(MessageDetail::default()),
        });
        assert!(app.state.view.detail.is_none());

        app.state.view.level = Level::ThreadView;
        let old = app.state.requests.next(RequestKind::Thread);
        app.state.requests.next(RequestKind::Thread);
        app.handle_completion(Completion::Thread {
            tag: old,
            conversation_id: 0,
            result: Ok((vec![MessageSummary::default()], false)),
        });
        assert!(app.state.view.thread.messages.is_empty());
    }

    #[test]
    fn test_results_for_another_level_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let tag = app.state.requests.next(RequestKind::Messages);
        app.handle_completion(Completion::Messages {
            tag,
            result: Ok(vec![MessageSummary::default()]),
        });
        assert!(app.state.view.messages.is_empty());
    }

    #[test]
    fn test_error_keeps_displayed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.view.rows = rows(&[("kept", 1)]);
        app.state.restore_position = true;
        let tag = app.state.requests.next(RequestKind::Aggregate);
        app.handle_completion(Completion::Aggregates {
            tag,
            result: Err("disk on fire".into()),
        });
        assert_eq!(app.state.view.rows[0].key, "kept");
        assert_eq!(app.state.status.error.as_deref(), Some("disk on fire"));
        assert!(!app.state.restore_position);
        assert!(!app.state.status.loading);
    }

    #[test]
    fn test_search_context_from_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.view.search_query = "x".into();
        let tag = app.state.requests.next(RequestKind::Aggregate);
        app.handle_completion(Completion::Aggregates {
            tag,
            result: Ok(rows(&[("a", 2), ("b", 3)])),
        });
        let stats = app.state.view.context_stats.unwrap();
        assert_eq!((stats.message_count, stats.total_size), (5, 50));

        app.state.view.search_query.clear();
        let tag = app.state.requests.next(RequestKind::Aggregate);
        app.handle_completion(Completion::Aggregates {
            tag,
            result: Ok(rows(&[("a", 2)])),
        });
        assert!(app.state.view.context_stats.is_none());
    }

    #[test]
    fn test_search_replace_keeps_drill_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.view.level = Level::MessageList;
        app.state.view.context_stats = Some(TotalStats {
            message_count: 100,
            total_size: 5000,
            ..TotalStats::default()
        });
        let deliver = |app: &mut crate::app::App, total: i64, loaded: usize| {
            let tag = app.state.requests.next(RequestKind::Search);
            app.handle_completion(Completion::Search {
                tag,
                append: false,
                result: Ok(SearchPage {
                    messages: vec![MessageSummary::default(); loaded],
                    total_count: total,
                    stats: None,
                }),
            });
            app.state.view.context_stats.unwrap()
        };

        let stats = deliver(&mut app, 42, 42);
        assert_eq!((stats.message_count, stats.total_size), (42, 5000));
        let stats = deliver(&mut app, -1, 7);
        assert_eq!(stats.message_count, 7);
        let stats = deliver(&mut app, 0, 0);
        assert_eq!(stats.message_count, 0);

        // Stats returned with the page win outright
        let tag = app.state.requests.next(RequestKind::Search);
        app.handle_completion(Completion::Search {
            tag,
            append: false,
            result: Ok(SearchPage {
                messages: Vec::new(),
                total_count: 3,
                stats: Some(TotalStats {
                    message_count: 3,
                    total_size: 9,
                    ..TotalStats::default()
                }),
            }),
        });
        assert_eq!(app.state.view.context_stats.unwrap().total_size, 9);
    }

    #[test]
    fn test_deep_append_syncs_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.view.level = Level::MessageList;
        app.state.view.messages = vec![MessageSummary::default(); 100];
        app.state.view.context_stats = Some(TotalStats {
            message_count: 100,
            ..TotalStats::default()
        });
        app.state.search.offset = 100;
        app.state.search.loading_more = true;
        let tag = app.state.requests.next(RequestKind::Search);
        app.handle_completion(Completion::Search {
            tag,
            append: true,
            result: Ok(SearchPage {
                messages: vec![MessageSummary::default(); 100],
                total_count: -1,
                stats: None,
            }),
        });
        assert_eq!(app.state.view.messages.len(), 200);
        assert_eq!(app.state.search.offset, 200);
        assert_eq!(app.state.view.context_stats.unwrap().message_count, 200);
        assert!(!app.state.search.loading_more);
    }
}
