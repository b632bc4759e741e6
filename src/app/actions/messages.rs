//! Message list and thread actions

use crate::app::state::{DetailState, Level, ThreadState};
use crate::query::{Dimension, MessageFilter};

use super::super::App;

impl App {
    /// Esc in the message list: drop an active search, else go back
    pub(crate) fn message_list_back(&mut self) {
        if self.state.view.is_searching() {
            self.state.search.input.clear();
            self.clear_search_state();
            self.restore_snapshot_or_reload();
        } else {
            self.go_back();
        }
    }

    /// Group the drilled messages by another dimension.
    /// Defaults to the dimension that follows the drill dimension.
    pub(crate) fn sub_group(&mut self, target: Option<Dimension>) {
        if !self.state.view.has_drill_filter() {
            return;
        }
        self.push_breadcrumb();
        let view = &mut self.state.view;
        view.dimension = target.unwrap_or_else(|| view.drill_dimension.next_sub_group());
        view.level = Level::SubAggregate;
        view.cursor = 0;
        view.scroll_offset = 0;
        view.rows.clear();
        self.state.selection.clear_aggregates();
        self.state.selection.clear_if_stale(view.dimension);
        tracing::debug!("Sub-grouping by {}", self.state.view.dimension);
        self.load_aggregates();
    }

    pub(crate) fn time_sub_group(&mut self) {
        let view = &self.state.view;
        if view.has_drill_filter() && view.drill_dimension != Dimension::Time {
            self.sub_group(Some(Dimension::Time));
        }
    }

    /// `g`: sub-group when drilled, else return to the top-level aggregates
    pub(crate) fn sub_group_or_top(&mut self) {
        if self.state.view.has_drill_filter() {
            self.sub_group(None);
            return;
        }
        self.state.breadcrumbs.clear();
        self.state.search.snapshot = None;
        let view = &mut self.state.view;
        view.search_query.clear();
        view.search_filter = MessageFilter::default();
        view.context_stats = None;
        view.all_messages = false;
        view.filter_key.clear();
        view.level = Level::Aggregates;
        view.cursor = 0;
        view.scroll_offset = 0;
        view.rows.clear();
        view.messages.clear();
        self.load_aggregates();
    }

    pub(crate) fn cycle_message_sort(&mut self) {
        let sort = &mut self.state.view.message_sort;
        sort.field = sort.field.next();
        self.refresh_message_list();
    }

    pub(crate) fn reverse_message_sort(&mut self) {
        let sort = &mut self.state.view.message_sort;
        sort.direction = sort.direction.toggle();
        self.refresh_message_list();
    }

    pub(crate) fn open_detail(&mut self) {
        let Some(msg) = self.state.view.current_message() else {
            return;
        };
        let (id, subject) = (msg.id, msg.subject.clone());
        self.push_breadcrumb();
        let view = &mut self.state.view;
        view.detail_state = DetailState {
            index: view.cursor,
            from_thread: false,
            pending_subject: subject,
            ..DetailState::default()
        };
        view.detail = None;
        view.level = Level::MessageDetail;
        self.load_detail(id);
    }

    /// `T`: show the conversation of the current message
    pub(crate) fn open_thread(&mut self) {
        let view = &self.state.view;
        let conversation_id = match view.level {
            Level::MessageList => view.current_message().map(|m| m.conversation_id),
            Level::MessageDetail => view.detail.as_ref().map(|d| d.conversation_id),
            _ => None,
        }
        .unwrap_or(0);
        if conversation_id <= 0 {
            return;
        }

        self.push_breadcrumb();
        let view = &mut self.state.view;
        view.thread = ThreadState {
            conversation_id,
            ..ThreadState::default()
        };
        view.level = Level::ThreadView;
        tracing::debug!("Opening conversation {}", conversation_id);
        self.load_thread(conversation_id);
    }

    pub(crate) fn open_thread_message(&mut self) {
        let thread = &self.state.view.thread;
        let Some(msg) = thread.messages.get(thread.cursor) else {
            return;
        };
        let (id, subject, index) = (msg.id, msg.subject.clone(), thread.cursor);
        self.push_breadcrumb();
        let view = &mut self.state.view;
        view.detail_state = DetailState {
            index,
            from_thread: true,
            pending_subject: subject,
            ..DetailState::default()
        };
        view.detail = None;
        view.level = Level::MessageDetail;
        self.load_detail(id);
    }
}

#[cfg(test)]
mod tests {
    use crate::app::actions::tests::{app_in, land_rows, pump};
    use crate::app::fetch::Command;
    use crate::app::state::Level;
    use crate::input::Action;
    use crate::query::{Dimension, MessageSortField, TimeGranularity};

    fn drilled(dir: &std::path::Path) -> crate::app::App {
        let mut app = app_in(dir);
        app.start();
        land_rows(&mut app, &[("alice@example.com", 3)]);
        app.handle_action(Action::Open);
        pump(&mut app);
        app
    }

    #[test]
    fn test_sub_group_follows_drill_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = drilled(dir.path());
        assert_eq!(app.state.view.messages.len(), 3);

        app.handle_action(Action::SubGroup);
        assert_eq!(app.state.view.level, Level::SubAggregate);
        assert_eq!(app.state.view.dimension, Dimension::Recipient);
        assert_eq!(app.state.breadcrumbs.len(), 2);

        // Drill from the sub-group, then group by time directly
        pump(&mut app);
        app.handle_action(Action::Open);
        pump(&mut app);
        app.handle_action(Action::TimeGrouping);
        assert_eq!(app.state.view.dimension, Dimension::Time);
    }

    #[test]
    fn test_sub_group_from_recipient_goes_to_domain() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.view.level = Level::MessageList;
        app.state.view.drill_dimension = Dimension::Recipient;
        app.state
            .view
            .drill_filter
            .set_dimension(Dimension::Recipient, "bob@example.com", TimeGranularity::Month);
        app.handle_action(Action::SubGroup);
        assert_eq!(app.state.view.dimension, Dimension::Domain);
    }

    #[test]
    fn test_g_without_drill_returns_to_top() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.start();
        pump(&mut app);
        app.handle_action(Action::AllMessages);
        pump(&mut app);
        app.state.view.search_query = "alice".into();

        app.handle_action(Action::SubGroupOrTop);
        assert_eq!(app.state.view.level, Level::Aggregates);
        assert!(app.state.breadcrumbs.is_empty());
        assert!(!app.state.view.is_searching());
        assert!(app.state.view.context_stats.is_none());
        assert!(matches!(app.outbox.last(), Some(Command::LoadAggregates { drill: None, .. })));
    }

    #[test]
    fn test_message_sort_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = drilled(dir.path());
        app.handle_action(Action::CycleSort);
        assert_eq!(app.state.view.message_sort.field, MessageSortField::Size);
        assert!(matches!(
            app.outbox.last(),
            Some(Command::LoadMessages { filter, .. }) if filter.sort.field == MessageSortField::Size
        ));
    }

    #[test]
    fn test_thread_needs_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = drilled(dir.path());
        app.state.view.messages[0].conversation_id = 0;
        app.handle_action(Action::Thread);
        assert_eq!(app.state.view.level, Level::MessageList);

        // Conversation 2 holds two messages, shown oldest first
        let conversation = app.state.view.messages[1].conversation_id;
        app.state.view.messages[0].conversation_id = conversation;
        app.handle_action(Action::Thread);
        assert_eq!(app.state.view.level, Level::ThreadView);
        pump(&mut app);
        let thread = &app.state.view.thread;
        assert_eq!(thread.conversation_id, conversation);
        assert!(!thread.messages.is_empty());
        assert!(thread.messages.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));

        app.handle_action(Action::Open);
        assert_eq!(app.state.view.level, Level::MessageDetail);
        assert!(app.state.view.detail_state.from_thread);
        app.handle_action(Action::Back);
        assert_eq!(app.state.view.level, Level::ThreadView);
        app.handle_action(Action::Back);
        assert_eq!(app.state.view.level, Level::MessageList);
    }
}
