//! Action handlers for user input
//!
//! This module is split into focused submodules:
//! - `loading`: Building and queueing fetch commands
//! - `navigation`: Cursor movement, breadcrumbs and back navigation
//! - `aggregates`: Grouping, drilling, sorting at aggregate levels
//! - `messages`: Message list and thread transitions
//! - `detail`: Message detail scrolling, lateral moves and find
//! - `selection`: Selection and deletion staging
//! - `search`: Inline search bar and result paging
//! - `modal`: Dialog handling
//! - `input`: Text input handling

mod aggregates;
mod detail;
mod input;
mod loading;
mod messages;
mod modal;
mod navigation;
mod search;
mod selection;

use crate::input::Action;

use super::App;
use super::state::{Level, ModalState};

impl App {
    /// Single dispatch point for key actions: modal first, then the inline
    /// bars, then the handler for the current level.
    pub(crate) fn handle_action(&mut self, action: Action) {
        if self.state.modal.is_active() {
            self.handle_modal_action(action);
            return;
        }

        if self.state.search.inline_active {
            self.handle_search_bar_action(action);
            return;
        }

        if self.state.view.level == Level::MessageDetail && self.state.view.detail_state.find.active
        {
            self.handle_find_bar_action(action);
            return;
        }

        match action {
            Action::Quit => {
                self.state.modal = ModalState::QuitConfirm;
                return;
            }
            Action::Help => {
                self.open_help();
                return;
            }
            _ => {}
        }

        match self.state.view.level {
            Level::Aggregates | Level::SubAggregate => self.handle_aggregate_action(action),
            Level::MessageList => self.handle_message_list_action(action),
            Level::MessageDetail => self.handle_detail_action(action),
            Level::ThreadView => self.handle_thread_action(action),
        }
    }

    fn handle_aggregate_action(&mut self, action: Action) {
        match action {
            Action::Up
            | Action::Down
            | Action::PageUp
            | Action::PageDown
            | Action::Top
            | Action::Bottom => self.move_cursor(action),
            Action::Back => self.aggregate_back(),
            Action::Open => self.drill_down(),
            Action::NextGrouping => self.cycle_dimension(true),
            Action::PrevGrouping => self.cycle_dimension(false),
            Action::TimeGrouping => self.time_grouping(),
            Action::CycleSort => self.cycle_aggregate_sort(),
            Action::ReverseSort => self.reverse_aggregate_sort(),
            Action::AllMessages => self.show_all_messages(),
            Action::AccountFilter => self.open_account_selector(),
            Action::AttachmentFilter => self.open_attachment_filter(),
            Action::Search => self.activate_search(),
            Action::ToggleSelect => self.toggle_select(),
            Action::SelectVisible => self.select_visible(),
            Action::ClearSelection => self.state.selection.clear(),
            Action::StageDeletion => self.stage_deletion(),
            _ => {}
        }
    }

    fn handle_message_list_action(&mut self, action: Action) {
        match action {
            Action::Up
            | Action::Down
            | Action::PageUp
            | Action::PageDown
            | Action::Top
            | Action::Bottom => {
                self.move_cursor(action);
                if action == Action::PageDown {
                    self.maybe_load_more_deep();
                }
                self.maybe_load_more_fast();
            }
            Action::Back => self.message_list_back(),
            Action::Open => self.open_detail(),
            Action::SubGroup => self.sub_group(None),
            Action::TimeGrouping => self.time_sub_group(),
            Action::SubGroupOrTop => self.sub_group_or_top(),
            Action::CycleSort => self.cycle_message_sort(),
            Action::ReverseSort => self.reverse_message_sort(),
            Action::Thread => self.open_thread(),
            Action::AccountFilter => self.open_account_selector(),
            Action::AttachmentFilter => self.open_attachment_filter(),
            Action::Search => self.activate_search(),
            Action::ToggleSelect => self.toggle_select(),
            Action::SelectVisible => self.select_visible(),
            Action::ClearSelection => self.state.selection.clear(),
            Action::StageDeletion => self.stage_deletion(),
            _ => {}
        }
    }

    fn handle_detail_action(&mut self, action: Action) {
        match action {
            Action::Up
            | Action::Down
            | Action::PageUp
            | Action::PageDown
            | Action::Top
            | Action::Bottom => self.scroll_detail(action),
            Action::Left => self.navigate_detail(-1),
            Action::Right => self.navigate_detail(1),
            Action::Back => self.detail_back(),
            Action::Thread => self.open_thread(),
            Action::Export => self.open_export(),
            Action::Search => self.activate_find(),
            Action::NextMatch => self.next_match(true),
            Action::PrevMatch => self.next_match(false),
            _ => {}
        }
    }

    fn handle_thread_action(&mut self, action: Action) {
        match action {
            Action::Up
            | Action::Down
            | Action::PageUp
            | Action::PageDown
            | Action::Top
            | Action::Bottom => self.move_cursor(action),
            Action::Open => self.open_thread_message(),
            Action::Back => {
                self.go_back();
            }
            _ => {}
        }
    }

    fn open_help(&mut self) {
        self.state.modal = ModalState::Help {
            entries: self.bindings.all_bindings(),
            scroll: 0,
        };
    }

    pub(crate) fn help_scroll(&mut self, delta: isize) {
        let page = self.state.page_size;
        if let ModalState::Help { scroll, entries } = &mut self.state.modal {
            // One line per entry plus a header and spacer per view
            let mut categories = 0;
            let mut last_category = "";
            for entry in entries.iter() {
                if entry.category != last_category {
                    categories += 1;
                    last_category = entry.category;
                }
            }
            let content_lines = entries.len() + categories * 2;
            let max_scroll = content_lines.saturating_sub(page);
            *scroll = scroll.saturating_add_signed(delta).min(max_scroll);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::fetch::{self, Collaborators, Command, Completion};
    use crate::app::requests::RequestKind;
    use crate::config::Config;
    use crate::query::{AggregateRow, Dimension};

    pub(crate) fn app_in(dir: &std::path::Path) -> App {
        let collab: Collaborators = fetch::tests::collaborators(dir);
        let mut app = App::new(Config::default(), collab);
        app.state.set_terminal_size(100, 30);
        app
    }

    /// Execute queued commands inline until none are left. Debounce timers
    /// are dropped; tests fire them explicitly.
    pub(crate) fn pump(app: &mut App) {
        loop {
            let cmds: Vec<Command> = app.outbox.drain(..).collect();
            if cmds.is_empty() {
                break;
            }
            for cmd in cmds {
                if matches!(cmd, Command::Debounce { .. }) {
                    continue;
                }
                let completion = fetch::execute(&app.collab, cmd);
                app.handle_completion(completion);
            }
        }
    }

    pub(crate) fn rows(keys: &[(&str, i64)]) -> Vec<AggregateRow> {
        keys.iter()
            .map(|(key, count)| AggregateRow {
                key: key.to_string(),
                count: *count,
                total_size: count * 10,
                ..AggregateRow::default()
            })
            .collect()
    }

    /// Apply an aggregate completion for the latest aggregate request
    pub(crate) fn land_rows(app: &mut App, keys: &[(&str, i64)]) {
        let tag = app.state.requests.current(RequestKind::Aggregate);
        app.outbox.clear();
        app.handle_completion(Completion::Aggregates {
            tag,
            result: Ok(rows(keys)),
        });
    }

    #[test]
    fn test_quit_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.handle_action(Action::Quit);
        assert!(matches!(app.state.modal, ModalState::QuitConfirm));
        assert!(!app.state.quitting);

        app.handle_action(Action::Cancel);
        assert!(!app.state.modal.is_active());

        app.handle_action(Action::Quit);
        app.handle_action(Action::Confirm);
        assert!(app.state.quitting);
    }

    #[test]
    fn test_help_scroll_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.handle_action(Action::Help);
        assert!(app.state.modal.is_help());

        app.handle_action(Action::Up);
        for _ in 0..500 {
            app.handle_action(Action::Down);
        }
        let ModalState::Help { scroll, entries } = &app.state.modal else {
            panic!("help closed");
        };
        assert!(*scroll > 0);
        assert!(*scroll < entries.len() + 10);

        app.handle_action(Action::Cancel);
        assert!(!app.state.modal.is_active());
    }

    #[test]
    fn test_alice_bob_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.start();
        land_rows(&mut app, &[("alice@example.com", 100)]);

        // Drill into alice: context stats come from the row
        app.handle_action(Action::Open);
        assert_eq!(app.state.view.level, Level::MessageList);
        assert_eq!(app.state.view.context_stats.map(|s| s.message_count), Some(100));

        // Tab sub-groups by recipient
        app.handle_action(Action::SubGroup);
        assert_eq!(app.state.view.level, Level::SubAggregate);
        assert_eq!(app.state.view.dimension, Dimension::Recipient);
        land_rows(&mut app, &[("bob@example.com", 60)]);

        // Drill into bob: both constraints, stats from bob's row
        app.handle_action(Action::Open);
        let view = &app.state.view;
        assert_eq!(view.drill_filter.sender.as_deref(), Some("alice@example.com"));
        assert_eq!(view.drill_filter.recipient.as_deref(), Some("bob@example.com"));
        assert_eq!(view.context_stats.map(|s| s.message_count), Some(60));

        // Back twice restores alice's list and its stats without fetching
        app.outbox.clear();
        app.handle_action(Action::Back);
        assert_eq!(app.state.view.level, Level::SubAggregate);
        assert_eq!(app.state.view.context_stats.map(|s| s.message_count), Some(100));
        app.handle_action(Action::Back);
        assert_eq!(app.state.view.level, Level::MessageList);
        assert_eq!(app.state.view.context_stats.map(|s| s.message_count), Some(100));
        assert!(app.outbox.is_empty());
    }
}
