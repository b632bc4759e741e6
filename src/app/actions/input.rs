//! Text input handling (chars, backspace)

use crate::constants::SEARCH_INPUT_LIMIT;
use crate::app::state::Level;

use super::super::App;

impl App {
    pub(crate) fn handle_char(&mut self, c: char) {
        if self.state.modal.is_active() {
            return;
        }

        // Inline search bar
        if self.state.search.inline_active {
            let input = &mut self.state.search.input;
            if input.chars().count() >= SEARCH_INPUT_LIMIT {
                return;
            }
            input.push(c);
            self.on_search_input_changed();
            return;
        }

        // Find-in-page bar
        let view = &mut self.state.view;
        if view.level == Level::MessageDetail && view.detail_state.find.active {
            let input = &mut view.detail_state.find.input;
            if input.chars().count() < SEARCH_INPUT_LIMIT {
                input.push(c);
            }
        }
    }

    pub(crate) fn handle_backspace(&mut self) {
        if self.state.modal.is_active() {
            return;
        }

        if self.state.search.inline_active {
            if self.state.search.input.pop().is_some() {
                self.on_search_input_changed();
            }
            return;
        }

        let view = &mut self.state.view;
        if view.level == Level::MessageDetail && view.detail_state.find.active {
            view.detail_state.find.input.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::actions::tests::app_in;
    use crate::app::fetch::Command;
    use crate::constants::SEARCH_INPUT_LIMIT;
    use crate::input::Action;

    #[test]
    fn test_search_input_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.handle_action(Action::Search);
        for _ in 0..SEARCH_INPUT_LIMIT + 10 {
            app.handle_char('a');
        }
        assert_eq!(app.state.search.input.chars().count(), SEARCH_INPUT_LIMIT);
    }

    #[test]
    fn test_backspace_reschedules_search() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.handle_action(Action::Search);
        app.handle_char('a');
        app.handle_backspace();
        assert!(app.state.search.input.is_empty());
        assert!(!app.state.search.inline_loading);
        assert!(matches!(
            app.outbox.last(),
            Some(Command::Debounce { query, .. }) if query.is_empty()
        ));

        // Nothing to delete: no new timer
        let queued = app.outbox.len();
        app.handle_backspace();
        assert_eq!(app.outbox.len(), queued);
    }

    #[test]
    fn test_chars_ignored_outside_input_bars() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.handle_char('x');
        assert!(app.outbox.is_empty());
        assert!(app.state.search.input.is_empty());
    }
}
