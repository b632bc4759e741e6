//! Message detail actions: scrolling, lateral moves, find-in-page, export

use crate::app::layout;
use crate::app::state::ModalState;
use crate::input::Action;

use super::super::App;

impl App {
    /// Rendered detail lines at the current terminal width
    fn detail_lines(&self) -> Vec<String> {
        match &self.state.view.detail {
            Some(detail) => layout::detail_lines(detail, self.state.width, &self.state.date_format),
            None => Vec::new(),
        }
    }

    fn max_detail_scroll(&self) -> usize {
        self.state
            .view
            .detail_state
            .line_count
            .saturating_sub(self.state.page_size)
    }

    /// Recompute line count and find matches after the detail or width changed
    pub(crate) fn refresh_detail_layout(&mut self) {
        let lines = self.detail_lines();
        let max_scroll = lines.len().saturating_sub(self.state.page_size);
        let ds = &mut self.state.view.detail_state;
        ds.line_count = lines.len();
        ds.scroll = ds.scroll.min(max_scroll);
        if !ds.find.query.is_empty() {
            ds.find.matches = layout::find_matches(&lines, &ds.find.query);
            if ds.find.match_index >= ds.find.matches.len() {
                ds.find.match_index = 0;
            }
        }
    }

    pub(crate) fn scroll_detail(&mut self, action: Action) {
        let page = self.state.page_size;
        let max = self.max_detail_scroll();
        let scroll = self.state.view.detail_state.scroll;
        let next = match action {
            Action::Up | Action::PageUp if scroll == 0 => {
                self.state.flash("At top");
                return;
            }
            Action::Down | Action::PageDown if scroll >= max => {
                self.state.flash("At bottom");
                return;
            }
            Action::Up => scroll - 1,
            Action::Down => scroll + 1,
            Action::PageUp => scroll.saturating_sub(page),
            Action::PageDown => (scroll + page).min(max),
            Action::Top => 0,
            Action::Bottom => max,
            _ => scroll,
        };
        self.state.view.detail_state.scroll = next;
    }

    /// Show the previous (`-1`) or next (`1`) message of the source list
    pub(crate) fn navigate_detail(&mut self, delta: isize) {
        let page = self.state.page_size;
        let view = &mut self.state.view;
        let from_thread = view.detail_state.from_thread;
        let source = if from_thread {
            &view.thread.messages
        } else {
            &view.messages
        };

        if source.is_empty() {
            self.state.status.set_flash("No messages loaded");
            return;
        }
        let Some(index) = view.detail_state.index.checked_add_signed(delta) else {
            self.state.status.set_flash("At first message");
            return;
        };
        let Some(msg) = source.get(index) else {
            self.state.status.set_flash("At last message");
            return;
        };
        let (id, subject) = (msg.id, msg.subject.clone());

        if from_thread {
            view.thread.cursor = index;
            view.thread.scroll_offset =
                crate::app::state::scroll_offset_for(index, view.thread.scroll_offset, page);
        } else {
            view.cursor = index;
            view.ensure_cursor_visible(page);
        }
        let ds = &mut view.detail_state;
        ds.index = index;
        ds.scroll = 0;
        ds.pending_subject = subject;
        self.load_detail(id);
    }

    /// Esc in the detail view: clear find results first, then go back
    pub(crate) fn detail_back(&mut self) {
        let find = &mut self.state.view.detail_state.find;
        if !find.query.is_empty() {
            find.clear();
            return;
        }
        self.go_back();
    }

    pub(crate) fn open_export(&mut self) {
        let count = self
            .state
            .view
            .detail
            .as_ref()
            .map_or(0, |d| d.attachments.len());
        if count == 0 {
            self.state.flash("No attachments to export");
            return;
        }
        self.state.modal = ModalState::ExportAttachments {
            cursor: 0,
            selected: vec![true; count],
        };
    }

    /// `/` in the detail view: edit the find query
    pub(crate) fn activate_find(&mut self) {
        let find = &mut self.state.view.detail_state.find;
        find.active = true;
        find.input = find.query.clone();
    }

    pub(crate) fn handle_find_bar_action(&mut self, action: Action) {
        match action {
            Action::Open => {
                let lines = self.detail_lines();
                let find = &mut self.state.view.detail_state.find;
                find.active = false;
                find.query = find.input.trim().to_string();
                find.matches = layout::find_matches(&lines, &find.query);
                find.match_index = 0;
                let (first, searched) = (find.current_line(), !find.query.is_empty());
                match first {
                    Some(line) => self.scroll_to_line(line),
                    None if searched => self.state.flash("No matches"),
                    None => {}
                }
            }
            Action::Back => {
                let find = &mut self.state.view.detail_state.find;
                find.active = false;
                find.input.clear();
            }
            _ => {}
        }
    }

    pub(crate) fn next_match(&mut self, forward: bool) {
        let find = &mut self.state.view.detail_state.find;
        let line = if forward { find.next() } else { find.prev() };
        if let Some(line) = line {
            self.scroll_to_line(line);
        }
    }

    fn scroll_to_line(&mut self, line: usize) {
        let max = self.max_detail_scroll();
        self.state.view.detail_state.scroll = line.min(max);
    }
}

#[cfg(test)]
mod tests {
    use crate::app::actions::tests::{app_in, land_rows, pump};
    use crate::app::state::{Level, ModalState};
    use crate::input::Action;

    fn detail_app(dir: &std::path::Path) -> crate::app::App {
        let mut app = app_in(dir);
        app.start();
        land_rows(&mut app, &[("alice@example.com", 3)]);
        app.handle_action(Action::Open);
        pump(&mut app);
        app.handle_action(Action::Open);
        pump(&mut app);
        app
    }

    #[test]
    fn test_lateral_moves_and_back_keep_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = detail_app(dir.path());
        assert_eq!(app.state.view.level, Level::MessageDetail);
        let first = app.state.view.detail.as_ref().map(|d| d.id);

        app.handle_action(Action::Left);
        assert_eq!(app.state.status.flash.as_deref(), Some("At first message"));

        app.handle_action(Action::Right);
        pump(&mut app);
        assert_eq!(app.state.view.detail_state.index, 1);
        assert_ne!(app.state.view.detail.as_ref().map(|d| d.id), first);

        app.handle_action(Action::Right);
        app.handle_action(Action::Right);
        assert_eq!(app.state.status.flash.as_deref(), Some("At last message"));
        pump(&mut app);

        app.handle_action(Action::Back);
        assert_eq!(app.state.view.level, Level::MessageList);
        assert_eq!(app.state.view.cursor, 2);
    }

    #[test]
    fn test_lateral_move_with_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.view.level = Level::MessageDetail;
        app.handle_action(Action::Right);
        assert_eq!(app.state.status.flash.as_deref(), Some("No messages loaded"));
    }

    #[test]
    fn test_scroll_flashes_at_edges() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = detail_app(dir.path());
        app.handle_action(Action::Up);
        assert_eq!(app.state.status.flash.as_deref(), Some("At top"));

        app.state.view.detail_state.line_count = app.state.page_size + 3;
        app.handle_action(Action::Bottom);
        assert_eq!(app.state.view.detail_state.scroll, 3);
        app.handle_action(Action::Down);
        assert_eq!(app.state.status.flash.as_deref(), Some("At bottom"));
        app.handle_action(Action::Top);
        assert_eq!(app.state.view.detail_state.scroll, 0);
    }

    #[test]
    fn test_find_then_esc_clears_before_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = detail_app(dir.path());
        app.handle_action(Action::Search);
        assert!(app.state.view.detail_state.find.active);
        for c in "from".chars() {
            app.handle_char(c);
        }
        app.handle_action(Action::Open);
        let find = &app.state.view.detail_state.find;
        assert!(!find.active);
        assert_eq!(find.query, "from");
        assert!(!find.matches.is_empty());

        app.handle_action(Action::Back);
        assert!(app.state.view.detail_state.find.query.is_empty());
        assert_eq!(app.state.view.level, Level::MessageDetail);
        app.handle_action(Action::Back);
        assert_eq!(app.state.view.level, Level::MessageList);
    }

    #[test]
    fn test_export_requires_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.state.view.level = Level::MessageDetail;
        app.handle_action(Action::Export);
        assert_eq!(app.state.status.flash.as_deref(), Some("No attachments to export"));
        assert!(!app.state.modal.is_active());

        app.state.view.detail = Some(crate::query::MessageDetail {
            attachments: vec![crate::query::AttachmentInfo::default(); 2],
            ..crate::query::MessageDetail::default()
        });
        app.handle_action(Action::Export);
        assert!(matches!(
            &app.state.modal,
            ModalState::ExportAttachments { selected, .. } if selected == &vec![true, true]
        ));
    }
}
