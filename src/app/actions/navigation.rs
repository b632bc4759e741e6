//! Navigation actions (movement, breadcrumbs, back)

use crate::app::requests::RequestKind;
use crate::app::state::{Level, scroll_offset_for};
use crate::input::Action;

use super::super::App;

/// Cursor position after a movement over a list of `len` items
fn step(cursor: usize, len: usize, page: usize, action: Action) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    match action {
        Action::Up => cursor.saturating_sub(1),
        Action::Down => (cursor + 1).min(last),
        Action::PageUp => cursor.saturating_sub(page),
        Action::PageDown => (cursor + page).min(last),
        Action::Top => 0,
        Action::Bottom => last,
        _ => cursor.min(last),
    }
}

impl App {
    /// Move the cursor of the list shown at the current level
    pub(crate) fn move_cursor(&mut self, action: Action) {
        let page = self.state.page_size;
        let view = &mut self.state.view;
        if view.level == Level::ThreadView {
            let thread = &mut view.thread;
            thread.cursor = step(thread.cursor, thread.messages.len(), page, action);
            thread.scroll_offset = scroll_offset_for(thread.cursor, thread.scroll_offset, page);
            return;
        }
        view.cursor = step(view.cursor, view.item_count(), page, action);
        view.ensure_cursor_visible(page);
    }

    /// Snapshot the current view before a forward transition
    pub(crate) fn push_breadcrumb(&mut self) {
        self.state.breadcrumbs.push(&self.state.view);
    }

    /// Restore the previous view without fetching. Returns false at the root.
    pub(crate) fn go_back(&mut self) -> bool {
        let Some(crumb) = self.state.breadcrumbs.pop() else {
            return false;
        };
        let from = self.state.view.level;
        let restored = crumb.state;

        // Keep the cursor a lateral detail move left behind
        let cursor = match (from, restored.level) {
            (Level::MessageDetail, Level::MessageList) if !self.state.view.detail_state.from_thread => {
                Some(self.state.view.cursor)
            }
            (Level::MessageDetail, Level::ThreadView) => Some(self.state.view.thread.cursor),
            _ => None,
        };

        self.state.view = restored;
        match (self.state.view.level, cursor) {
            (Level::MessageList, Some(cursor)) => {
                self.state.view.cursor = cursor;
                self.state.view.clamp_cursor(self.state.page_size);
            }
            (Level::ThreadView, Some(cursor)) => {
                let page = self.state.page_size;
                let thread = &mut self.state.view.thread;
                thread.cursor = cursor.min(thread.messages.len().saturating_sub(1));
                thread.scroll_offset = scroll_offset_for(thread.cursor, thread.scroll_offset, page);
            }
            _ => {}
        }

        // Fetches still in flight belong to the view being left
        for kind in [
            RequestKind::Aggregate,
            RequestKind::Messages,
            RequestKind::Detail,
            RequestKind::Search,
            RequestKind::Thread,
        ] {
            self.state.requests.next(kind);
        }
        self.state.search.loading_more = false;
        self.state.status.loading = false;
        self.state.clear_error();
        tracing::debug!("Back from {:?} to {:?}", from, self.state.view.level);
        true
    }
}
