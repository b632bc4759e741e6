//! Application state types
//!
//! All state types live here to maintain clean dependency:
//! UI layer imports from app layer, not vice versa.

use std::time::{Duration, Instant};

use crate::constants::{
    CHROME_ROWS, DEFAULT_PAGE_SIZE, ERROR_TTL_SECS, FLASH_TTL_SECS, SPINNER_FRAME_MS,
    SPINNER_FRAMES,
};
use crate::deletion::Manifest;
use crate::input::KeybindingEntry;
use crate::query::{
    AccountInfo, AggregateRow, AggregateSort, Dimension, MessageDetail, MessageFilter,
    MessageSort, MessageSummary, TimeGranularity, TotalStats,
};
use crate::search::SearchMode;

use super::breadcrumbs::BreadcrumbStack;
use super::debounce::SearchDebouncer;
use super::requests::RequestCounters;
use super::selection::SelectionTracker;

/// Navigation depth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Level {
    #[default]
    Aggregates,
    /// Grouping inside a drill filter
    SubAggregate,
    MessageList,
    MessageDetail,
    ThreadView,
}

impl Level {
    pub fn is_aggregate(self) -> bool {
        matches!(self, Self::Aggregates | Self::SubAggregate)
    }
}

/// Find-in-page state for the detail view
#[derive(Debug, Clone, Default)]
pub struct FindState {
    /// Input bar focused
    pub active: bool,
    pub input: String,
    /// Committed query
    pub query: String,
    /// Rendered line indices containing the query
    pub matches: Vec<usize>,
    pub match_index: usize,
}

impl FindState {
    pub fn clear(&mut self) {
        self.active = false;
        self.input.clear();
        self.query.clear();
        self.matches.clear();
        self.match_index = 0;
    }

    pub fn current_line(&self) -> Option<usize> {
        self.matches.get(self.match_index).copied()
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        self.match_index = (self.match_index + 1) % self.matches.len();
        self.current_line()
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        self.match_index = self
            .match_index
            .checked_sub(1)
            .unwrap_or(self.matches.len() - 1);
        self.current_line()
    }
}

/// Message detail sub-state
#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub scroll: usize,
    /// Rendered line count at the current width
    pub line_count: usize,
    /// Position of the shown message in its source list
    pub index: usize,
    /// Source list is the thread rather than the message list
    pub from_thread: bool,
    /// Subject shown in the breadcrumb while the detail loads
    pub pending_subject: String,
    pub find: FindState,
}

/// Conversation view sub-state
#[derive(Debug, Clone, Default)]
pub struct ThreadState {
    pub conversation_id: i64,
    pub messages: Vec<MessageSummary>,
    pub cursor: usize,
    pub scroll_offset: usize,
    /// More messages exist than were loaded
    pub truncated: bool,
}

/// Everything describing one screen. Snapshotted into breadcrumbs.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub level: Level,
    pub dimension: Dimension,
    pub granularity: TimeGranularity,
    pub aggregate_sort: AggregateSort,
    pub message_sort: MessageSort,
    pub cursor: usize,
    pub scroll_offset: usize,

    /// Row key behind a simple (non-drill) message filter
    pub filter_key: String,
    pub all_messages: bool,
    pub drill_filter: MessageFilter,
    /// Dimension that created the drill filter
    pub drill_dimension: Dimension,
    /// Header statistics for the filtered context
    pub context_stats: Option<TotalStats>,
    pub search_query: String,
    pub search_filter: MessageFilter,

    pub rows: Vec<AggregateRow>,
    pub messages: Vec<MessageSummary>,
    pub detail: Option<MessageDetail>,
    pub detail_state: DetailState,
    pub thread: ThreadState,
}

impl ViewState {
    /// Length of the list the cursor moves over
    pub fn item_count(&self) -> usize {
        match self.level {
            Level::Aggregates | Level::SubAggregate => self.rows.len(),
            Level::MessageList => self.messages.len(),
            Level::ThreadView => self.thread.messages.len(),
            Level::MessageDetail => 0,
        }
    }

    pub fn current_row(&self) -> Option<&AggregateRow> {
        self.rows.get(self.cursor)
    }

    pub fn current_message(&self) -> Option<&MessageSummary> {
        self.messages.get(self.cursor)
    }

    pub fn has_drill_filter(&self) -> bool {
        self.drill_filter.has_drill_criteria()
    }

    pub fn is_searching(&self) -> bool {
        !self.search_query.is_empty()
    }

    pub fn ensure_cursor_visible(&mut self, page_size: usize) {
        self.scroll_offset = scroll_offset_for(self.cursor, self.scroll_offset, page_size);
    }

    /// Clamp cursor and scroll after the list changed length
    pub fn clamp_cursor(&mut self, page_size: usize) {
        let len = self.item_count();
        if len == 0 {
            self.cursor = 0;
            self.scroll_offset = 0;
            return;
        }
        self.cursor = self.cursor.min(len - 1);
        self.ensure_cursor_visible(page_size);
    }
}

/// Scroll offset keeping `cursor` inside a window of `page_size` rows
pub fn scroll_offset_for(cursor: usize, offset: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    if cursor < offset {
        cursor
    } else if cursor >= offset + page_size {
        cursor + 1 - page_size
    } else {
        offset
    }
}

/// Message list captured when a search starts, restored when it is cleared
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    pub messages: Vec<MessageSummary>,
    pub cursor: usize,
    pub scroll_offset: usize,
    pub context_stats: Option<TotalStats>,
}

/// Session-wide search state
#[derive(Debug, Clone)]
pub struct SearchState {
    pub mode: SearchMode,
    /// Mode the inline bar opens in
    pub default_mode: SearchMode,
    pub inline_active: bool,
    pub input: String,
    /// Waiting on a debounced inline search
    pub inline_loading: bool,
    /// Total matches, `-1` when unknown
    pub total_count: i64,
    /// Results loaded so far, used as the next page offset
    pub offset: usize,
    pub loading_more: bool,
    pub page_size: usize,
    pub snapshot: Option<SearchSnapshot>,
    pub debouncer: SearchDebouncer,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            default_mode: SearchMode::default(),
            inline_active: false,
            input: String::new(),
            inline_loading: false,
            total_count: 0,
            offset: 0,
            loading_more: false,
            page_size: crate::constants::SEARCH_PAGE_SIZE,
            snapshot: None,
            debouncer: SearchDebouncer::default(),
        }
    }
}

/// Loading, error, and flash notice state
#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub loading: bool,
    pub error: Option<String>,
    pub error_time: Option<Instant>,
    pub flash: Option<String>,
    pub flash_expires: Option<Instant>,
    pub spinner_frame: usize,
    pub spinner_tick: Option<Instant>,
}

impl StatusState {
    pub fn set_error(&mut self, error: impl ToString) {
        self.error = Some(error.to_string());
        self.error_time = Some(Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.error_time = None;
    }

    /// Clear error if TTL expired. Returns true if error was cleared.
    pub fn clear_error_if_expired(&mut self) -> bool {
        if let Some(time) = self.error_time
            && time.elapsed().as_secs() >= ERROR_TTL_SECS
        {
            self.clear_error();
            true
        } else {
            false
        }
    }

    pub fn set_flash(&mut self, message: impl ToString) {
        self.flash = Some(message.to_string());
        self.flash_expires = Some(Instant::now() + Duration::from_secs(FLASH_TTL_SECS));
    }

    pub fn clear_flash_if_expired(&mut self) -> bool {
        match self.flash_expires {
            Some(at) if Instant::now() >= at => {
                self.flash = None;
                self.flash_expires = None;
                true
            }
            _ => false,
        }
    }

    /// Advance the spinner when a frame has elapsed. Returns true on change.
    pub fn advance_spinner(&mut self, busy: bool) -> bool {
        if !busy {
            self.spinner_tick = None;
            return false;
        }
        let now = Instant::now();
        match self.spinner_tick {
            Some(last) if now.duration_since(last).as_millis() < SPINNER_FRAME_MS => false,
            _ => {
                self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
                self.spinner_tick = Some(now);
                true
            }
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }
}

/// Modal overlay state - only one can be active at a time
#[derive(Debug, Clone, Default)]
pub enum ModalState {
    #[default]
    None,
    DeleteConfirm {
        manifest: Box<Manifest>,
    },
    DeleteResult {
        message: String,
    },
    QuitConfirm,
    /// Cursor 0 is "All accounts"
    AccountSelector {
        cursor: usize,
    },
    /// Cursor 0 is all messages, 1 is with attachments
    AttachmentFilter {
        cursor: usize,
    },
    ExportAttachments {
        cursor: usize,
        selected: Vec<bool>,
    },
    ExportResult {
        message: String,
    },
    Help {
        entries: Vec<KeybindingEntry>,
        scroll: usize,
    },
    /// Long running action in flight; input is swallowed
    Busy {
        message: String,
    },
}

impl ModalState {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn is_help(&self) -> bool {
        matches!(self, Self::Help { .. })
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: ViewState,
    pub breadcrumbs: BreadcrumbStack,
    pub selection: SelectionTracker,
    pub requests: RequestCounters,
    pub search: SearchState,
    pub status: StatusState,
    pub modal: ModalState,

    /// Archive-wide statistics under the account and attachment filters
    pub stats: Option<TotalStats>,
    pub accounts: Vec<AccountInfo>,
    pub account_filter: Option<i64>,
    pub attachments_only: bool,

    /// Data rows visible per page
    pub page_size: usize,
    pub width: u16,
    pub height: u16,
    /// Keep cursor and scroll when the next load lands
    pub restore_position: bool,
    pub date_format: String,
    pub quitting: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: ViewState::default(),
            breadcrumbs: BreadcrumbStack::default(),
            selection: SelectionTracker::default(),
            requests: RequestCounters::default(),
            search: SearchState::default(),
            status: StatusState {
                loading: true,
                ..StatusState::default()
            },
            modal: ModalState::None,
            stats: None,
            accounts: Vec::new(),
            account_filter: None,
            attachments_only: false,
            page_size: DEFAULT_PAGE_SIZE,
            width: 0,
            height: 0,
            restore_position: false,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            quitting: false,
        }
    }
}

impl AppState {
    pub fn set_terminal_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.page_size = height.saturating_sub(CHROME_ROWS).max(1) as usize;
    }

    // Delegate methods to StatusState
    pub fn set_error(&mut self, error: impl ToString) {
        self.status.set_error(error);
    }

    pub fn clear_error(&mut self) {
        self.status.clear_error();
    }

    pub fn flash(&mut self, message: impl ToString) {
        self.status.set_flash(message);
    }

    /// Any fetch the user is waiting on
    pub fn is_busy(&self) -> bool {
        self.status.loading
            || self.search.inline_loading
            || self.search.loading_more
            || self.modal.is_busy()
    }

    /// Time-based housekeeping. Returns true if anything visible changed.
    pub fn tick(&mut self) -> bool {
        let busy = self.is_busy();
        let mut changed = self.status.clear_error_if_expired();
        changed |= self.status.clear_flash_if_expired();
        changed |= self.status.advance_spinner(busy);
        changed
    }

    /// Header statistics: the filtered context when present, else the archive
    pub fn header_stats(&self) -> Option<&TotalStats> {
        self.view.context_stats.as_ref().or(self.stats.as_ref())
    }

    pub fn account_label(&self) -> Option<&str> {
        let id = self.account_filter?;
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_follows_height() {
        let mut state = AppState::default();
        state.set_terminal_size(80, 30);
        assert_eq!(state.page_size, 25);
        state.set_terminal_size(80, 3);
        assert_eq!(state.page_size, 1);
    }

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        assert_eq!(scroll_offset_for(2, 5, 10), 2);
        assert_eq!(scroll_offset_for(14, 0, 10), 5);
        assert_eq!(scroll_offset_for(7, 3, 10), 3);
    }

    #[test]
    fn test_clamp_cursor_after_shrink() {
        let mut view = ViewState {
            level: Level::MessageList,
            cursor: 9,
            scroll_offset: 5,
            ..ViewState::default()
        };
        view.clamp_cursor(4);
        assert_eq!((view.cursor, view.scroll_offset), (0, 0));

        view.messages = vec![MessageSummary::default(); 3];
        view.cursor = 9;
        view.clamp_cursor(4);
        assert_eq!(view.cursor, 2);
    }

    #[test]
    fn test_find_cycles_matches() {
        let mut find = FindState {
            matches: vec![3, 8, 12],
            ..FindState::default()
        };
        assert_eq!(find.next(), Some(8));
        assert_eq!(find.next(), Some(12));
        assert_eq!(find.next(), Some(3));
        assert_eq!(find.prev(), Some(12));
        find.clear();
        assert_eq!(find.next(), None);
    }

    #[test]
    fn test_header_stats_prefers_context() {
        let mut state = AppState {
            stats: Some(TotalStats {
                message_count: 10,
                ..TotalStats::default()
            }),
            ..AppState::default()
        };
        assert_eq!(state.header_stats().map(|s| s.message_count), Some(10));
        state.view.context_stats = Some(TotalStats {
            message_count: 4,
            ..TotalStats::default()
        });
        assert_eq!(state.header_stats().map(|s| s.message_count), Some(4));
    }
}
