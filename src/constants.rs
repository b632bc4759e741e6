//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Maximum aggregate rows requested per load.
pub const AGGREGATE_LIMIT: usize = 50_000;

/// Maximum messages requested for a drilled message list.
pub const MESSAGE_LIST_LIMIT: usize = 500;

/// Maximum messages shown in a thread view.
/// One extra is requested to detect truncation.
pub const THREAD_MESSAGE_LIMIT: usize = 1000;

/// Number of results per search page.
pub const SEARCH_PAGE_SIZE: usize = 100;

/// Rows from the end of a fast search page at which the next page is fetched.
pub const SEARCH_LOAD_MORE_THRESHOLD: usize = 20;

/// Inline search debounce for fast (metadata) mode in milliseconds.
pub const FAST_SEARCH_DEBOUNCE_MS: u64 = 100;

/// Inline search debounce for deep (full text) mode in milliseconds.
/// Deep queries are costlier, so typing pauses longer before dispatch.
pub const DEEP_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Error message display duration in seconds before auto-dismiss.
pub const ERROR_TTL_SECS: u64 = 5;

/// Flash notice lifetime in seconds.
pub const FLASH_TTL_SECS: u64 = 4;

/// Rows reserved for title, breadcrumb, table header, info line and footer.
pub const CHROME_ROWS: u16 = 5;

/// Page size used before the first terminal resize is seen.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Spinner animation frame duration in milliseconds.
pub const SPINNER_FRAME_MS: u128 = 80;

/// Braille animation frames for the loading spinner.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Maximum characters accepted in the inline search bar.
pub const SEARCH_INPUT_LIMIT: usize = 200;

/// Maximum length of a deletion batch description.
pub const DELETION_DESCRIPTION_LIMIT: usize = 30;
