//! Coalescing of inline search keystrokes.

use std::time::Duration;

use crate::search::SearchMode;

/// Hands out a fresh token per keystroke; a delayed trigger fires only
/// when its token is still the latest.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    token: u64,
    fast_delay: Duration,
    deep_delay: Duration,
}

impl SearchDebouncer {
    pub fn new(fast_delay: Duration, deep_delay: Duration) -> Self {
        Self {
            token: 0,
            fast_delay,
            deep_delay,
        }
    }

    /// Invalidate pending triggers and return the token for a new one
    pub fn bump(&mut self) -> u64 {
        self.token += 1;
        self.token
    }

    /// Invalidate pending triggers without scheduling another
    pub fn cancel(&mut self) {
        self.token += 1;
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.token == token
    }

    pub fn delay(&self, mode: SearchMode) -> Duration {
        match mode {
            SearchMode::Fast => self.fast_delay,
            SearchMode::Deep => self.deep_delay,
        }
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        use crate::constants::{DEEP_SEARCH_DEBOUNCE_MS, FAST_SEARCH_DEBOUNCE_MS};
        Self::new(
            Duration::from_millis(FAST_SEARCH_DEBOUNCE_MS),
            Duration::from_millis(DEEP_SEARCH_DEBOUNCE_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_token_fires() {
        let mut debouncer = SearchDebouncer::default();
        let first = debouncer.bump();
        let second = debouncer.bump();
        assert!(!debouncer.is_current(first));
        assert!(debouncer.is_current(second));

        debouncer.cancel();
        assert!(!debouncer.is_current(second));
    }

    #[test]
    fn test_deep_waits_longer() {
        let debouncer = SearchDebouncer::default();
        assert!(debouncer.delay(SearchMode::Deep) > debouncer.delay(SearchMode::Fast));
        assert_eq!(debouncer.delay(SearchMode::Fast), Duration::from_millis(100));
    }
}
