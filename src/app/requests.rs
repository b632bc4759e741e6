//! Per-kind request ids used to drop superseded async results.

/// Async fetch kinds that are checked for staleness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Aggregate,
    Messages,
    Detail,
    Search,
    Thread,
}

/// One strictly increasing counter per [`RequestKind`].
///
/// A fetch is tagged with the value returned by [`next`](Self::next); its
/// completion applies only while that value is still current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCounters {
    aggregate: u64,
    messages: u64,
    detail: u64,
    search: u64,
    thread: u64,
}

impl RequestCounters {
    fn slot(&mut self, kind: RequestKind) -> &mut u64 {
        match kind {
            RequestKind::Aggregate => &mut self.aggregate,
            RequestKind::Messages => &mut self.messages,
            RequestKind::Detail => &mut self.detail,
            RequestKind::Search => &mut self.search,
            RequestKind::Thread => &mut self.thread,
        }
    }

    /// Bump the counter for `kind` and return the new tag
    pub fn next(&mut self, kind: RequestKind) -> u64 {
        let slot = self.slot(kind);
        *slot += 1;
        *slot
    }

    pub fn current(&self, kind: RequestKind) -> u64 {
        match kind {
            RequestKind::Aggregate => self.aggregate,
            RequestKind::Messages => self.messages,
            RequestKind::Detail => self.detail,
            RequestKind::Search => self.search,
            RequestKind::Thread => self.thread,
        }
    }

    pub fn is_current(&self, kind: RequestKind, tag: u64) -> bool {
        self.current(kind) == tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let mut counters = RequestCounters::default();
        assert_eq!(counters.next(RequestKind::Aggregate), 1);
        assert_eq!(counters.next(RequestKind::Aggregate), 2);
        assert_eq!(counters.next(RequestKind::Thread), 1);
        assert_eq!(counters.current(RequestKind::Messages), 0);
        assert_eq!(counters.current(RequestKind::Aggregate), 2);
    }

    #[test]
    fn test_superseded_tag_is_stale() {
        let mut counters = RequestCounters::default();
        let first = counters.next(RequestKind::Search);
        assert!(counters.is_current(RequestKind::Search, first));

        let second = counters.next(RequestKind::Search);
        assert!(!counters.is_current(RequestKind::Search, first));
        assert!(counters.is_current(RequestKind::Search, second));
        assert!(!counters.is_current(RequestKind::Detail, second));
    }
}
