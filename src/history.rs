use std::collections::VecDeque;

pub(crate) const HISTORY_CAPACITY: usize = 512;
pub(crate) const BLANK_LOCATION: &str = "about:blank";

/// Visited locations, oldest first.
///
/// Immediate repeats are dropped and `about:blank` is never recorded. Once
/// full, each push evicts the oldest entry.
#[derive(Debug, Clone)]
pub(crate) struct HistoryRing {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl HistoryRing {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(HISTORY_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Returns true when the location was recorded.
    pub(crate) fn push(&mut self, location: &str) -> bool {
        if location.is_empty() || location == BLANK_LOCATION {
            return false;
        }
        if self.entries.back().is_some_and(|last| last == location) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(location.to_string());
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent `n` entries, oldest of the window first.
    pub(crate) fn recent(&self, n: usize) -> impl Iterator<Item = &str> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.range(start..).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_repeat_is_not_recorded() {
        let mut ring = HistoryRing::default();
        assert!(ring.push("https://a.example"));
        assert!(!ring.push("https://a.example"));
        assert_eq!(ring.len(), 1);

        assert!(ring.push("https://b.example"));
        assert!(ring.push("https://a.example"));
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn blank_locations_are_skipped() {
        let mut ring = HistoryRing::default();
        assert!(!ring.push("about:blank"));
        assert!(!ring.push(""));
        assert!(ring.is_empty());
    }

    #[test]
    fn overflow_evicts_oldest_and_keeps_order() {
        let mut ring = HistoryRing::default();
        for i in 0..=HISTORY_CAPACITY {
            ring.push(&format!("https://site{i}.example"));
        }

        assert_eq!(ring.len(), HISTORY_CAPACITY);
        let stored: Vec<&str> = ring.iter().collect();
        assert_eq!(stored[0], "https://site1.example");
        assert_eq!(
            stored[HISTORY_CAPACITY - 1],
            format!("https://site{HISTORY_CAPACITY}.example")
        );
        for (offset, entry) in stored.iter().enumerate() {
            assert_eq!(*entry, format!("https://site{}.example", offset + 1));
        }
    }

    #[test]
    fn recent_window_is_oldest_first() {
        let mut ring = HistoryRing::with_capacity(8);
        for name in ["a", "b", "c", "d"] {
            ring.push(name);
        }
        let window: Vec<&str> = ring.recent(2).collect();
        assert_eq!(window, vec!["c", "d"]);

        let all: Vec<&str> = ring.recent(10).collect();
        assert_eq!(all, vec!["a", "b", "c", "d"]);
    }
}
