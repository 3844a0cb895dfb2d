//! Bounded undo stack.

use std::collections::VecDeque;

/// Snapshots kept before the oldest is dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A LIFO stack of snapshots that evicts its oldest entry once full.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    entries: VecDeque<T>,
    limit: usize,
}

impl<T> History<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit: limit.max(1),
        }
    }

    /// Push a snapshot, dropping the oldest if the stack is full.
    pub fn push(&mut self, snapshot: T) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn peek(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut history = History::new(5);
        history.push(1);
        history.push(2);
        history.push(3);
        assert_eq!(history.pop(), Some(3));
        assert_eq!(history.pop(), Some(2));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_evicts_oldest() {
        let mut history = History::default();
        for i in 0..51 {
            history.push(i);
        }
        assert_eq!(history.len(), 50);
        let mut last = None;
        while let Some(v) = history.pop() {
            last = Some(v);
        }
        // Snapshot 0 was evicted.
        assert_eq!(last, Some(1));
    }

    #[test]
    fn test_pop_empty() {
        let mut history: History<u8> = History::new(3);
        assert!(history.is_empty());
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn test_zero_limit_keeps_one() {
        let mut history = History::new(0);
        history.push('a');
        history.push('b');
        assert_eq!(history.limit(), 1);
        assert_eq!(history.peek(), Some(&'b'));
    }
}
