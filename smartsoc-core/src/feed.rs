//! Capacity-capped, newest-first log with oldest-first eviction.

use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// A bounded deque keyed by insertion order. New entries go to the front;
/// once `capacity` is reached the oldest entry (at the back) is evicted.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    /// Create an empty log. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the front, returning the evicted entry if the log was full.
    pub fn push_front(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        self.entries.push_front(entry);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    /// The most recently inserted entry.
    pub fn newest(&self) -> Option<&T> {
        self.entries.front()
    }

    /// The entry that will be evicted next.
    pub fn oldest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<&T> {
        self.entries.iter().find(|e| pred(e))
    }

    pub fn find_mut(&mut self, pred: impl Fn(&T) -> bool) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| pred(e))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedLog<T> {
    /// Newest-first copy of the first `limit` entries.
    pub fn recent(&self, limit: usize) -> Vec<T> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

impl<T: Serialize> Serialize for BoundedLog<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_front_orders_newest_first() {
        let mut log = BoundedLog::new(3);
        log.push_front(1);
        log.push_front(2);
        log.push_front(3);
        assert_eq!(log.to_vec(), vec![3, 2, 1]);
        assert_eq!(log.newest(), Some(&3));
        assert_eq!(log.oldest(), Some(&1));
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let mut log = BoundedLog::new(3);
        assert_eq!(log.push_front(1), None);
        assert_eq!(log.push_front(2), None);
        assert_eq!(log.push_front(3), None);
        assert_eq!(log.push_front(4), Some(1));
        assert_eq!(log.push_front(5), Some(2));
        assert_eq!(log.to_vec(), vec![5, 4, 3]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut log = BoundedLog::new(100);
        for i in 0..150 {
            log.push_front(i);
            assert!(log.len() <= 100);
        }
        assert_eq!(log.len(), 100);
        // The oldest 50 are gone.
        assert!(log.find(|&v| v < 50).is_none());
        assert_eq!(log.oldest(), Some(&50));
    }

    #[test]
    fn test_zero_capacity_bumped() {
        let mut log = BoundedLog::new(0);
        assert_eq!(log.capacity(), 1);
        log.push_front("a");
        log.push_front("b");
        assert_eq!(log.to_vec(), vec!["b"]);
    }

    #[test]
    fn test_recent_limits() {
        let mut log = BoundedLog::new(10);
        for i in 0..5 {
            log.push_front(i);
        }
        assert_eq!(log.recent(2), vec![4, 3]);
        assert_eq!(log.recent(50).len(), 5);
    }

    #[test]
    fn test_find_mut() {
        let mut log = BoundedLog::new(4);
        log.push_front(String::from("a"));
        log.push_front(String::from("b"));
        if let Some(entry) = log.find_mut(|s| s == "a") {
            entry.push('!');
        }
        assert_eq!(log.to_vec(), vec!["b".to_string(), "a!".to_string()]);
    }

    #[test]
    fn test_serializes_as_sequence() {
        let mut log = BoundedLog::new(2);
        log.push_front(1);
        log.push_front(2);
        assert_eq!(serde_json::to_string(&log).unwrap(), "[2,1]");
    }
}
