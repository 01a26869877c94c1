// src/timer.rs

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Deferred callbacks on the main loop, addressed in milliseconds.
///
/// Timers fire in due-time order; timers due at the same instant fire in
/// the order they were scheduled. There is no cancellation: a payload that
/// has gone stale must be recognised as such by whoever handles it.
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<Pending<T>>>,
    next_seq: u64,
}

struct Pending<T> {
    due: u64,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Pending<T> {}

impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::with_capacity(32),
            next_seq: 0,
        }
    }

    /// Schedule `payload` to fire at `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Pending {
            due: due_ms,
            seq,
            payload,
        }));
    }

    /// Pop the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<T> {
        let is_due = self
            .heap
            .peek()
            .is_some_and(|Reverse(pending)| pending.due <= now_ms);
        if !is_due {
            return None;
        }
        self.heap.pop().map(|Reverse(pending)| pending.payload)
    }

    /// Due time of the next timer, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(pending)| pending.due)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_fires_early() {
        let mut timers = TimerQueue::new();
        timers.schedule(100, "a");
        assert_eq!(timers.pop_due(99), None);
        assert_eq!(timers.next_due(), Some(100));
        assert_eq!(timers.pop_due(100), Some("a"));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_fire_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(300, "late");
        timers.schedule(100, "first");
        timers.schedule(100, "second");
        timers.schedule(200, "middle");

        let mut fired = Vec::new();
        while let Some(name) = timers.pop_due(1_000) {
            fired.push(name);
        }
        assert_eq!(fired, vec!["first", "second", "middle", "late"]);
    }

    #[test]
    fn test_partial_drain() {
        let mut timers = TimerQueue::new();
        timers.schedule(10, 1);
        timers.schedule(20, 2);
        timers.schedule(30, 3);

        assert_eq!(timers.pop_due(25), Some(1));
        assert_eq!(timers.pop_due(25), Some(2));
        assert_eq!(timers.pop_due(25), None);
        assert_eq!(timers.len(), 1);
    }
}
