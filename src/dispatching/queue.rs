//! Max-priority queue with FIFO tie-breaking.
//!
//! Ordering looks only at `(priority, insertion index)`; the payload is never
//! compared, so payloads need no `Ord`.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::RuleScore;

#[derive(Debug)]
struct Entry<T> {
    priority: RuleScore,
    seq: Reverse<u64>,
    item: T,
}

impl<T> Entry<T> {
    fn key(&self) -> (RuleScore, Reverse<u64>) {
        (self.priority, self.seq)
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Highest priority pops first; equal priorities pop in insertion order.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T, priority: RuleScore) {
        let seq = Reverse(self.next_seq);
        self.next_seq += 1;
        self.heap.push(Entry { priority, seq, item });
    }

    /// Removes the highest-priority item with its priority.
    pub fn pop(&mut self) -> Option<(T, RuleScore)> {
        self.heap.pop().map(|e| (e.item, e.priority))
    }

    pub fn peek_priority(&self) -> Option<RuleScore> {
        self.heap.peek().map(|e| e.priority)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains every item in pop order.
    pub fn into_sorted_vec(mut self) -> Vec<(T, RuleScore)> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(next) = self.pop() {
            out.push(next);
        }
        out
    }
}

impl<T> FromIterator<(T, RuleScore)> for PriorityQueue<T> {
    fn from_iter<I: IntoIterator<Item = (T, RuleScore)>>(iter: I) -> Self {
        let mut q = Self::new();
        for (item, priority) in iter {
            q.push(item, priority);
        }
        q
    }
}
