//! Hardware prefetch queue.
//!
//! Prefetch requests are kept separate from demand requests so they cannot
//! crowd out real work. The queue is bounded; requests that arrive while it
//! is full are dropped and counted. A demand access that matches a queued
//! prefetch consumes it and counts it useful.

use std::collections::VecDeque;

use crate::config::defaults;

/// A queued prefetch request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrefetchEntry {
    /// Predicted address.
    pub address: u64,
    /// Predictor confidence in [0, 1].
    pub confidence: f64,
    /// Cycle the request was enqueued.
    pub issue_cycle: u64,
    /// Whether a demand access already consumed this prefetch.
    pub consumed: bool,
}

/// Aggregate prefetch statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    /// Requests accepted into the queue.
    pub total_prefetches: u64,
    /// Prefetches consumed by a demand access.
    pub useful_prefetches: u64,
    /// Demand accesses that matched an already-consumed prefetch.
    pub late_prefetches: u64,
    /// Requests dropped because the queue was full.
    pub dropped_prefetches: u64,
}

/// Bounded prefetch request queue.
#[derive(Clone, Debug)]
pub struct PrefetchQueue {
    queue: VecDeque<PrefetchEntry>,
    capacity: usize,
    total_prefetches: u64,
    useful_prefetches: u64,
    late_prefetches: u64,
    dropped_prefetches: u64,
}

impl PrefetchQueue {
    /// Creates a queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            total_prefetches: 0,
            useful_prefetches: 0,
            late_prefetches: 0,
            dropped_prefetches: 0,
        }
    }

    /// Returns the number of queued requests.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns true if the queue is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    /// Enqueues a prefetch request. A full queue drops the request and
    /// returns false.
    pub fn enqueue(&mut self, address: u64, confidence: f64, cycle: u64) -> bool {
        if self.is_full() {
            self.dropped_prefetches += 1;
            return false;
        }
        self.queue.push_back(PrefetchEntry {
            address,
            confidence,
            issue_cycle: cycle,
            consumed: false,
        });
        self.total_prefetches += 1;
        true
    }

    /// Checks whether a demand access hits a queued prefetch.
    ///
    /// The first unconsumed entry with a matching address is consumed and
    /// counted useful. A match on an already-consumed entry counts as a late
    /// prefetch (the demand arrived again before the data was installed).
    pub fn check_hit(&mut self, address: u64) -> bool {
        for entry in &mut self.queue {
            if entry.address == address {
                if entry.consumed {
                    self.late_prefetches += 1;
                } else {
                    entry.consumed = true;
                    self.useful_prefetches += 1;
                    return true;
                }
            }
        }
        false
    }

    /// Removes and returns the oldest request.
    pub fn dequeue(&mut self) -> Option<PrefetchEntry> {
        self.queue.pop_front()
    }

    /// Useful prefetches as a percentage of accepted requests.
    pub fn accuracy(&self) -> f64 {
        if self.total_prefetches == 0 {
            0.0
        } else {
            self.useful_prefetches as f64 / self.total_prefetches as f64 * 100.0
        }
    }

    /// Returns aggregate statistics.
    pub fn stats(&self) -> PrefetchStats {
        PrefetchStats {
            total_prefetches: self.total_prefetches,
            useful_prefetches: self.useful_prefetches,
            late_prefetches: self.late_prefetches,
            dropped_prefetches: self.dropped_prefetches,
        }
    }
}

impl Default for PrefetchQueue {
    fn default() -> Self {
        Self::new(defaults::PREFETCH_QUEUE_CAPACITY)
    }
}
