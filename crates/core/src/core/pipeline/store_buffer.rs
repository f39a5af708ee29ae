//! Store Buffer for post-commit, pre-memory staging.
//!
//! Committed stores can be held here before draining to memory. The buffer
//! provides:
//! 1. **Insertion:** Append in commit order, bounded by capacity.
//! 2. **Forwarding:** Supply data to later loads, newest entry first.
//! 3. **Drain:** Release the oldest undrained entry toward memory.

use std::collections::VecDeque;

use crate::common::SeqNum;
use crate::config::defaults;

/// A single buffered store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreBufferEntry {
    /// Store address.
    pub address: u64,
    /// Store data.
    pub data: u64,
    /// Store size in bytes.
    pub size: u64,
    /// Sequence number of the committing store.
    pub seq: SeqNum,
    /// Whether the entry has been drained to memory.
    pub drained: bool,
}

/// Post-commit store buffer — append-ordered, capacity-bounded queue.
#[derive(Clone, Debug)]
pub struct StoreBuffer {
    entries: VecDeque<StoreBufferEntry>,
    capacity: usize,
}

impl StoreBuffer {
    /// Creates a store buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of buffered entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the buffer is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Appends a committed store. Returns false if the buffer is full.
    pub fn push(&mut self, address: u64, data: u64, size: u64, seq: SeqNum) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push_back(StoreBufferEntry {
            address,
            data,
            size,
            seq,
            drained: false,
        });
        true
    }

    /// Forwards data to a load, scanning newest-first for an entry with the
    /// exact address and at least the load's size.
    pub fn forward_to_load(&self, address: u64, size: u64) -> Option<u64> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.address == address && e.size >= size)
            .map(|e| e.data)
    }

    /// Removes and returns the oldest undrained entry, marking it drained.
    pub fn drain_oldest(&mut self) -> Option<StoreBufferEntry> {
        let pos = self.entries.iter().position(|e| !e.drained)?;
        let mut entry = self.entries.remove(pos)?;
        entry.drained = true;
        Some(entry)
    }

    /// Returns true if any undrained store remains. With `before` set, only
    /// stores strictly older than the given sequence number are considered.
    pub fn has_pending_stores(&self, before: Option<SeqNum>) -> bool {
        self.entries
            .iter()
            .any(|e| !e.drained && before.is_none_or(|limit| e.seq < limit))
    }
}

impl Default for StoreBuffer {
    fn default() -> Self {
        Self::new(defaults::STORE_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_forward() {
        let mut sb = StoreBuffer::new(4);
        assert!(sb.push(0x1000, 0xAA, 4, SeqNum(1)));
        assert_eq!(sb.forward_to_load(0x1000, 4), Some(0xAA));
        assert_eq!(sb.forward_to_load(0x1004, 4), None);
    }

    #[test]
    fn test_forward_prefers_newest() {
        let mut sb = StoreBuffer::new(4);
        assert!(sb.push(0x1000, 0xAA, 4, SeqNum(1)));
        assert!(sb.push(0x1004, 0xBB, 4, SeqNum(2)));
        assert!(sb.push(0x1000, 0xCC, 4, SeqNum(3)));
        assert_eq!(sb.forward_to_load(0x1000, 4), Some(0xCC));
    }

    #[test]
    fn test_forward_requires_covering_size() {
        let mut sb = StoreBuffer::new(4);
        assert!(sb.push(0x1000, 0xAA, 2, SeqNum(1)));
        assert_eq!(sb.forward_to_load(0x1000, 4), None);
        assert_eq!(sb.forward_to_load(0x1000, 2), Some(0xAA));
    }

    #[test]
    fn test_full_buffer_rejects() {
        let mut sb = StoreBuffer::new(2);
        assert!(sb.push(0x1000, 1, 4, SeqNum(1)));
        assert!(sb.push(0x1004, 2, 4, SeqNum(2)));
        assert!(!sb.push(0x1008, 3, 4, SeqNum(3)));
    }

    #[test]
    fn test_drain_in_insertion_order() {
        let mut sb = StoreBuffer::new(4);
        assert!(sb.push(0x1000, 1, 4, SeqNum(1)));
        assert!(sb.push(0x1004, 2, 4, SeqNum(2)));

        let first = sb.drain_oldest().expect("non-empty");
        assert_eq!(first.seq, SeqNum(1));
        assert!(first.drained);
        let second = sb.drain_oldest().expect("non-empty");
        assert_eq!(second.seq, SeqNum(2));
        assert!(sb.drain_oldest().is_none());
    }

    #[test]
    fn test_has_pending_stores_respects_age_limit() {
        let mut sb = StoreBuffer::new(4);
        assert!(sb.push(0x1000, 1, 4, SeqNum(5)));
        assert!(sb.has_pending_stores(None));
        assert!(sb.has_pending_stores(Some(SeqNum(6))));
        assert!(!sb.has_pending_stores(Some(SeqNum(5))));
    }
}
