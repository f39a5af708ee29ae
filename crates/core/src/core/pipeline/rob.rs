//! Reorder Buffer (ROB) for in-order commit.
//!
//! The ROB is a circular buffer tracking every in-flight instruction from
//! issue through commit. It provides:
//! 1. **Allocation:** One slot per issued instruction, in program order.
//! 2. **Completion:** Execute marks entries done as results become available.
//! 3. **In-order Commit:** Retires the head entry only once it has completed.
//! 4. **Squash:** Removes the contiguous tail region at or above a sequence
//!    number during speculation recovery.

use crate::common::SeqNum;
use crate::isa::Instruction;

/// A single entry in the Reorder Buffer.
///
/// Memory operations carry a back-link to their Load/Store Queue slot plus
/// the resolved address/data so commit can validate and retire them.
#[derive(Clone, Debug, Default)]
pub struct RobEntry {
    /// Sequence number establishing program order.
    pub seq: SeqNum,
    /// The instruction occupying this slot.
    pub instr: Instruction,
    /// Back-link to the LSQ slot (memory operations only).
    pub lsq_index: Option<usize>,
    /// Resolved memory address (memory operations only).
    pub address: Option<u64>,
    /// Load result or store data, once known.
    pub data: Option<u64>,
    /// Whether execute has visited this entry.
    pub executed: bool,
    /// Whether the entry is ready to commit.
    pub completed: bool,
    /// Whether the result was produced speculatively (loads only).
    pub speculative: bool,
    /// Whether this slot is occupied.
    pub valid: bool,
}

/// Reorder Buffer — circular buffer for in-order commit.
#[derive(Clone, Debug)]
pub struct Rob {
    /// Fixed-size entry array.
    entries: Vec<RobEntry>,
    /// Index of the oldest entry (commit point).
    head: usize,
    /// Index where the next entry will be allocated.
    tail: usize,
    /// Number of valid entries.
    count: usize,
}

impl Rob {
    /// Creates a new ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, RobEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the ROB is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Returns the number of free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.count
    }

    /// Allocates an entry at the tail. Returns `None` if the ROB is full.
    pub fn allocate(
        &mut self,
        seq: SeqNum,
        instr: Instruction,
        lsq_index: Option<usize>,
    ) -> Option<usize> {
        if self.is_full() {
            return None;
        }

        let idx = self.tail;
        self.entries[idx] = RobEntry {
            seq,
            instr,
            lsq_index,
            address: None,
            data: None,
            executed: false,
            completed: false,
            speculative: false,
            valid: true,
        };

        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Some(idx)
    }

    /// Returns the entry at `idx`, if occupied.
    pub fn entry(&self, idx: usize) -> Option<&RobEntry> {
        self.entries.get(idx).filter(|e| e.valid)
    }

    /// Returns a mutable reference to the entry at `idx`, if occupied.
    pub fn entry_mut(&mut self, idx: usize) -> Option<&mut RobEntry> {
        self.entries.get_mut(idx).filter(|e| e.valid)
    }

    /// Finds the slot index holding the given sequence number.
    pub fn index_of(&self, seq: SeqNum) -> Option<usize> {
        let cap = self.entries.len();
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].seq == seq {
                return Some(idx);
            }
            idx = (idx + 1) % cap;
        }
        None
    }

    /// Returns the oldest entry without removing it.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// Commits (retires) the head entry if it has completed.
    /// Returns `None` if the ROB is empty or the head is still executing.
    pub fn commit_head(&mut self) -> Option<RobEntry> {
        if self.count == 0 || !self.entries[self.head].completed {
            return None;
        }

        let committed = self.entries[self.head].clone();
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        Some(committed)
    }

    /// Removes all entries with sequence number `>= seq` (a contiguous tail
    /// region) and rewinds the tail. Calling twice with the same argument is
    /// a no-op the second time.
    pub fn squash_from(&mut self, seq: SeqNum) {
        let cap = self.entries.len();
        let mut idx = self.head;
        for scanned in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].seq >= seq {
                // Everything from here to the tail is younger: clear it all,
                // even when the ring is full and head == tail.
                let remove = self.count - scanned;
                self.tail = idx;
                for _ in 0..remove {
                    self.entries[idx].valid = false;
                    idx = (idx + 1) % cap;
                }
                self.count -= remove;
                return;
            }
            idx = (idx + 1) % cap;
        }
    }

    /// Iterates over occupied entries from oldest to youngest.
    pub fn iter(&self) -> impl Iterator<Item = &RobEntry> {
        let cap = self.entries.len();
        (0..self.count)
            .map(move |i| &self.entries[(self.head + i) % cap])
            .filter(|e| e.valid)
    }
}
