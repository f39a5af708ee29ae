//! Load/Store Queue (LSQ) for in-flight memory operations.
//!
//! The LSQ is a circular buffer tracking every memory operation between issue
//! and commit, in program order. It provides:
//! 1. **Allocation:** Reserve a slot at issue, in sequence-number order.
//! 2. **Resolution:** Fill in addresses and store data as execute computes them.
//! 3. **Disambiguation:** Classify a load's conflicts with older stores and
//!    find a forwarding source.
//! 4. **Retirement:** Mark entries committed and reclaim them from the head.
//! 5. **Squash:** Remove the contiguous tail region at or above a sequence
//!    number during speculation recovery.
//!
//! Committed store entries may outlive their ROB entry: they stay in the
//! queue while a younger in-flight load could still validate or forward
//! against them, and are reclaimed from the head afterwards.

use crate::common::SeqNum;

/// Memory operation kind tracked by the LSQ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MemOpKind {
    /// Memory read.
    #[default]
    Load,
    /// Memory write.
    Store,
    /// Atomic read-modify-write; ordered like a store for disambiguation.
    Atomic,
}

/// A single entry in the Load/Store Queue.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LsqEntry {
    /// Sequence number establishing program order.
    pub seq: SeqNum,
    /// Program counter of the memory operation.
    pub pc: u64,
    /// Operation kind.
    pub kind: MemOpKind,
    /// Access size in bytes.
    pub size: u64,
    /// Memory address, once computed.
    pub address: Option<u64>,
    /// Store data, once known (stores only).
    pub data: Option<u64>,
    /// Whether the operation executed speculatively.
    pub speculative: bool,
    /// Whether the operation finished executing.
    pub completed: bool,
    /// Whether the operation has committed.
    pub committed: bool,
    /// Whether this slot is occupied.
    pub valid: bool,
}

impl LsqEntry {
    /// Returns true once the address has been computed.
    #[inline]
    pub fn address_valid(&self) -> bool {
        self.address.is_some()
    }

    /// Returns true once the store data is known.
    #[inline]
    pub fn data_valid(&self) -> bool {
        self.data.is_some()
    }
}

/// Classification of the newest older store conflicting with a load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conflict {
    /// An older store whose address is not yet known.
    Unresolved,
    /// An older store with a known, overlapping address.
    Resolved,
}

/// Outcome of scanning the queue for stores older than a load.
///
/// The newest conflicting store wins: a younger unresolved store supersedes
/// an older forwardable one, and forwardability is evaluated against the
/// newest conflict only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DependencyCheck {
    /// Classification of the newest conflicting store, if any.
    pub conflict: Option<Conflict>,
    /// Queue index of the newest conflicting store.
    pub conflict_index: Option<usize>,
    /// Queue index of the forwarding source store, when forwardable.
    pub forward_index: Option<usize>,
    /// Data to forward, when forwardable.
    pub forward_data: Option<u64>,
}

impl DependencyCheck {
    /// Returns true if any older store conflicts with the load.
    #[inline]
    pub fn has_conflict(&self) -> bool {
        self.conflict.is_some()
    }

    /// Returns true if the newest conflicting store can forward its data.
    #[inline]
    pub fn forwardable(&self) -> bool {
        self.forward_data.is_some()
    }
}

/// Returns true if `[addr1, addr1+size1)` and `[addr2, addr2+size2)` overlap.
#[inline]
pub(crate) fn ranges_overlap(addr1: u64, size1: u64, addr2: u64, size2: u64) -> bool {
    let end1 = addr1 + size1;
    let end2 = addr2 + size2;
    !(end1 <= addr2 || end2 <= addr1)
}

/// Load/Store Queue — circular buffer ordered by sequence number.
#[derive(Clone, Debug)]
pub struct Lsq {
    /// Fixed-size entry array.
    entries: Vec<LsqEntry>,
    /// Index of the oldest entry.
    head: usize,
    /// Index where the next entry will be allocated.
    tail: usize,
    /// Number of valid entries.
    count: usize,
}

impl Lsq {
    /// Creates a new LSQ with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, LsqEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the LSQ capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the LSQ is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the LSQ is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Returns the number of free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.count
    }

    /// Allocates a new entry at the tail. Returns `None` if the LSQ is full,
    /// in which case the issue stage must back-pressure.
    pub fn allocate(&mut self, seq: SeqNum, pc: u64, kind: MemOpKind, size: u64) -> Option<usize> {
        if self.is_full() {
            return None;
        }

        let idx = self.tail;
        self.entries[idx] = LsqEntry {
            seq,
            pc,
            kind,
            size,
            address: None,
            data: None,
            speculative: false,
            completed: false,
            committed: false,
            valid: true,
        };

        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Some(idx)
    }

    /// Records the computed address for an entry. Addresses may arrive out of
    /// program order.
    pub fn update_address(&mut self, idx: usize, address: u64) {
        if let Some(entry) = self.entries.get_mut(idx)
            && entry.valid
        {
            entry.address = Some(address);
        }
    }

    /// Records store data for an entry. Ignored for non-store entries.
    pub fn update_data(&mut self, idx: usize, data: u64) {
        if let Some(entry) = self.entries.get_mut(idx)
            && entry.valid
            && entry.kind == MemOpKind::Store
        {
            entry.data = Some(data);
        }
    }

    /// Returns the entry at `idx`, if occupied.
    pub fn entry(&self, idx: usize) -> Option<&LsqEntry> {
        self.entries.get(idx).filter(|e| e.valid)
    }

    /// Returns the oldest entry without removing it.
    pub fn peek_head(&self) -> Option<&LsqEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// Scans all entries older than the load at `load_idx` for conflicting
    /// stores.
    ///
    /// The scan folds newest-wins: each conflicting store overwrites the
    /// classification, and only the newest conflict can be a forwarding
    /// source. A store forwards when its address is known, it starts at the
    /// load's address, covers at least the load's size, and its data is
    /// known. Returns an empty check if the load's own address is unknown.
    pub fn check_dependency(&self, load_idx: usize) -> DependencyCheck {
        let mut check = DependencyCheck::default();
        let Some(load) = self.entry(load_idx) else {
            return check;
        };
        let Some(load_addr) = load.address else {
            return check;
        };
        let load_size = load.size;

        let cap = self.entries.len();
        let mut idx = self.head;
        while idx != load_idx {
            let entry = &self.entries[idx];
            if entry.valid && matches!(entry.kind, MemOpKind::Store | MemOpKind::Atomic) {
                match entry.address {
                    Some(store_addr) => {
                        if ranges_overlap(store_addr, entry.size, load_addr, load_size) {
                            check.conflict = Some(Conflict::Resolved);
                            check.conflict_index = Some(idx);
                            if entry.data_valid()
                                && store_addr == load_addr
                                && entry.size >= load_size
                            {
                                check.forward_index = Some(idx);
                                check.forward_data = entry.data;
                            } else {
                                check.forward_index = None;
                                check.forward_data = None;
                            }
                        }
                    }
                    None => {
                        // Unknown address: a potential conflict that cannot
                        // forward, superseding any older forwarding source.
                        check.conflict = Some(Conflict::Unresolved);
                        check.conflict_index = Some(idx);
                        check.forward_index = None;
                        check.forward_data = None;
                    }
                }
            }
            idx = (idx + 1) % cap;
        }

        check
    }

    /// Marks an entry as speculatively executed.
    pub fn mark_speculative(&mut self, idx: usize) {
        if let Some(entry) = self.entries.get_mut(idx)
            && entry.valid
        {
            entry.speculative = true;
        }
    }

    /// Marks an entry as having finished execution.
    pub fn mark_completed(&mut self, idx: usize) {
        if let Some(entry) = self.entries.get_mut(idx)
            && entry.valid
        {
            entry.completed = true;
        }
    }

    /// Marks an entry as committed. The slot is reclaimed later by
    /// [`Lsq::commit_head`] once no in-flight load can still observe it.
    pub fn mark_committed(&mut self, idx: usize) {
        if let Some(entry) = self.entries.get_mut(idx)
            && entry.valid
        {
            entry.committed = true;
        }
    }

    /// Removes and returns the oldest entry, marking it committed.
    /// Returns `None` if the queue is empty.
    pub fn commit_head(&mut self) -> Option<LsqEntry> {
        if self.count == 0 {
            return None;
        }

        let mut entry = self.entries[self.head].clone();
        entry.committed = true;
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        Some(entry)
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
    pub fn iter(&self) -> impl Iterator<Item = &LsqEntry> {
        let cap = self.entries.len();
        (0..self.count)
            .map(move |i| &self.entries[(self.head + i) % cap])
            .filter(|e| e.valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_at(lsq: &mut Lsq, seq: u64, pc: u64, addr: u64, data: u64) -> usize {
        let idx = lsq
            .allocate(SeqNum(seq), pc, MemOpKind::Store, 4)
            .expect("lsq full");
        lsq.update_address(idx, addr);
        lsq.update_data(idx, data);
        idx
    }

    fn load_at(lsq: &mut Lsq, seq: u64, pc: u64, addr: u64) -> usize {
        let idx = lsq
            .allocate(SeqNum(seq), pc, MemOpKind::Load, 4)
            .expect("lsq full");
        lsq.update_address(idx, addr);
        idx
    }

    #[test]
    fn test_allocate_until_full() {
        let mut lsq = Lsq::new(2);
        assert!(lsq.allocate(SeqNum(1), 0x100, MemOpKind::Load, 4).is_some());
        assert!(lsq.allocate(SeqNum(2), 0x104, MemOpKind::Store, 4).is_some());
        assert!(lsq.is_full());
        assert!(lsq.allocate(SeqNum(3), 0x108, MemOpKind::Load, 4).is_none());
    }

    #[test]
    fn test_forwarding_from_covering_store() {
        let mut lsq = Lsq::new(8);
        store_at(&mut lsq, 1, 0x200, 0x1000, 0xBEEF);
        let ld = load_at(&mut lsq, 2, 0x204, 0x1000);

        let check = lsq.check_dependency(ld);
        assert_eq!(check.conflict, Some(Conflict::Resolved));
        assert!(check.forwardable());
        assert_eq!(check.forward_data, Some(0xBEEF));
    }

    #[test]
    fn test_unresolved_store_blocks_forwarding() {
        let mut lsq = Lsq::new(8);
        let st = lsq
            .allocate(SeqNum(1), 0x300, MemOpKind::Store, 4)
            .expect("lsq full");
        let ld = load_at(&mut lsq, 2, 0x304, 0x1000);

        let check = lsq.check_dependency(ld);
        assert_eq!(check.conflict, Some(Conflict::Unresolved));
        assert!(!check.forwardable());

        // Once the address resolves to the same line, the conflict hardens
        // and the store becomes the forwarding source.
        lsq.update_address(st, 0x1000);
        lsq.update_data(st, 0xCAFE);
        let check = lsq.check_dependency(ld);
        assert_eq!(check.conflict, Some(Conflict::Resolved));
        assert_eq!(check.forward_data, Some(0xCAFE));
    }

    #[test]
    fn test_partial_overlap_conflicts_without_forwarding() {
        let mut lsq = Lsq::new(8);
        let st = lsq
            .allocate(SeqNum(1), 0x400, MemOpKind::Store, 4)
            .expect("lsq full");
        lsq.update_address(st, 0x1002);
        lsq.update_data(st, 0x1111);
        let ld = load_at(&mut lsq, 2, 0x404, 0x1000);

        let check = lsq.check_dependency(ld);
        assert_eq!(check.conflict, Some(Conflict::Resolved));
        assert!(!check.forwardable());
    }

    #[test]
    fn test_newest_conflicting_store_wins() {
        let mut lsq = Lsq::new(8);
        store_at(&mut lsq, 1, 0x500, 0x1000, 0xAAAA);
        // Younger store to the same address with an unknown address would
        // supersede; here it resolves to the same address with fresh data.
        store_at(&mut lsq, 2, 0x504, 0x1000, 0xBBBB);
        let ld = load_at(&mut lsq, 3, 0x508, 0x1000);

        let check = lsq.check_dependency(ld);
        assert_eq!(check.forward_data, Some(0xBBBB));
    }

    #[test]
    fn test_younger_unresolved_store_supersedes_forwarding() {
        let mut lsq = Lsq::new(8);
        store_at(&mut lsq, 1, 0x600, 0x1000, 0xAAAA);
        let _unresolved = lsq
            .allocate(SeqNum(2), 0x604, MemOpKind::Store, 4)
            .expect("lsq full");
        let ld = load_at(&mut lsq, 3, 0x608, 0x1000);

        let check = lsq.check_dependency(ld);
        assert_eq!(check.conflict, Some(Conflict::Unresolved));
        assert!(!check.forwardable());
    }

    #[test]
    fn test_non_overlapping_store_leaves_check_untouched() {
        let mut lsq = Lsq::new(8);
        store_at(&mut lsq, 1, 0x700, 0x1000, 0xAAAA);
        store_at(&mut lsq, 2, 0x704, 0x2000, 0xBBBB);
        let ld = load_at(&mut lsq, 3, 0x708, 0x1000);

        // The younger store to 0x2000 does not disturb the older match.
        let check = lsq.check_dependency(ld);
        assert_eq!(check.forward_data, Some(0xAAAA));
    }

    #[test]
    fn test_load_without_address_has_no_dependencies() {
        let mut lsq = Lsq::new(8);
        store_at(&mut lsq, 1, 0x800, 0x1000, 0xAAAA);
        let ld = lsq
            .allocate(SeqNum(2), 0x804, MemOpKind::Load, 4)
            .expect("lsq full");

        let check = lsq.check_dependency(ld);
        assert!(!check.has_conflict());
        assert!(!check.forwardable());
    }

    #[test]
    fn test_atomic_treated_as_store_for_conflicts() {
        let mut lsq = Lsq::new(8);
        let at = lsq
            .allocate(SeqNum(1), 0x900, MemOpKind::Atomic, 4)
            .expect("lsq full");
        lsq.update_address(at, 0x1000);
        let ld = load_at(&mut lsq, 2, 0x904, 0x1000);

        // Atomics never forward (no store data), so the load must wait.
        let check = lsq.check_dependency(ld);
        assert_eq!(check.conflict, Some(Conflict::Resolved));
        assert!(!check.forwardable());
    }

    #[test]
    fn test_squash_from_rewinds_tail() {
        let mut lsq = Lsq::new(8);
        store_at(&mut lsq, 1, 0x100, 0x1000, 1);
        load_at(&mut lsq, 2, 0x104, 0x2000);
        load_at(&mut lsq, 3, 0x108, 0x3000);
        assert_eq!(lsq.len(), 3);

        lsq.squash_from(SeqNum(2));
        assert_eq!(lsq.len(), 1);
        assert_eq!(lsq.peek_head().map(|e| e.seq), Some(SeqNum(1)));

        // Rewound tail accepts fresh allocations.
        let idx = lsq.allocate(SeqNum(4), 0x10C, MemOpKind::Load, 4);
        assert!(idx.is_some());
        assert_eq!(lsq.len(), 2);
    }

    #[test]
    fn test_squash_full_ring() {
        let mut lsq = Lsq::new(4);
        for seq in 1..=4u64 {
            let _ = store_at(&mut lsq, seq, 0x100, 0x1000, seq);
        }
        assert!(lsq.is_full());

        // Squashing from the head clears the entire (full) ring.
        lsq.squash_from(SeqNum(1));
        assert!(lsq.is_empty());
        assert!(lsq.allocate(SeqNum(5), 0x110, MemOpKind::Load, 4).is_some());
    }

    #[test]
    fn test_squash_is_idempotent() {
        let mut lsq = Lsq::new(8);
        store_at(&mut lsq, 1, 0x100, 0x1000, 1);
        load_at(&mut lsq, 2, 0x104, 0x2000);

        lsq.squash_from(SeqNum(2));
        let after_once: Vec<LsqEntry> = lsq.iter().cloned().collect();
        lsq.squash_from(SeqNum(2));
        let after_twice: Vec<LsqEntry> = lsq.iter().cloned().collect();
        assert_eq!(after_once, after_twice);
    }

    #[test]
    fn test_commit_head_pops_in_order() {
        let mut lsq = Lsq::new(4);
        store_at(&mut lsq, 1, 0x100, 0x1000, 1);
        load_at(&mut lsq, 2, 0x104, 0x2000);

        let first = lsq.commit_head().expect("non-empty");
        assert_eq!(first.seq, SeqNum(1));
        assert!(first.committed);
        let second = lsq.commit_head().expect("non-empty");
        assert_eq!(second.seq, SeqNum(2));
        assert!(lsq.commit_head().is_none());
    }

    #[test]
    fn test_sequence_numbers_increase_head_to_tail() {
        let mut lsq = Lsq::new(4);
        // Force wraparound by cycling the ring.
        for seq in 1..=10u64 {
            let _ = store_at(&mut lsq, seq, 0x100, 0x1000, seq);
            if lsq.len() == 3 {
                let _ = lsq.commit_head();
            }
        }
        let seqs: Vec<u64> = lsq.iter().map(|e| e.seq.0).collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        assert_eq!(seqs, sorted);
    }

    #[test]
    fn test_overlap_formula() {
        assert!(ranges_overlap(0x1000, 4, 0x1000, 4));
        assert!(ranges_overlap(0x1000, 4, 0x1002, 4));
        assert!(!ranges_overlap(0x1000, 4, 0x1004, 4));
        assert!(!ranges_overlap(0x1004, 4, 0x1000, 4));
    }
}
