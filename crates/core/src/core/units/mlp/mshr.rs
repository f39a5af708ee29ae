//! Miss Status Handling Register (MSHR) file.
//!
//! MSHRs track outstanding cache-line misses, enabling hit-under-miss and
//! miss-under-miss. A request to a line that is already outstanding merges
//! into the existing entry as a waiter instead of occupying a new slot, so
//! at most one MSHR exists per line address at any time.

use crate::common::SeqNum;
use crate::config::defaults;

/// Lifecycle state of an MSHR entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MshrState {
    /// The line fill is outstanding.
    Pending,
    /// The line fill has arrived.
    Completed,
}

/// A single outstanding miss.
#[derive(Clone, Debug)]
pub struct MshrEntry {
    /// Address of the original request.
    pub address: u64,
    /// Cache line address (request address masked to line granularity).
    pub line_address: u64,
    /// Current state.
    pub state: MshrState,
    /// Loads waiting on this line.
    pub waiting_loads: Vec<SeqNum>,
    /// Stores waiting on this line.
    pub waiting_stores: Vec<SeqNum>,
    /// Whether the miss was initiated by a prefetch.
    pub is_prefetch: bool,
    /// Cycle the miss was issued.
    pub issue_cycle: u64,
    /// Cycle the fill arrived (valid once Completed).
    pub complete_cycle: u64,
}

impl MshrEntry {
    /// Attaches a waiting instruction to this miss.
    fn add_waiter(&mut self, seq: SeqNum, is_store: bool) {
        if is_store {
            self.waiting_stores.push(seq);
        } else {
            self.waiting_loads.push(seq);
        }
    }

    /// Total number of attached waiters.
    pub fn waiter_count(&self) -> usize {
        self.waiting_loads.len() + self.waiting_stores.len()
    }

    /// Miss latency in cycles, once completed.
    pub fn latency(&self) -> Option<u64> {
        match self.state {
            MshrState::Completed => Some(self.complete_cycle - self.issue_cycle),
            MshrState::Pending => None,
        }
    }
}

/// Aggregate MSHR statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MshrStats {
    /// Distinct line misses tracked.
    pub total_misses: u64,
    /// Requests merged into an existing entry.
    pub merged_requests: u64,
    /// Peak number of simultaneously outstanding misses.
    pub peak_concurrent: usize,
    /// Currently outstanding misses.
    pub active_entries: usize,
}

/// MSHR file over cache lines.
#[derive(Clone, Debug)]
pub struct MshrFile {
    entries: Vec<Option<MshrEntry>>,
    line_bytes: u64,
    total_misses: u64,
    merged_requests: u64,
    peak_concurrent: usize,
}

impl MshrFile {
    /// Creates an MSHR file with the given entry count and line size.
    /// Non-power-of-two line sizes fall back to the default.
    pub fn new(num_entries: usize, line_bytes: u64) -> Self {
        let line_bytes = if line_bytes > 0 && line_bytes.is_power_of_two() {
            line_bytes
        } else {
            defaults::CACHE_LINE
        };
        Self {
            entries: vec![None; num_entries.max(1)],
            line_bytes,
            total_misses: 0,
            merged_requests: 0,
            peak_concurrent: 0,
        }
    }

    /// Masks an address down to its cache line address.
    #[inline]
    pub fn line_address(&self, addr: u64) -> u64 {
        addr & !(self.line_bytes - 1)
    }

    /// Returns true if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.entries.iter().all(Option::is_some)
    }

    /// Finds the slot tracking the line containing `addr`.
    pub fn lookup(&self, addr: u64) -> Option<usize> {
        let line = self.line_address(addr);
        self.entries
            .iter()
            .position(|e| e.as_ref().is_some_and(|e| e.line_address == line))
    }

    /// Returns the entry at `idx`, if occupied.
    pub fn entry(&self, idx: usize) -> Option<&MshrEntry> {
        self.entries.get(idx).and_then(Option::as_ref)
    }

    /// Tracks a miss for `addr`.
    ///
    /// If the line is already outstanding the request merges as a waiter;
    /// otherwise a free slot is occupied. Returns `None` when every slot is
    /// busy and the line is not outstanding — the requester must retry.
    pub fn allocate(
        &mut self,
        addr: u64,
        seq: SeqNum,
        is_store: bool,
        is_prefetch: bool,
        cycle: u64,
    ) -> Option<usize> {
        if let Some(idx) = self.lookup(addr) {
            if let Some(entry) = self.entries[idx].as_mut() {
                entry.add_waiter(seq, is_store);
            }
            self.merged_requests += 1;
            tracing::trace!(addr, idx, "miss merged into outstanding line");
            return Some(idx);
        }

        let idx = self.entries.iter().position(Option::is_none)?;
        let mut entry = MshrEntry {
            address: addr,
            line_address: self.line_address(addr),
            state: MshrState::Pending,
            waiting_loads: Vec::new(),
            waiting_stores: Vec::new(),
            is_prefetch,
            issue_cycle: cycle,
            complete_cycle: 0,
        };
        entry.add_waiter(seq, is_store);
        self.entries[idx] = Some(entry);

        self.total_misses += 1;
        let active = self.active_count();
        self.peak_concurrent = self.peak_concurrent.max(active);
        Some(idx)
    }

    /// Marks the miss at `idx` as filled, stamping its completion cycle.
    pub fn complete(&mut self, idx: usize, cycle: u64) -> Option<&MshrEntry> {
        let entry = self.entries.get_mut(idx)?.as_mut()?;
        entry.state = MshrState::Completed;
        entry.complete_cycle = cycle;
        Some(entry)
    }

    /// Frees the slot at `idx`.
    pub fn free(&mut self, idx: usize) {
        if let Some(slot) = self.entries.get_mut(idx) {
            *slot = None;
        }
    }

    /// Number of outstanding misses.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Returns aggregate statistics.
    pub fn stats(&self) -> MshrStats {
        MshrStats {
            total_misses: self.total_misses,
            merged_requests: self.merged_requests,
            peak_concurrent: self.peak_concurrent,
            active_entries: self.active_count(),
        }
    }
}

impl Default for MshrFile {
    fn default() -> Self {
        Self::new(defaults::MSHR_ENTRIES, defaults::CACHE_LINE)
    }
}
