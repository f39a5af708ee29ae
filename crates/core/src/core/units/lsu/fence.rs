//! Memory fences.
//!
//! A fence restricts which younger memory operations may execute before the
//! operations older than the fence have drained. Load fences order loads,
//! store fences order stores, and full fences order both.

use crate::common::SeqNum;

/// Memory fence kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FenceKind {
    /// Orders loads: younger loads wait for older loads.
    Load,
    /// Orders stores: younger stores wait for older stores.
    Store,
    /// Orders everything.
    Full,
}

/// An in-flight memory fence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryFence {
    /// Fence kind.
    pub kind: FenceKind,
    /// Sequence number establishing the fence's position in program order.
    pub seq: SeqNum,
    /// Whether the fence's predecessors have drained.
    pub completed: bool,
}

impl MemoryFence {
    /// Creates a pending fence at the given program-order position.
    pub fn new(kind: FenceKind, seq: SeqNum) -> Self {
        Self {
            kind,
            seq,
            completed: false,
        }
    }

    /// Returns true if this fence blocks a younger load.
    pub fn blocks_load(&self, load_seq: SeqNum) -> bool {
        load_seq > self.seq && matches!(self.kind, FenceKind::Load | FenceKind::Full)
    }

    /// Returns true if this fence blocks a younger store.
    pub fn blocks_store(&self, store_seq: SeqNum) -> bool {
        store_seq > self.seq && matches!(self.kind, FenceKind::Store | FenceKind::Full)
    }

    /// Returns true once the predecessors relevant to this fence kind have
    /// all drained.
    pub fn can_complete(&self, older_loads_done: bool, older_stores_done: bool) -> bool {
        match self.kind {
            FenceKind::Load => older_loads_done,
            FenceKind::Store => older_stores_done,
            FenceKind::Full => older_loads_done && older_stores_done,
        }
    }
}
