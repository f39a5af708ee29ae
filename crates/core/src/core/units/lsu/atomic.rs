//! Atomic read-modify-write operations.
//!
//! An atomic operation reads a memory value, computes a new value, and
//! appears to other operations as a single indivisible step. While in flight
//! it blocks every younger operation to the same address, acting as a local
//! acquire + release.

use crate::common::SeqNum;

/// Atomic operation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtomicKind {
    /// Unconditional exchange.
    Swap,
    /// Compare-and-swap: writes only if memory matches the expected value.
    CompareAndSwap,
    /// Fetch-and-add.
    FetchAndAdd,
}

/// An atomic read-modify-write operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtomicOp {
    /// Operation kind.
    pub kind: AtomicKind,
    /// Target address.
    pub address: u64,
    /// Sequence number establishing program order.
    pub seq: SeqNum,
    /// Memory value observed at execution.
    pub old_value: Option<u64>,
    /// Value the operation will write, once computed.
    pub new_value: Option<u64>,
    /// Expected value (CAS only).
    pub expected: Option<u64>,
    /// Whether the operation holds its address exclusively.
    pub lock_held: bool,
    /// Whether the operation has finished.
    pub completed: bool,
    /// Whether the operation succeeded.
    pub success: bool,
}

impl AtomicOp {
    /// Creates a pending atomic operation.
    pub fn new(kind: AtomicKind, address: u64, seq: SeqNum) -> Self {
        Self {
            kind,
            address,
            seq,
            old_value: None,
            new_value: None,
            expected: None,
            lock_held: false,
            completed: false,
            success: false,
        }
    }

    /// Executes the read-modify-write against an observed memory value.
    ///
    /// Returns `(success, old_value)`. The old value is returned whether or
    /// not the operation succeeds; `new_value` records what would be written
    /// back on success.
    ///
    /// - **Swap** always succeeds and writes `write_value`.
    /// - **CAS** succeeds iff `expected` is provided and equals the memory
    ///   value; memory is unchanged on failure.
    /// - **FADD** always succeeds and writes `memory_value + write_value`.
    pub fn execute(
        &mut self,
        memory_value: u64,
        write_value: u64,
        expected: Option<u64>,
    ) -> (bool, u64) {
        self.old_value = Some(memory_value);

        match self.kind {
            AtomicKind::Swap => {
                self.new_value = Some(write_value);
                self.success = true;
                (true, memory_value)
            }
            AtomicKind::CompareAndSwap => {
                let Some(expected) = expected else {
                    return (false, memory_value);
                };
                self.expected = Some(expected);
                if memory_value == expected {
                    self.new_value = Some(write_value);
                    self.success = true;
                    (true, memory_value)
                } else {
                    self.success = false;
                    (false, memory_value)
                }
            }
            AtomicKind::FetchAndAdd => {
                self.new_value = Some(memory_value.wrapping_add(write_value));
                self.success = true;
                (true, memory_value)
            }
        }
    }

    /// Returns true if this atomic blocks another operation.
    ///
    /// A younger operation to the same address is blocked while the atomic
    /// holds its address and has not completed.
    pub fn blocks_operation(&self, address: u64, seq: SeqNum) -> bool {
        if seq <= self.seq {
            return false; // older operation
        }
        if !self.lock_held || self.completed {
            return false;
        }
        address == self.address
    }
}
