//! Structural back-pressure signalling.
//!
//! Nothing in the model is fatal. The issue stage refuses an instruction when
//! a structural resource has no free slot; the caller holds the instruction
//! and retries on a later cycle once the resource drains.

use thiserror::Error;

/// Reason the issue stage did not accept an instruction this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Stall {
    /// The reorder buffer has no free slot.
    #[error("reorder buffer full")]
    RobFull,
    /// The load/store queue has no free slot.
    #[error("load/store queue full")]
    LsqFull,
}
