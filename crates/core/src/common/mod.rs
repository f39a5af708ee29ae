//! Common leaf types shared across the model.
//!
//! This module provides:
//! 1. **Sequence numbers:** The total program order every structure agrees on.
//! 2. **Back-pressure:** The structural stall reasons the issue stage reports.

/// Structural back-pressure signalling for the issue stage.
pub mod error;
/// Monotonic sequence numbers establishing program order.
pub mod seq;

pub use error::Stall;
pub use seq::SeqNum;
