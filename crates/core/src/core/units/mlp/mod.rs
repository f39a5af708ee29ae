//! Memory-level parallelism structures.
//!
//! This module contains the units that bound and measure concurrent memory
//! misses:
//! - [`mshr`]: outstanding-miss tracking with same-line request merging.
//! - [`banks`]: cache bank conflict detection.
//! - [`prefetch`]: the hardware prefetch request queue.
//! - [`tracker`]: per-cycle MLP measurement.

/// Cache bank conflict detection.
pub mod banks;
/// Miss Status Handling Register file.
pub mod mshr;
/// Hardware prefetch queue.
pub mod prefetch;
/// MLP measurement.
pub mod tracker;

pub use self::banks::BankConflictDetector;
pub use self::mshr::{MshrEntry, MshrFile, MshrState};
pub use self::prefetch::PrefetchQueue;
pub use self::tracker::MlpTracker;
