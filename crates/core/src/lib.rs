//! Memory disambiguation simulator library.
//!
//! This crate implements a cycle-level behavioral model of the memory
//! disambiguation subsystem of a three-stage out-of-order (issue / execute /
//! commit) processor:
//! 1. **Pipeline:** Load/Store Queue, Reorder Buffer, post-commit store
//!    buffer, and the issue/execute/commit driver with commit-time
//!    speculation validation and recovery.
//! 2. **Prediction:** Store-set dependence prediction (SSIT/LFST) and a
//!    per-PC two-bit counter baseline, selectable by configuration.
//! 3. **Ordering:** Memory fences, atomic read-modify-write operations, and
//!    LL/SC reservations.
//! 4. **Miss handling:** MSHR file with same-line merging, bank conflict
//!    arbitration, a prefetch queue, and MLP counters.
//! 5. **Simulation:** `Simulator` (owns the pipeline and a program image),
//!    configuration, and statistics.
//!
//! The model's fundamental invariant: the visible result of every committed
//! load equals the value a non-speculative, program-order execution would
//! have produced.

/// Common leaf types (sequence numbers, back-pressure signalling).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Core model: pipeline structures, functional units, registers, and memory.
pub mod core;
/// Instruction records ingested by the pipeline.
pub mod isa;
/// Simulation driver: `Simulator` owning the pipeline and a program image.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Three-stage pipeline driver; the subsystem's operational surface.
pub use crate::core::pipeline::engine::Pipeline;
/// Instruction record accepted by `Pipeline::issue`.
pub use crate::isa::Instruction;
/// Convenience driver; owns the pipeline and fetches from a program image.
pub use crate::sim::simulator::Simulator;
