//! Core model: pipeline structures, functional units, registers, and memory.
//!
//! This module organizes the fundamental building blocks of the
//! disambiguation model:
//! - [`pipeline`]: LSQ, ROB, store buffer, and the three-stage driver.
//! - [`units`]: dependence predictors, ordering primitives, miss handling.
//! - [`regs`] / [`memory`]: architectural state owned by the driver.

/// Flat memory model (word map keyed by exact address).
pub mod memory;
/// Pipeline structures and the issue/execute/commit driver.
pub mod pipeline;
/// Architectural register file.
pub mod regs;
/// Functional units: prediction, ordering, and miss handling.
pub mod units;
