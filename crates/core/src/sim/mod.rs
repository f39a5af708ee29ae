//! Simulation driver.
//!
//! This module provides the [`Simulator`](simulator::Simulator), which owns
//! the pipeline and a program image and runs the fetch/issue loop the
//! pipeline itself leaves to its caller.

/// `Simulator`: pipeline plus program image.
pub mod simulator;
