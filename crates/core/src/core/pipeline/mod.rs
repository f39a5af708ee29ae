//! Pipeline structures and the issue/execute/commit driver.
//!
//! This module contains the ordered in-flight tracking structures and the
//! three-stage driver that glues them to the predictors and architectural
//! state:
//! - [`lsq`]: the Load/Store Queue.
//! - [`rob`]: the Reorder Buffer.
//! - [`store_buffer`]: post-commit store staging.
//! - [`engine`]: the `Pipeline` driver and its per-cycle `tick`.

/// Three-stage pipeline driver.
pub mod engine;
/// Load/Store Queue.
pub mod lsq;
/// Reorder Buffer.
pub mod rob;
/// Post-commit store buffer.
pub mod store_buffer;

pub(crate) mod stages;

pub use engine::Pipeline;
