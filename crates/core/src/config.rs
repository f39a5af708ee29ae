//! Configuration system for the disambiguation model.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (queue capacities, predictor
//!    table sizes, line geometry).
//! 2. **Structures:** Hierarchical config for general, pipeline, and
//!    predictor settings.
//! 3. **Enums:** The dependence-predictor algorithm selector.
//!
//! Configuration is supplied as JSON or via `Config::default()`.

use serde::Deserialize;

/// Default configuration constants for the simulator.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden.
pub(crate) mod defaults {
    /// Reorder buffer capacity in entries.
    pub const ROB_CAPACITY: usize = 32;

    /// Load/Store Queue capacity in entries.
    pub const LSQ_CAPACITY: usize = 16;

    /// Post-commit store buffer capacity in entries.
    pub const STORE_BUFFER_CAPACITY: usize = 8;

    /// Store-Set ID Table size (PC hash buckets).
    pub const SSIT_SIZE: usize = 256;

    /// Maximum number of live store sets.
    pub const MAX_STORE_SETS: usize = 64;

    /// Counter table size for the baseline per-PC predictor.
    pub const COUNTER_TABLE_SIZE: usize = 256;

    /// Initial per-PC speculation confidence (2 = confident).
    pub const CONFIDENCE_INIT: u8 = 2;

    /// Saturation ceiling for the 2-bit confidence counters.
    pub const CONFIDENCE_MAX: u8 = 3;

    /// MSHR file capacity in entries.
    pub const MSHR_ENTRIES: usize = 8;

    /// Cache line size in bytes.
    ///
    /// Matches typical modern processor cache line sizes; used for MSHR
    /// line-address masking and bank interleaving.
    pub const CACHE_LINE: u64 = 64;

    /// Number of independently addressable cache banks.
    pub const NUM_BANKS: usize = 4;

    /// Prefetch queue capacity in entries.
    pub const PREFETCH_QUEUE_CAPACITY: usize = 8;

    /// Access size in bytes for every modeled memory operation.
    pub const ACCESS_BYTES: u64 = 4;

    /// Architectural register count.
    pub const REGISTER_COUNT: usize = 32;
}

/// Memory dependence prediction algorithm types.
///
/// Specifies the algorithm used to decide whether a load may execute
/// speculatively ahead of older unresolved stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PredictorKind {
    /// Store-set dependence predictor (SSIT/LFST, Chrysos & Emer).
    ///
    /// Learns load/store dependence pairs on violations and makes later
    /// loads wait for in-flight stores of the same set.
    #[default]
    StoreSet,
    /// Per-PC two-bit saturating counter predictor.
    ///
    /// Baseline predictor: speculate while the counter stays high.
    Simple,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use mdsim_core::config::Config;
///
/// let config = Config::default();
/// assert!(!config.general.trace_instructions);
/// assert_eq!(config.pipeline.lsq_capacity, 16);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use mdsim_core::config::{Config, PredictorKind};
///
/// let json = r#"{
///     "general": { "trace_instructions": true },
///     "pipeline": { "rob_capacity": 64, "lsq_capacity": 32 },
///     "predictor": { "kind": "Simple", "counter_table_size": 512 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert!(config.general.trace_instructions);
/// assert_eq!(config.pipeline.rob_capacity, 64);
/// assert_eq!(config.predictor.kind, PredictorKind::Simple);
/// assert_eq!(config.predictor.ssit_size, 256);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Pipeline structure capacities.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Dependence predictor configuration.
    #[serde(default)]
    pub predictor: PredictorConfig,
}

/// General simulation settings and options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Enable per-stage instruction tracing to stderr (IS/EX/CM lines).
    #[serde(default)]
    pub trace_instructions: bool,
}

/// Pipeline structure capacities.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Reorder buffer capacity in entries.
    #[serde(default = "PipelineConfig::default_rob_capacity")]
    pub rob_capacity: usize,
    /// Load/Store Queue capacity in entries.
    #[serde(default = "PipelineConfig::default_lsq_capacity")]
    pub lsq_capacity: usize,
}

impl PipelineConfig {
    fn default_rob_capacity() -> usize {
        defaults::ROB_CAPACITY
    }

    fn default_lsq_capacity() -> usize {
        defaults::LSQ_CAPACITY
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rob_capacity: defaults::ROB_CAPACITY,
            lsq_capacity: defaults::LSQ_CAPACITY,
        }
    }
}

/// Dependence predictor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// Prediction algorithm.
    #[serde(default)]
    pub kind: PredictorKind,
    /// Store-Set ID Table size (store-set predictor only).
    #[serde(default = "PredictorConfig::default_ssit_size")]
    pub ssit_size: usize,
    /// Maximum number of live store sets (store-set predictor only).
    #[serde(default = "PredictorConfig::default_max_store_sets")]
    pub max_store_sets: usize,
    /// Counter table size (baseline predictor only).
    #[serde(default = "PredictorConfig::default_counter_table_size")]
    pub counter_table_size: usize,
}

impl PredictorConfig {
    fn default_ssit_size() -> usize {
        defaults::SSIT_SIZE
    }

    fn default_max_store_sets() -> usize {
        defaults::MAX_STORE_SETS
    }

    fn default_counter_table_size() -> usize {
        defaults::COUNTER_TABLE_SIZE
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            kind: PredictorKind::default(),
            ssit_size: defaults::SSIT_SIZE,
            max_store_sets: defaults::MAX_STORE_SETS,
            counter_table_size: defaults::COUNTER_TABLE_SIZE,
        }
    }
}
