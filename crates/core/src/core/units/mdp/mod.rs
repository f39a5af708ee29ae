//! Memory dependence prediction (MDP) unit implementations.
//!
//! This module contains the predictors that decide whether a load may execute
//! speculatively ahead of older stores with unresolved addresses: the
//! store-set predictor (SSIT/LFST) and a simple per-PC counter baseline.

/// Per-PC two-bit counter baseline predictor.
pub mod simple;
/// Store-set dependence predictor (SSIT/LFST).
pub mod store_set;

pub use self::simple::SimplePredictor;
pub use self::store_set::StoreSetPredictor;

use crate::common::SeqNum;
use crate::config::{Config, PredictorKind};

/// Outcome of a load dependence prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadPrediction {
    /// Whether the load may execute speculatively now.
    pub speculate: bool,
    /// In-flight store the load should wait for, when speculation is denied.
    pub wait_for: Option<SeqNum>,
}

/// Statistics exported by a dependence predictor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PredictorStats {
    /// Total load predictions made.
    pub predictions: u64,
    /// Speculative loads validated as correct.
    pub correct: u64,
    /// Ordering violations reported.
    pub violations: u64,
    /// SSIT entries currently mapped to a store set.
    pub active_sets: usize,
    /// Store sets with an in-flight store in the LFST.
    pub pending_stores: usize,
}

impl PredictorStats {
    /// Fraction of predictions validated as correct, as a percentage.
    pub fn accuracy(&self) -> f64 {
        if self.predictions == 0 {
            0.0
        } else {
            self.correct as f64 / self.predictions as f64 * 100.0
        }
    }
}

/// Common interface for memory dependence predictors.
pub trait DependencePredictor {
    /// Predicts whether a load at `pc` may execute speculatively.
    fn predict_load(&mut self, pc: u64) -> LoadPrediction;

    /// Registers an issued store so same-set loads can wait for it.
    fn register_store(&mut self, pc: u64, seq: SeqNum);

    /// Clears a store's in-flight tracking when it commits.
    fn clear_store(&mut self, pc: u64);

    /// Reports an ordering violation between a load and a store.
    fn report_violation(&mut self, load_pc: u64, store_pc: u64);

    /// Reports that a speculative load was validated as correct.
    fn report_correct(&mut self, load_pc: u64);

    /// Returns the predictor's statistics.
    fn stats(&self) -> PredictorStats;
}

/// Enum wrapper for static dispatch of dependence predictors.
/// This avoids vtable lookups in the per-cycle execute loop.
#[derive(Debug)]
pub enum PredictorWrapper {
    /// Store-set predictor.
    StoreSet(StoreSetPredictor),
    /// Per-PC counter baseline.
    Simple(SimplePredictor),
}

impl PredictorWrapper {
    /// Creates a predictor based on configuration.
    pub fn new(config: &Config) -> Self {
        match config.predictor.kind {
            PredictorKind::StoreSet => Self::StoreSet(StoreSetPredictor::new(
                config.predictor.ssit_size,
                config.predictor.max_store_sets,
            )),
            PredictorKind::Simple => {
                Self::Simple(SimplePredictor::new(config.predictor.counter_table_size))
            }
        }
    }
}

impl DependencePredictor for PredictorWrapper {
    #[inline]
    fn predict_load(&mut self, pc: u64) -> LoadPrediction {
        match self {
            Self::StoreSet(p) => p.predict_load(pc),
            Self::Simple(p) => p.predict_load(pc),
        }
    }

    #[inline]
    fn register_store(&mut self, pc: u64, seq: SeqNum) {
        match self {
            Self::StoreSet(p) => p.register_store(pc, seq),
            Self::Simple(p) => p.register_store(pc, seq),
        }
    }

    #[inline]
    fn clear_store(&mut self, pc: u64) {
        match self {
            Self::StoreSet(p) => p.clear_store(pc),
            Self::Simple(p) => p.clear_store(pc),
        }
    }

    #[inline]
    fn report_violation(&mut self, load_pc: u64, store_pc: u64) {
        match self {
            Self::StoreSet(p) => p.report_violation(load_pc, store_pc),
            Self::Simple(p) => p.report_violation(load_pc, store_pc),
        }
    }

    #[inline]
    fn report_correct(&mut self, load_pc: u64) {
        match self {
            Self::StoreSet(p) => p.report_correct(load_pc),
            Self::Simple(p) => p.report_correct(load_pc),
        }
    }

    #[inline]
    fn stats(&self) -> PredictorStats {
        match self {
            Self::StoreSet(p) => p.stats(),
            Self::Simple(p) => p.stats(),
        }
    }
}
