//! Simple per-PC dependence predictor.
//!
//! A baseline: one 2-bit saturating counter per hashed PC, initialized
//! optimistic. A load speculates while its counter stays at 2 or above;
//! violations decrement, validated speculations increment. The predictor
//! keeps no store tracking at all.

use crate::common::SeqNum;
use crate::config::defaults;

use super::{DependencePredictor, LoadPrediction, PredictorStats};

/// Simple predictor state.
#[derive(Debug)]
pub struct SimplePredictor {
    /// Per-PC 2-bit saturating counters.
    counters: Vec<u8>,
    predictions: u64,
    correct: u64,
    violations: u64,
}

impl SimplePredictor {
    /// Creates a predictor with the given counter table size.
    pub fn new(table_size: usize) -> Self {
        Self {
            counters: vec![defaults::CONFIDENCE_MAX; table_size.max(1)],
            predictions: 0,
            correct: 0,
            violations: 0,
        }
    }

    /// Hashes a PC to its counter index.
    #[inline]
    fn index(&self, pc: u64) -> usize {
        ((pc >> 2) as usize) % self.counters.len()
    }

    /// Returns the counter value for a PC.
    pub fn counter(&self, pc: u64) -> u8 {
        self.counters[self.index(pc)]
    }

    /// Predicts speculation for a load: counter >= 2 means speculate.
    pub fn should_speculate(&mut self, pc: u64) -> bool {
        self.predictions += 1;
        self.counters[self.index(pc)] >= 2
    }
}

impl Default for SimplePredictor {
    fn default() -> Self {
        Self::new(defaults::COUNTER_TABLE_SIZE)
    }
}

impl DependencePredictor for SimplePredictor {
    fn predict_load(&mut self, pc: u64) -> LoadPrediction {
        LoadPrediction {
            speculate: self.should_speculate(pc),
            wait_for: None,
        }
    }

    /// No store tracking in the baseline predictor.
    fn register_store(&mut self, _pc: u64, _seq: SeqNum) {}

    /// No store tracking in the baseline predictor.
    fn clear_store(&mut self, _pc: u64) {}

    fn report_violation(&mut self, load_pc: u64, _store_pc: u64) {
        self.violations += 1;
        let idx = self.index(load_pc);
        self.counters[idx] = self.counters[idx].saturating_sub(1);
    }

    fn report_correct(&mut self, load_pc: u64) {
        self.correct += 1;
        let idx = self.index(load_pc);
        self.counters[idx] = (self.counters[idx] + 1).min(defaults::CONFIDENCE_MAX);
    }

    fn stats(&self) -> PredictorStats {
        PredictorStats {
            predictions: self.predictions,
            correct: self.correct,
            violations: self.violations,
            active_sets: 0,
            pending_stores: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_optimistic() {
        let mut p = SimplePredictor::default();
        assert!(p.should_speculate(0x1000));
    }

    #[test]
    fn test_violations_train_toward_waiting() {
        let mut p = SimplePredictor::default();
        p.report_violation(0x1000, 0x2000);
        assert!(p.should_speculate(0x1000), "counter 2 still speculates");
        p.report_violation(0x1000, 0x2000);
        assert!(!p.should_speculate(0x1000), "counter 1 waits");
    }

    #[test]
    fn test_correct_speculation_retrains() {
        let mut p = SimplePredictor::default();
        for _ in 0..4 {
            p.report_violation(0x1000, 0x2000);
        }
        assert_eq!(p.counter(0x1000), 0);
        p.report_correct(0x1000);
        p.report_correct(0x1000);
        assert!(p.should_speculate(0x1000));
    }

    #[test]
    fn test_counters_stay_in_bounds() {
        let mut p = SimplePredictor::new(16);
        for _ in 0..10 {
            p.report_correct(0x1000);
        }
        assert_eq!(p.counter(0x1000), defaults::CONFIDENCE_MAX);
        for _ in 0..10 {
            p.report_violation(0x1000, 0);
        }
        assert_eq!(p.counter(0x1000), 0);
    }
}
