//! Store-set dependence predictor.
//!
//! Implements the two-table store-set scheme of Chrysos & Emer:
//! - **SSIT** (Store-Set ID Table): maps hashed PCs to store-set identifiers.
//!   Two PCs belong to the same set iff the SSIT maps them to the same id.
//! - **LFST** (Last-Fetched-Store Table): maps each set id to the sequence
//!   number of the youngest in-flight store of that set.
//!
//! Sets are learned online: a reported violation unions the load's and the
//! store's PCs into one set. Prediction is conservative — a load whose set
//! has an in-flight store in the LFST always waits for it, regardless of the
//! load's confidence counter. Confidence remains a learned, saturating
//! signal exposed for inspection and statistics.

use std::collections::HashMap;

use crate::common::SeqNum;
use crate::config::defaults;

use super::{DependencePredictor, LoadPrediction, PredictorStats};

/// Store-set predictor state.
#[derive(Debug)]
pub struct StoreSetPredictor {
    /// Store-Set ID Table: hashed PC -> set id.
    ssit: Vec<Option<usize>>,
    /// Last-Fetched-Store Table: set id -> youngest in-flight store.
    lfst: Vec<Option<SeqNum>>,
    /// Per-PC 2-bit speculation confidence.
    confidence: HashMap<u64, u8>,
    /// Pool of unallocated set ids.
    free_sets: Vec<usize>,
    predictions: u64,
    correct: u64,
    violations: u64,
}

impl StoreSetPredictor {
    /// Creates a predictor with the given SSIT size and store-set budget.
    pub fn new(ssit_size: usize, max_store_sets: usize) -> Self {
        let ssit_size = ssit_size.max(1);
        let max_store_sets = max_store_sets.max(1);
        Self {
            ssit: vec![None; ssit_size],
            lfst: vec![None; max_store_sets],
            confidence: HashMap::new(),
            free_sets: (0..max_store_sets).rev().collect(),
            predictions: 0,
            correct: 0,
            violations: 0,
        }
    }

    /// Hashes a PC to its SSIT index.
    #[inline]
    fn index(&self, pc: u64) -> usize {
        ((pc >> 2) as usize) % self.ssit.len()
    }

    /// Returns the store set a PC currently belongs to.
    pub fn set_of(&self, pc: u64) -> Option<usize> {
        self.ssit[self.index(pc)]
    }

    /// Returns the speculation confidence for a load PC (initially 2).
    pub fn confidence(&self, pc: u64) -> u8 {
        self.confidence
            .get(&pc)
            .copied()
            .unwrap_or(defaults::CONFIDENCE_INIT)
    }

    /// Allocates a store-set id, evicting an idle set if the pool is empty.
    ///
    /// A set is evictable only when it has no in-flight store in the LFST;
    /// eviction unbinds every SSIT entry pointing at it. When every set has
    /// an in-flight store, allocation fails and the caller learns nothing —
    /// the predictor degrades gracefully.
    fn allocate_set(&mut self) -> Option<usize> {
        if let Some(id) = self.free_sets.pop() {
            return Some(id);
        }

        let victim = (0..self.lfst.len()).find(|&id| self.lfst[id].is_none())?;
        for slot in &mut self.ssit {
            if *slot == Some(victim) {
                *slot = None;
            }
        }
        tracing::debug!(set = victim, "store set evicted for reallocation");
        Some(victim)
    }
}

impl Default for StoreSetPredictor {
    fn default() -> Self {
        Self::new(defaults::SSIT_SIZE, defaults::MAX_STORE_SETS)
    }
}

impl DependencePredictor for StoreSetPredictor {
    /// Predicts whether a load may speculate.
    ///
    /// Policy: if the load's set has an in-flight store in the LFST, wait
    /// for that store; otherwise speculate. Confidence never overrides a
    /// pending same-set store.
    fn predict_load(&mut self, pc: u64) -> LoadPrediction {
        self.predictions += 1;

        if let Some(id) = self.set_of(pc)
            && let Some(seq) = self.lfst[id]
        {
            return LoadPrediction {
                speculate: false,
                wait_for: Some(seq),
            };
        }

        LoadPrediction {
            speculate: true,
            wait_for: None,
        }
    }

    /// Records an issued store as the youngest of its set.
    ///
    /// A store whose PC has no set yet is intentionally not tracked; its set
    /// is created by the first reported violation involving it.
    fn register_store(&mut self, pc: u64, seq: SeqNum) {
        let idx = self.index(pc);
        if let Some(id) = self.ssit[idx] {
            self.lfst[id] = Some(seq);
        }
    }

    /// Drops the in-flight tracking for a committing store's set.
    fn clear_store(&mut self, pc: u64) {
        let idx = self.index(pc);
        if let Some(id) = self.ssit[idx] {
            self.lfst[id] = None;
        }
    }

    /// Unions the load's and store's PCs into one store set.
    ///
    /// Merging rewrites every SSIT entry of the store's set to the load's
    /// set and frees the vacated id. The youngest in-flight store of either
    /// set survives the merge so waiting loads keep a target.
    fn report_violation(&mut self, load_pc: u64, store_pc: u64) {
        self.violations += 1;

        let load_idx = self.index(load_pc);
        let store_idx = self.index(store_pc);

        match (self.ssit[load_idx], self.ssit[store_idx]) {
            (None, None) => {
                if let Some(id) = self.allocate_set() {
                    self.ssit[load_idx] = Some(id);
                    self.ssit[store_idx] = Some(id);
                }
            }
            (None, Some(store_set)) => self.ssit[load_idx] = Some(store_set),
            (Some(load_set), None) => self.ssit[store_idx] = Some(load_set),
            (Some(load_set), Some(store_set)) if load_set != store_set => {
                for slot in &mut self.ssit {
                    if *slot == Some(store_set) {
                        *slot = Some(load_set);
                    }
                }
                self.lfst[load_set] = self.lfst[load_set].max(self.lfst[store_set]);
                self.lfst[store_set] = None;
                if !self.free_sets.contains(&store_set) {
                    self.free_sets.push(store_set);
                }
                tracing::debug!(from = store_set, into = load_set, "store sets merged");
            }
            _ => {} // already in the same set
        }

        let conf = self.confidence(load_pc);
        let _ = self.confidence.insert(load_pc, conf.saturating_sub(1));
    }

    /// Raises the load's confidence after a validated speculation.
    fn report_correct(&mut self, load_pc: u64) {
        self.correct += 1;
        let conf = self.confidence(load_pc);
        let _ = self
            .confidence
            .insert(load_pc, (conf + 1).min(defaults::CONFIDENCE_MAX));
    }

    fn stats(&self) -> PredictorStats {
        PredictorStats {
            predictions: self.predictions,
            correct: self.correct,
            violations: self.violations,
            active_sets: self.ssit.iter().filter(|s| s.is_some()).count(),
            pending_stores: self.lfst.iter().filter(|s| s.is_some()).count(),
        }
    }
}
