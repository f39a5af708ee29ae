//! Three-stage pipeline driver.
//!
//! The `Pipeline` owns every piece of shared state — ROB, LSQ, dependence
//! predictor, in-flight fences, register file, and the memory model — and
//! advances them one cycle at a time in the fixed order **commit, execute**.
//! Issue is driven by the caller between ticks (the [`Simulator`] fetches
//! from a program image and issues once per cycle, completing the
//! commit → execute → issue sequence).
//!
//! Readiness is external: `tick` executes every un-executed operation in
//! ascending sequence-number order, while [`Pipeline::execute_one`] lets a
//! scheduler (or a test) execute a specific operation early, which is what
//! makes genuine out-of-order interleavings — and therefore speculation
//! violations — reachable.
//!
//! [`Simulator`]: crate::sim::simulator::Simulator

use crate::common::{SeqNum, Stall};
use crate::config::Config;
use crate::core::memory::MemoryModel;
use crate::core::pipeline::lsq::Lsq;
use crate::core::pipeline::rob::Rob;
use crate::core::pipeline::stages::{commit, execute, issue};
use crate::core::regs::RegisterFile;
use crate::core::units::lsu::fence::MemoryFence;
use crate::core::units::mdp::{DependencePredictor, PredictorWrapper};
use crate::isa::Instruction;
use crate::stats::{SimStats, StatsReport};

/// Three-stage out-of-order pipeline with memory disambiguation.
#[derive(Debug)]
pub struct Pipeline {
    rob: Rob,
    lsq: Lsq,
    predictor: PredictorWrapper,
    fences: Vec<MemoryFence>,
    regs: RegisterFile,
    memory: MemoryModel,
    pc: u64,
    next_seq: SeqNum,
    stats: SimStats,
    trace: bool,
}

impl Pipeline {
    /// Creates a pipeline from the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            rob: Rob::new(config.pipeline.rob_capacity),
            lsq: Lsq::new(config.pipeline.lsq_capacity),
            predictor: PredictorWrapper::new(config),
            fences: Vec::new(),
            regs: RegisterFile::default(),
            memory: MemoryModel::new(),
            pc: 0,
            next_seq: SeqNum(1),
            stats: SimStats::default(),
            trace: config.general.trace_instructions,
        }
    }

    /// Current fetch PC. Rewound to the violating load on recovery.
    #[inline]
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// Sets the fetch PC.
    #[inline]
    pub fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
    }

    /// Cycles elapsed.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.stats.cycles
    }

    /// Read-only view of the Reorder Buffer.
    #[inline]
    pub fn rob(&self) -> &Rob {
        &self.rob
    }

    /// Read-only view of the Load/Store Queue.
    #[inline]
    pub fn lsq(&self) -> &Lsq {
        &self.lsq
    }

    /// Read-only view of the dependence predictor.
    #[inline]
    pub fn predictor(&self) -> &PredictorWrapper {
        &self.predictor
    }

    /// The architectural register file.
    #[inline]
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Mutable access to the register file (program setup).
    #[inline]
    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// The architectural memory.
    #[inline]
    pub fn memory(&self) -> &MemoryModel {
        &self.memory
    }

    /// Mutable access to the memory (program setup).
    #[inline]
    pub fn memory_mut(&mut self) -> &mut MemoryModel {
        &mut self.memory
    }

    /// Raw pipeline counters.
    #[inline]
    pub fn sim_stats(&self) -> &SimStats {
        &self.stats
    }

    /// Admits one instruction into the ROB (and LSQ for memory operations).
    ///
    /// Returns the assigned sequence number, or the structural [`Stall`] to
    /// retry after. Stores register with the dependence predictor here.
    pub fn issue(&mut self, instr: Instruction) -> Result<SeqNum, Stall> {
        issue::issue_stage(
            instr,
            &mut self.rob,
            &mut self.lsq,
            &mut self.predictor,
            &mut self.fences,
            &mut self.next_seq,
            self.trace,
        )
    }

    /// Advances one cycle: commit the ROB head if ready, then execute every
    /// ready in-flight operation in ascending sequence-number order.
    pub fn tick(&mut self) {
        self.stats.cycles += 1;
        let redirect = commit::commit_stage(
            &mut self.rob,
            &mut self.lsq,
            &mut self.predictor,
            &mut self.fences,
            &mut self.memory,
            &mut self.stats,
            self.trace,
        );
        if let Some(pc) = redirect {
            self.pc = pc;
        }
        execute::execute_stage(
            &mut self.rob,
            &mut self.lsq,
            &mut self.predictor,
            &mut self.fences,
            &mut self.regs,
            &self.memory,
            &mut self.stats,
            self.trace,
        );
    }

    /// Executes the single in-flight operation with the given sequence
    /// number, regardless of program order.
    ///
    /// Models external readiness: a scheduler may execute a younger load
    /// before an older store has resolved, which is how a speculative load
    /// can observe stale data and trip commit-time validation. Returns true
    /// if the operation finished; false if it is stalled or unknown.
    pub fn execute_one(&mut self, seq: SeqNum) -> bool {
        execute::execute_entry(
            seq,
            &mut self.rob,
            &mut self.lsq,
            &mut self.predictor,
            &mut self.fences,
            &mut self.regs,
            &self.memory,
            &mut self.stats,
            self.trace,
        )
    }

    /// Assembles the combined statistics report.
    pub fn stats(&self) -> StatsReport {
        StatsReport::new(&self.stats, self.predictor.stats())
    }
}
