//! Simulator: owns the pipeline and the program image side-by-side.
//!
//! The pipeline's external surface is `issue`/`tick`/`stats`; something must
//! still decide *what* to issue. The simulator keeps a PC-indexed program
//! image and completes each cycle's commit → execute → issue sequence by
//! fetching at the pipeline's PC. Because fetch follows the PC, a violation
//! recovery (which rewinds the PC to the violating load) naturally refills
//! the squashed instructions.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::core::pipeline::engine::Pipeline;
use crate::isa::Instruction;
use crate::stats::StatsReport;

/// Instruction width in bytes; fetch advances the PC by this much.
const INSTR_BYTES: u64 = 4;

/// Top-level simulator: pipeline state plus a program image.
#[derive(Debug)]
pub struct Simulator {
    /// Pipeline state (ROB, LSQ, predictor, registers, memory).
    pub pipeline: Pipeline,
    program: BTreeMap<u64, Instruction>,
}

impl Simulator {
    /// Creates a simulator with an empty program.
    pub fn new(config: &Config) -> Self {
        Self {
            pipeline: Pipeline::new(config),
            program: BTreeMap::new(),
        }
    }

    /// Loads instructions into the program image, keyed by PC, and points
    /// the fetch PC at the lowest loaded address.
    pub fn load_program(&mut self, instrs: impl IntoIterator<Item = Instruction>) {
        for instr in instrs {
            let _ = self.program.insert(instr.pc, instr);
        }
        if let Some((&start, _)) = self.program.first_key_value() {
            self.pipeline.set_pc(start);
        }
    }

    /// Advances one cycle: commit, execute, then fetch and issue the
    /// instruction at the current PC (if any).
    pub fn tick(&mut self) {
        self.pipeline.tick();

        let pc = self.pipeline.pc();
        if let Some(instr) = self.program.get(&pc).cloned()
            && self.pipeline.issue(instr).is_ok()
        {
            self.pipeline.set_pc(pc + INSTR_BYTES);
        }
    }

    /// Runs until the machine drains (no in-flight work and nothing left to
    /// fetch) or `max_cycles` elapse. Returns the statistics report.
    pub fn run(&mut self, max_cycles: u64) -> StatsReport {
        for _ in 0..max_cycles {
            self.tick();
            if self.is_idle() {
                break;
            }
        }
        self.pipeline.stats()
    }

    /// True when nothing is in flight and the PC points past the program.
    pub fn is_idle(&self) -> bool {
        self.pipeline.rob().is_empty() && !self.program.contains_key(&self.pipeline.pc())
    }
}
