//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the disambiguation model. It
//! provides:
//! 1. **Cycle and IPC:** Total cycles, committed instructions, and derived IPC.
//! 2. **Memory speculation:** Load/store execution, forwarding, and violation
//!    counts.
//! 3. **Prediction:** The predictor's lookup/correct/violation counters and
//!    table occupancy, merged into one report.

use crate::core::units::mdp::PredictorStats;

/// Raw pipeline counters, updated in place by the stages.
///
/// All counters are monotonically non-decreasing over a run.
#[derive(Clone, Debug, Default)]
pub struct SimStats {
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_committed: u64,
    /// Number of loads that finished execution (forwarded or speculated).
    pub loads_executed: u64,
    /// Number of stores that finished execution.
    pub stores_executed: u64,
    /// Commit-time speculation violations detected.
    pub speculation_violations: u64,
    /// Store-to-load forwarding events at execute.
    pub forwarding_events: u64,
}

impl SimStats {
    /// Instructions committed per cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_committed as f64 / self.cycles as f64
        }
    }
}

/// Combined statistics report returned by `Pipeline::stats`.
#[derive(Clone, Debug)]
pub struct StatsReport {
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed.
    pub instructions_committed: u64,
    /// Number of loads that finished execution.
    pub loads_executed: u64,
    /// Number of stores that finished execution.
    pub stores_executed: u64,
    /// Commit-time speculation violations detected.
    pub speculation_violations: u64,
    /// Store-to-load forwarding events.
    pub forwarding_events: u64,
    /// Instructions committed per cycle.
    pub ipc: f64,
    /// Dependence predictor counters.
    pub predictor: PredictorStats,
}

impl StatsReport {
    /// Assembles a report from the raw counters and predictor statistics.
    pub fn new(stats: &SimStats, predictor: PredictorStats) -> Self {
        Self {
            cycles: stats.cycles,
            instructions_committed: stats.instructions_committed,
            loads_executed: stats.loads_executed,
            stores_executed: stats.stores_executed,
            speculation_violations: stats.speculation_violations,
            forwarding_events: stats.forwarding_events,
            ipc: stats.ipc(),
            predictor,
        }
    }

    /// Prints the report to stdout as an aligned key-value table.
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("MEMORY DISAMBIGUATION SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", self.instructions_committed);
        println!("sim_ipc                  {:.4}", self.ipc);
        println!("----------------------------------------------------------");
        println!("MEMORY SPECULATION");
        println!("  mem.loads              {}", self.loads_executed);
        println!("  mem.stores             {}", self.stores_executed);
        println!("  mem.forwards           {}", self.forwarding_events);
        println!("  mem.violations         {}", self.speculation_violations);
        println!("----------------------------------------------------------");
        println!("DEPENDENCE PREDICTION");
        println!("  mdp.lookups            {}", self.predictor.predictions);
        println!("  mdp.correct            {}", self.predictor.correct);
        println!("  mdp.violations         {}", self.predictor.violations);
        println!("  mdp.accuracy           {:.2}%", self.predictor.accuracy());
        println!("  mdp.active_sets        {}", self.predictor.active_sets);
        println!("  mdp.pending_stores     {}", self.predictor.pending_stores);
        println!("==========================================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipc_guards_zero_cycles() {
        let stats = SimStats::default();
        assert!((stats.ipc() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_derives_ipc() {
        let stats = SimStats {
            cycles: 8,
            instructions_committed: 4,
            ..SimStats::default()
        };
        let report = StatsReport::new(&stats, PredictorStats::default());
        assert!((report.ipc - 0.5).abs() < f64::EPSILON);
    }
}
