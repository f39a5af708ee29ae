//! Commit stage: retire the ROB head in program order.
//!
//! One instruction commits per cycle:
//! 1. **Speculative loads** are re-validated against the LSQ. If a covering
//!    older store now exists with different data, the speculation was wrong:
//!    the predictor learns the pair, everything at or above the load's
//!    sequence number is squashed from ROB and LSQ, and the PC rewinds to
//!    the load for refetch. Correct speculation trains the predictor up.
//! 2. **Stores** write the memory model — exactly once, here — and clear
//!    their predictor tracking. Their LSQ entries linger (marked committed)
//!    while a younger in-flight load could still validate against them.
//! 3. **Fences** leave the in-flight fence list.
//!
//! After the commit attempt, committed LSQ entries that no pending load can
//! still observe are reclaimed from the head.

use crate::core::memory::MemoryModel;
use crate::core::pipeline::lsq::{Lsq, MemOpKind};
use crate::core::pipeline::rob::{Rob, RobEntry};
use crate::core::units::lsu::fence::MemoryFence;
use crate::core::units::mdp::{DependencePredictor, PredictorWrapper};
use crate::isa::InstrKind;
use crate::stats::SimStats;

/// Attempts to commit the ROB head. Returns the redirect PC when a
/// speculation violation forced a squash.
pub(crate) fn commit_stage(
    rob: &mut Rob,
    lsq: &mut Lsq,
    predictor: &mut PredictorWrapper,
    fences: &mut Vec<MemoryFence>,
    memory: &mut MemoryModel,
    stats: &mut SimStats,
    trace: bool,
) -> Option<u64> {
    let mut redirect = None;

    if let Some(entry) = rob.commit_head() {
        match entry.instr.kind {
            InstrKind::Load if entry.speculative => {
                if let Some(store_pc) = validate_load(&entry, lsq) {
                    stats.speculation_violations += 1;
                    tracing::debug!(
                        load_pc = entry.instr.pc,
                        store_pc,
                        seq = entry.seq.0,
                        "speculation violation, squashing"
                    );
                    if trace {
                        eprintln!(
                            "CM  pc={:#x} seq={} LOAD * VIOLATION (store pc={store_pc:#x})",
                            entry.instr.pc, entry.seq
                        );
                    }
                    predictor.report_violation(entry.instr.pc, store_pc);
                    rob.squash_from(entry.seq);
                    lsq.squash_from(entry.seq);
                    fences.retain(|f| f.seq < entry.seq);
                    redirect = Some(entry.instr.pc);
                } else {
                    predictor.report_correct(entry.instr.pc);
                    retire(lsq, &entry, stats, trace);
                }
            }

            InstrKind::Load => retire(lsq, &entry, stats, trace),

            InstrKind::Store => {
                if let (Some(addr), Some(data)) = (entry.address, entry.data) {
                    memory.write(addr, data);
                    if trace {
                        eprintln!(
                            "CM  pc={:#x} seq={} STORE [{addr:#x}] <= {data:#x}",
                            entry.instr.pc, entry.seq
                        );
                    }
                }
                predictor.clear_store(entry.instr.pc);
                retire(lsq, &entry, stats, trace);
            }

            InstrKind::Fence(_) => {
                fences.retain(|f| f.seq != entry.seq);
                retire(lsq, &entry, stats, trace);
            }

            InstrKind::Alu | InstrKind::Branch => retire(lsq, &entry, stats, trace),
        }
    }

    reclaim_committed(rob, lsq);
    redirect
}

/// Re-checks a committed speculative load against the LSQ.
///
/// Returns the conflicting store's PC when a covering older store holds
/// different data than the load observed.
fn validate_load(entry: &RobEntry, lsq: &Lsq) -> Option<u64> {
    let li = entry.lsq_index?;
    let dep = lsq.check_dependency(li);
    let data = dep.forward_data?;
    if Some(data) == entry.data {
        return None;
    }
    dep.forward_index.and_then(|i| lsq.entry(i)).map(|e| e.pc)
}

/// Counts a committed instruction and marks its LSQ entry committed.
fn retire(lsq: &mut Lsq, entry: &RobEntry, stats: &mut SimStats, trace: bool) {
    if let Some(li) = entry.lsq_index {
        lsq.mark_committed(li);
    }
    stats.instructions_committed += 1;
    if trace && entry.instr.kind != InstrKind::Store {
        eprintln!("CM  pc={:#x} seq={} COMMIT", entry.instr.pc, entry.seq);
    }
}

/// Reclaims committed LSQ entries from the head.
///
/// A committed store must stay visible while any load remains in the ROB:
/// that load may have executed before the store committed and still needs
/// the store's data and PC for commit-time validation. Committed loads are
/// never forwarding sources and can always go.
fn reclaim_committed(rob: &Rob, lsq: &mut Lsq) {
    let load_pending = rob
        .iter()
        .any(|e| matches!(e.instr.kind, InstrKind::Load));
    while let Some(head) = lsq.peek_head() {
        if !head.committed {
            break;
        }
        if load_pending && head.kind != MemOpKind::Load {
            break;
        }
        let _ = lsq.commit_head();
    }
}
