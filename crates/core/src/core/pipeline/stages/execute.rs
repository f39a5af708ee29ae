//! Execute stage: resolve addresses, speculate, and forward.
//!
//! Execute visits in-flight operations in ascending sequence-number order so
//! dependency checks stay monotone within a cycle. Per kind:
//! 1. **ALU:** read sources, add the immediate, write the destination, done.
//!    Branches complete immediately with no control-flow effect. Both are
//!    isolated here so a real ALU/branch unit could replace them without
//!    touching memory disambiguation.
//! 2. **Load:** compute the address, consult the LSQ. A covering older store
//!    forwards its data and the load completes non-speculatively. Otherwise
//!    the predictor decides: speculate past unresolved stores and read
//!    memory, or stall and retry next cycle. A *resolved* overlapping store
//!    that cannot forward always stalls the load.
//! 3. **Store:** compute address and data, resolve the LSQ entry, complete.
//!    Memory is not written until commit.
//! 4. **Fence:** completes once the LSQ holds no incomplete older operation
//!    of the ordered kinds. Incomplete fences stall younger loads/stores.

use crate::common::SeqNum;
use crate::core::memory::MemoryModel;
use crate::core::pipeline::lsq::{Conflict, Lsq, MemOpKind};
use crate::core::pipeline::rob::Rob;
use crate::core::regs::RegisterFile;
use crate::core::units::lsu::fence::MemoryFence;
use crate::core::units::mdp::{DependencePredictor, PredictorWrapper};
use crate::isa::InstrKind;
use crate::stats::SimStats;

/// Computes a memory operation's effective address.
#[inline]
fn effective_address(regs: &RegisterFile, base: Option<usize>, imm: i64) -> u64 {
    base.map_or(0, |r| regs.read(r)).wrapping_add_signed(imm)
}

/// Marks the ROB entry at `idx` executed and completed, recording any
/// resolved address/data and the speculative flag.
fn finish_entry(
    rob: &mut Rob,
    idx: usize,
    address: Option<u64>,
    data: Option<u64>,
    speculative: bool,
) {
    if let Some(entry) = rob.entry_mut(idx) {
        if address.is_some() {
            entry.address = address;
        }
        if data.is_some() {
            entry.data = data;
        }
        if speculative {
            entry.speculative = true;
        }
        entry.executed = true;
        entry.completed = true;
    }
}

/// Executes every un-executed operation that is ready, oldest first.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute_stage(
    rob: &mut Rob,
    lsq: &mut Lsq,
    predictor: &mut PredictorWrapper,
    fences: &mut [MemoryFence],
    regs: &mut RegisterFile,
    memory: &MemoryModel,
    stats: &mut SimStats,
    trace: bool,
) {
    let pending: Vec<SeqNum> = rob
        .iter()
        .filter(|e| !e.executed)
        .map(|e| e.seq)
        .collect();
    for seq in pending {
        let _ = execute_entry(seq, rob, lsq, predictor, fences, regs, memory, stats, trace);
    }
}

/// Executes the in-flight operation with the given sequence number.
///
/// Returns true if the operation finished this call; false if it is stalled
/// (or already executed) and must be retried on a later cycle.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute_entry(
    seq: SeqNum,
    rob: &mut Rob,
    lsq: &mut Lsq,
    predictor: &mut PredictorWrapper,
    fences: &mut [MemoryFence],
    regs: &mut RegisterFile,
    memory: &MemoryModel,
    stats: &mut SimStats,
    trace: bool,
) -> bool {
    let Some(idx) = rob.index_of(seq) else {
        return false;
    };
    let Some(entry) = rob.entry(idx) else {
        return false;
    };
    if entry.executed {
        return false;
    }
    let instr = entry.instr.clone();
    let lsq_index = entry.lsq_index;

    match instr.kind {
        InstrKind::Alu => {
            let val = instr
                .rs1
                .map_or(0, |r| regs.read(r))
                .wrapping_add(instr.rs2.map_or(0, |r| regs.read(r)))
                .wrapping_add_signed(instr.imm);
            if let Some(rd) = instr.rd {
                regs.write(rd, val);
            }
            finish_entry(rob, idx, None, Some(val), false);
            if trace {
                eprintln!("EX  pc={:#x} seq={seq} ALU result={val:#x}", instr.pc);
            }
            true
        }

        InstrKind::Branch => {
            // Control flow is out of scope; branches retire as no-ops.
            finish_entry(rob, idx, None, None, false);
            if trace {
                eprintln!("EX  pc={:#x} seq={seq} BRANCH (ignored)", instr.pc);
            }
            true
        }

        InstrKind::Fence(_) => {
            let older_loads_done = lsq
                .iter()
                .filter(|e| e.seq < seq && e.kind == MemOpKind::Load)
                .all(|e| e.completed);
            let older_stores_done = lsq
                .iter()
                .filter(|e| e.seq < seq && matches!(e.kind, MemOpKind::Store | MemOpKind::Atomic))
                .all(|e| e.completed);

            let Some(fence) = fences.iter_mut().find(|f| f.seq == seq) else {
                // No fence record (already discarded): retire as a no-op.
                finish_entry(rob, idx, None, None, false);
                return true;
            };
            if fence.can_complete(older_loads_done, older_stores_done) {
                fence.completed = true;
                finish_entry(rob, idx, None, None, false);
                if trace {
                    eprintln!("EX  pc={:#x} seq={seq} FENCE complete", instr.pc);
                }
                true
            } else {
                false
            }
        }

        InstrKind::Load => {
            if fences.iter().any(|f| !f.completed && f.blocks_load(seq)) {
                return false;
            }
            let Some(li) = lsq_index else {
                return false;
            };
            let addr = effective_address(regs, instr.rs1, instr.imm);
            lsq.update_address(li, addr);

            let dep = lsq.check_dependency(li);
            if let Some(data) = dep.forward_data {
                // Store-to-load forwarding: complete non-speculatively.
                if let Some(rd) = instr.rd {
                    regs.write(rd, data);
                }
                lsq.mark_completed(li);
                finish_entry(rob, idx, Some(addr), Some(data), false);
                stats.forwarding_events += 1;
                stats.loads_executed += 1;
                if trace {
                    eprintln!("EX  pc={:#x} seq={seq} LOAD addr={addr:#x} FWD data={data:#x}", instr.pc);
                }
                return true;
            }

            let prediction = predictor.predict_load(instr.pc);
            // A resolved, unforwardable overlap stalls the load only while
            // the store is uncommitted; once committed its data is already
            // in memory, so reading memory is exact.
            let resolved_block = dep.conflict == Some(Conflict::Resolved)
                && dep
                    .conflict_index
                    .and_then(|i| lsq.entry(i))
                    .is_some_and(|e| !e.committed);
            if prediction.speculate && !resolved_block {
                let data = memory.read(addr);
                if let Some(rd) = instr.rd {
                    regs.write(rd, data);
                }
                lsq.mark_speculative(li);
                lsq.mark_completed(li);
                finish_entry(rob, idx, Some(addr), Some(data), true);
                stats.loads_executed += 1;
                if trace {
                    eprintln!("EX  pc={:#x} seq={seq} LOAD addr={addr:#x} SPEC data={data:#x}", instr.pc);
                }
                true
            } else {
                if trace {
                    let wait = prediction
                        .wait_for
                        .map_or(String::new(), |s| format!(" wait seq={s}"));
                    eprintln!("EX  pc={:#x} seq={seq} LOAD addr={addr:#x} STALL{wait}", instr.pc);
                }
                false
            }
        }

        InstrKind::Store => {
            if fences.iter().any(|f| !f.completed && f.blocks_store(seq)) {
                return false;
            }
            let Some(li) = lsq_index else {
                return false;
            };
            let addr = effective_address(regs, instr.rs1, instr.imm);
            let data = instr.rs2.map_or(0, |r| regs.read(r));
            lsq.update_address(li, addr);
            lsq.update_data(li, data);
            lsq.mark_completed(li);
            finish_entry(rob, idx, Some(addr), Some(data), false);
            stats.stores_executed += 1;
            if trace {
                eprintln!("EX  pc={:#x} seq={seq} STORE addr={addr:#x} data={data:#x}", instr.pc);
            }
            true
        }
    }
}
