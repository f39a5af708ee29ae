//! Issue stage: admit one instruction into the backend.
//!
//! Issue checks every structural resource before allocating any, so a stall
//! leaves no residue:
//! 1. The ROB must have a free slot; memory operations also need an LSQ slot.
//! 2. A fresh sequence number is assigned (monotonic, never reused).
//! 3. Memory operations get an LSQ entry; stores additionally register with
//!    the dependence predictor; fences join the in-flight fence list.

use crate::common::{SeqNum, Stall};
use crate::config::defaults;
use crate::core::pipeline::lsq::{Lsq, MemOpKind};
use crate::core::pipeline::rob::Rob;
use crate::core::units::lsu::fence::MemoryFence;
use crate::core::units::mdp::{DependencePredictor, PredictorWrapper};
use crate::isa::{InstrKind, Instruction};

/// Attempts to issue one instruction. Returns the assigned sequence number,
/// or the structural stall the caller should retry after.
pub(crate) fn issue_stage(
    instr: Instruction,
    rob: &mut Rob,
    lsq: &mut Lsq,
    predictor: &mut PredictorWrapper,
    fences: &mut Vec<MemoryFence>,
    next_seq: &mut SeqNum,
    trace: bool,
) -> Result<SeqNum, Stall> {
    if rob.is_full() {
        return Err(Stall::RobFull);
    }

    let mem_kind = match instr.kind {
        InstrKind::Load => Some(MemOpKind::Load),
        InstrKind::Store => Some(MemOpKind::Store),
        _ => None,
    };
    if mem_kind.is_some() && lsq.is_full() {
        return Err(Stall::LsqFull);
    }

    let seq = *next_seq;
    *next_seq = next_seq.next();

    let lsq_index =
        mem_kind.and_then(|kind| lsq.allocate(seq, instr.pc, kind, defaults::ACCESS_BYTES));

    if instr.kind == InstrKind::Store {
        predictor.register_store(instr.pc, seq);
    }
    if let InstrKind::Fence(kind) = instr.kind {
        fences.push(MemoryFence::new(kind, seq));
    }

    if trace {
        eprintln!("IS  pc={:#x} seq={} {:?}", instr.pc, seq, instr.kind);
    }

    let _ = rob.allocate(seq, instr, lsq_index); // capacity checked above
    Ok(seq)
}
