//! Instruction records ingested by the pipeline.
//!
//! The model is ISA-agnostic: an instruction is a program counter, a kind,
//! up to two source registers, an optional destination register, and an
//! immediate. Loads compute `address = regs[rs1] + imm`; stores compute
//! `address = regs[rs1] + imm` and `data = regs[rs2]`.

use crate::core::units::lsu::fence::FenceKind;

/// Instruction category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InstrKind {
    /// Memory read into a destination register.
    Load,
    /// Memory write of a source register.
    Store,
    /// Register-to-register arithmetic (sum of sources plus immediate).
    #[default]
    Alu,
    /// Control transfer. Ignored by this model; completes immediately.
    Branch,
    /// Memory ordering barrier of the given kind.
    Fence(FenceKind),
}

/// A single instruction as presented to `Pipeline::issue`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Instruction {
    /// Program counter.
    pub pc: u64,
    /// Instruction category.
    pub kind: InstrKind,
    /// Destination register index, if the instruction writes one.
    pub rd: Option<usize>,
    /// First source register (address base for memory operations).
    pub rs1: Option<usize>,
    /// Second source register (store data source).
    pub rs2: Option<usize>,
    /// Sign-extended immediate (address offset for memory operations).
    pub imm: i64,
}

impl Instruction {
    /// A load: `rd <- mem[regs[base] + imm]`.
    pub fn load(pc: u64, rd: usize, base: usize, imm: i64) -> Self {
        Self {
            pc,
            kind: InstrKind::Load,
            rd: Some(rd),
            rs1: Some(base),
            rs2: None,
            imm,
        }
    }

    /// A store: `mem[regs[base] + imm] <- regs[src]`.
    pub fn store(pc: u64, base: usize, src: usize, imm: i64) -> Self {
        Self {
            pc,
            kind: InstrKind::Store,
            rd: None,
            rs1: Some(base),
            rs2: Some(src),
            imm,
        }
    }

    /// An ALU operation: `rd <- regs[rs1] + regs[rs2] + imm`.
    pub fn alu(pc: u64, rd: usize, rs1: Option<usize>, rs2: Option<usize>, imm: i64) -> Self {
        Self {
            pc,
            kind: InstrKind::Alu,
            rd: Some(rd),
            rs1,
            rs2,
            imm,
        }
    }

    /// A branch. The model ignores control flow; branches retire as no-ops.
    pub fn branch(pc: u64) -> Self {
        Self {
            pc,
            kind: InstrKind::Branch,
            ..Self::default()
        }
    }

    /// A memory fence of the given kind.
    pub fn fence(pc: u64, kind: FenceKind) -> Self {
        Self {
            pc,
            kind: InstrKind::Fence(kind),
            ..Self::default()
        }
    }

    /// Returns true for operations that occupy a Load/Store Queue slot.
    #[inline]
    pub fn is_mem(&self) -> bool {
        matches!(self.kind, InstrKind::Load | InstrKind::Store)
    }
}
