//! Decoded instruction record.
//!
//! An `Instruction` is the immutable unit the frontend queues and the core
//! issues: an opcode plus up to seven fields (destination, two sources, base
//! register, offset, immediate). Constructors exist per instruction shape so
//! tests and the external parser cannot build ill-formed records, and
//! `Display` renders the conventional assembly form for logs and snapshots.

use std::fmt;

use crate::common::Reg;
use crate::isa::Opcode;

/// A decoded, immutable instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Operation.
    pub opcode: Opcode,
    /// Destination register (absent for stores and branches).
    pub dest: Option<Reg>,
    /// First source register.
    pub src1: Option<Reg>,
    /// Second source register (absent for immediate forms, loads, stores).
    pub src2: Option<Reg>,
    /// Base register of a memory operation.
    pub base: Option<Reg>,
    /// Byte offset of a memory operation.
    pub offset: i64,
    /// Immediate operand; for branches, the absolute target instruction index.
    pub immediate: i64,
}

impl Instruction {
    /// Three-register ALU form (`DADD R1, R2, R3`, `ADD.D F1, F2, F3`, ...).
    ///
    /// # Panics
    ///
    /// Panics if the opcode does not read two source registers.
    pub fn alu(opcode: Opcode, dest: Reg, src1: Reg, src2: Reg) -> Self {
        assert!(
            opcode.uses_second_source() && !opcode.is_branch(),
            "{opcode} is not a three-register form"
        );
        Self {
            opcode,
            dest: Some(dest),
            src1: Some(src1),
            src2: Some(src2),
            base: None,
            offset: 0,
            immediate: 0,
        }
    }

    /// Immediate ALU form (`DADDI R1, R2, imm`).
    ///
    /// # Panics
    ///
    /// Panics if the opcode is not an immediate form.
    pub fn alu_imm(opcode: Opcode, dest: Reg, src1: Reg, immediate: i64) -> Self {
        assert!(opcode.uses_immediate(), "{opcode} is not an immediate form");
        Self {
            opcode,
            dest: Some(dest),
            src1: Some(src1),
            src2: None,
            base: None,
            offset: 0,
            immediate,
        }
    }

    /// Load form (`L.D F6, 0(R2)`).
    ///
    /// # Panics
    ///
    /// Panics if the opcode is not a load.
    pub fn load(opcode: Opcode, dest: Reg, base: Reg, offset: i64) -> Self {
        assert!(opcode.is_load(), "{opcode} is not a load");
        Self {
            opcode,
            dest: Some(dest),
            src1: None,
            src2: None,
            base: Some(base),
            offset,
            immediate: 0,
        }
    }

    /// Store form (`S.D F6, 8(R2)`); `src` supplies the stored value.
    ///
    /// # Panics
    ///
    /// Panics if the opcode is not a store.
    pub fn store(opcode: Opcode, src: Reg, base: Reg, offset: i64) -> Self {
        assert!(opcode.is_store(), "{opcode} is not a store");
        Self {
            opcode,
            dest: None,
            src1: Some(src),
            src2: None,
            base: Some(base),
            offset,
            immediate: 0,
        }
    }

    /// Branch form (`BEQ R1, R2, target`); `target` is an instruction index.
    ///
    /// # Panics
    ///
    /// Panics if the opcode is not a branch.
    pub fn branch(opcode: Opcode, src1: Reg, src2: Reg, target: usize) -> Self {
        assert!(opcode.is_branch(), "{opcode} is not a branch");
        Self {
            opcode,
            dest: None,
            src1: Some(src1),
            src2: Some(src2),
            base: None,
            offset: 0,
            immediate: target as i64,
        }
    }

    /// Branch target instruction index (branches only).
    pub fn branch_target(&self) -> usize {
        self.immediate as usize
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode;
        if op.is_load() {
            if let (Some(d), Some(b)) = (self.dest, self.base) {
                return write!(f, "{op} {d}, {}({b})", self.offset);
            }
        } else if op.is_store() {
            if let (Some(s), Some(b)) = (self.src1, self.base) {
                return write!(f, "{op} {s}, {}({b})", self.offset);
            }
        } else if op.is_branch() {
            if let (Some(a), Some(b)) = (self.src1, self.src2) {
                return write!(f, "{op} {a}, {b}, {}", self.immediate);
            }
        } else if op.uses_immediate() {
            if let (Some(d), Some(a)) = (self.dest, self.src1) {
                return write!(f, "{op} {d}, {a}, {}", self.immediate);
            }
        } else if let (Some(d), Some(a), Some(b)) = (self.dest, self.src1, self.src2) {
            return write!(f, "{op} {d}, {a}, {b}");
        }
        write!(f, "{op}")
    }
}
