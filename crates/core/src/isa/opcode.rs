//! Opcode enumeration and classification.
//!
//! The opcode set is closed; anything outside it is rejected by the parser
//! before a `Program` exists. Classification predicates are pure functions
//! of the opcode and drive issue (which pool a station comes from), dispatch
//! (which FU class executes it), and operand capture (whether a second
//! source register participates).

use std::fmt;

/// The closed MIPS-like opcode set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Load word (32-bit, sign-extended into an integer register).
    Lw,
    /// Load double (64-bit, into an FP register).
    Ld,
    /// Store word (low 32 bits of an integer register).
    Sw,
    /// Store double (an FP register).
    Sd,

    /// Integer add.
    Dadd,
    /// Integer subtract.
    Dsub,
    /// Integer add immediate.
    Daddi,
    /// Integer subtract immediate.
    Dsubi,
    /// Integer multiply.
    Dmul,
    /// Integer divide (divide-by-zero yields 0 with a warning).
    Ddiv,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive-or.
    Xor,
    /// Set on less than (signed compare).
    Slt,
    /// Shift left logical (shift amount from the second source, masked to 6 bits).
    Dsll,
    /// Shift right logical.
    Dsrl,

    /// FP add, double precision.
    AddD,
    /// FP subtract, double precision.
    SubD,
    /// FP multiply, double precision.
    MulD,
    /// FP divide, double precision (IEEE inf/NaN on divide-by-zero).
    DivD,
    /// FP add, single precision (executes on the double path).
    AddS,
    /// FP subtract, single precision (executes on the double path).
    SubS,
    /// FP multiply, single precision (executes on the double path).
    MulS,
    /// FP divide, single precision (executes on the double path).
    DivS,

    /// Branch if equal.
    Beq,
    /// Branch if not equal.
    Bne,
}

impl Opcode {
    /// Memory read (`LW`, `L.D`).
    pub fn is_load(self) -> bool {
        matches!(self, Self::Lw | Self::Ld)
    }

    /// Memory write (`SW`, `S.D`).
    pub fn is_store(self) -> bool {
        matches!(self, Self::Sw | Self::Sd)
    }

    /// FP add/subtract class (single precision included).
    pub fn is_fp_add_sub(self) -> bool {
        matches!(self, Self::AddD | Self::SubD | Self::AddS | Self::SubS)
    }

    /// FP multiply/divide class (single precision included).
    pub fn is_fp_mul_div(self) -> bool {
        matches!(self, Self::MulD | Self::DivD | Self::MulS | Self::DivS)
    }

    /// Integer ALU class (arithmetic, logical, shift, compare).
    pub fn is_int_arith(self) -> bool {
        matches!(
            self,
            Self::Dadd
                | Self::Dsub
                | Self::Daddi
                | Self::Dsubi
                | Self::Dmul
                | Self::Ddiv
                | Self::And
                | Self::Or
                | Self::Xor
                | Self::Slt
                | Self::Dsll
                | Self::Dsrl
        )
    }

    /// Branch class (`BEQ`, `BNE`).
    pub fn is_branch(self) -> bool {
        matches!(self, Self::Beq | Self::Bne)
    }

    /// True when the operation reads a second source register.
    ///
    /// Immediate forms take their second operand from the instruction, and
    /// loads/stores address memory through the base register instead, so
    /// neither binds `Vk`/`Qk`.
    pub fn uses_second_source(self) -> bool {
        if self.is_branch() {
            return true;
        }
        self.is_fp_add_sub()
            || self.is_fp_mul_div()
            || matches!(
                self,
                Self::Dadd
                    | Self::Dsub
                    | Self::Dmul
                    | Self::Ddiv
                    | Self::And
                    | Self::Or
                    | Self::Xor
                    | Self::Slt
                    | Self::Dsll
                    | Self::Dsrl
            )
    }

    /// True for the immediate integer forms (`DADDI`, `DSUBI`).
    pub fn uses_immediate(self) -> bool {
        matches!(self, Self::Daddi | Self::Dsubi)
    }

    /// Bytes moved by a memory operation (0 for non-memory opcodes).
    pub fn access_bytes(self) -> usize {
        match self {
            Self::Lw | Self::Sw => 4,
            Self::Ld | Self::Sd => 8,
            _ => 0,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Lw => "LW",
            Self::Ld => "L.D",
            Self::Sw => "SW",
            Self::Sd => "S.D",
            Self::Dadd => "DADD",
            Self::Dsub => "DSUB",
            Self::Daddi => "DADDI",
            Self::Dsubi => "DSUBI",
            Self::Dmul => "DMUL",
            Self::Ddiv => "DDIV",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Slt => "SLT",
            Self::Dsll => "DSLL",
            Self::Dsrl => "DSRL",
            Self::AddD => "ADD.D",
            Self::SubD => "SUB.D",
            Self::MulD => "MUL.D",
            Self::DivD => "DIV.D",
            Self::AddS => "ADD.S",
            Self::SubS => "SUB.S",
            Self::MulS => "MUL.S",
            Self::DivS => "DIV.S",
            Self::Beq => "BEQ",
            Self::Bne => "BNE",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
