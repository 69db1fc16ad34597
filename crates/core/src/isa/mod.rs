//! Instruction set: opcodes, instruction records, and programs.
//!
//! The subset modeled is MIPS-like: word and double loads/stores, integer
//! arithmetic/logical/shift/compare operations, FP add/sub and mul/div in
//! single and double precision, and the `BEQ`/`BNE` branches. The assembly
//! text parser is an external collaborator; it hands the core a finished
//! [`Program`] of [`Instruction`] records.

/// Instruction record and disassembly.
pub mod instruction;
/// Opcode enumeration and classification predicates.
pub mod opcode;
/// Ordered, validated instruction list.
pub mod program;

pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::Program;
