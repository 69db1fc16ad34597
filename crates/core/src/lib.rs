//! Cycle-accurate Tomasulo dynamic-scheduling simulator core.
//!
//! This crate implements the out-of-order core of a Tomasulo machine for a
//! MIPS-like instruction subset, with the following:
//! 1. **Core:** Reservation stations, load/store buffers, branch handlers,
//!    functional and address units, a single Common Data Bus, and the
//!    per-cycle scheduler that drives them in a fixed phase order.
//! 2. **Memory:** Byte-addressable backing memory behind a direct-mapped
//!    write-back, write-allocate data cache with configurable timing.
//! 3. **ISA:** The closed MIPS-like opcode set (loads/stores, integer ALU,
//!    FP add/sub and mul/div, `BEQ`/`BNE`) with classification predicates.
//! 4. **Simulation:** `Simulator` run loop, initial-state seeding,
//!    per-cycle `CycleSnapshot` records, and statistics.
//!
//! The assembly parser, configuration front-end, and table UI are external
//! collaborators: they supply a [`Program`] and a [`CoreConfig`] and consume
//! [`CycleSnapshot`]s.

/// Common types (tags, registers, values, errors).
pub mod common;
/// Core configuration (defaults, hierarchical structures, validation).
pub mod config;
/// Microarchitectural core (register file, stations, buffers, scheduler).
pub mod core;
/// Instruction set (opcodes, instructions, programs).
pub mod isa;
/// Memory subsystem (backing memory, data cache).
pub mod mem;
/// Simulation driver (initial state, run loop).
pub mod sim;
/// Per-cycle snapshots and the phase log.
pub mod snapshot;
/// Statistics counters.
pub mod stats;

/// Root configuration type; use `CoreConfig::default()` or deserialize from JSON.
pub use crate::config::CoreConfig;
/// The simulated core; construct with [`Core::new`] and drive with `step()`.
pub use crate::core::Core;
/// Decoded instruction record.
pub use crate::isa::Instruction;
/// Ordered, validated instruction list.
pub use crate::isa::Program;
/// Initial register and memory seeding.
pub use crate::sim::InitialState;
/// Top-level simulator; owns the core and the run loop.
pub use crate::sim::Simulator;
/// Immutable per-cycle record consumed by the external UI.
pub use crate::snapshot::CycleSnapshot;
