//! The microarchitectural core.
//!
//! Everything that holds per-cycle state lives here: the register file with
//! producer tags, the instruction queue, the reservation stations and
//! load/store buffers, the branch handlers, the functional and address
//! units, the Common Data Bus, and the scheduler that advances them all in
//! the fixed phase order.
//!
//! Structures are arena-style `Vec`s owned by [`Core`]; cross-references use
//! pool indices and [`Tag`](crate::common::Tag) identities, never pointers.

/// Branch handlers and outcomes.
pub mod branch;
/// Common Data Bus messages and arbitration.
pub mod cdb;
/// Load buffers.
pub mod load_buffer;
/// Instruction queue.
pub mod queue;
/// Register file with producer-tag renaming.
pub mod regfile;
/// The per-cycle scheduler.
pub mod scheduler;
/// Reservation stations.
pub mod station;
/// Store buffers.
pub mod store_buffer;
/// Functional and address units.
pub mod units;

pub use scheduler::Core;
