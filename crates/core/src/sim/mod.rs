//! Simulation driver: initial state and the run loop.
//!
//! The core itself only knows how to `step()`. This module supplies the
//! pieces a caller needs around that: seeding registers and memory before
//! the first cycle, running to completion under a safety cap, and reading
//! the terminal state.

/// Initial register and memory state.
pub mod loader;
/// Top-level simulator and run loop.
pub mod simulator;

pub use loader::InitialState;
pub use simulator::{RunSummary, Simulator};
