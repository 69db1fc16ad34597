//! Top-level simulator: owns the core and drives the run loop.
//!
//! The core does not detect infinite loops itself; `run` imposes the
//! caller's cycle cap and reports whether the machine drained. Snapshots
//! stream out of `step` one per cycle; `run` keeps only the last one so
//! long simulations stay cheap. Callers that want every snapshot call
//! `step` themselves.

use crate::common::ConfigError;
use crate::config::CoreConfig;
use crate::core::Core;
use crate::isa::Program;
use crate::sim::InitialState;
use crate::snapshot::CycleSnapshot;

/// Result of a capped run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Cycles actually stepped.
    pub cycles: u64,
    /// True when the machine drained before the cap.
    pub finished: bool,
    /// Snapshot of the last cycle stepped, if any.
    pub final_snapshot: Option<CycleSnapshot>,
}

/// Top-level simulator: core plus run loop.
#[derive(Debug)]
pub struct Simulator {
    /// The simulated core.
    pub core: Core,
}

impl Simulator {
    /// Builds a simulator for `program` under `config`, seeded with `init`.
    pub fn new(
        program: Program,
        config: CoreConfig,
        init: &InitialState,
    ) -> Result<Self, ConfigError> {
        let mut core = Core::new(program, config)?;
        init.apply(&mut core);
        Ok(Self { core })
    }

    /// Advances one cycle.
    pub fn step(&mut self) -> CycleSnapshot {
        self.core.step()
    }

    /// Steps until the machine drains or `max_cycles` have run.
    pub fn run(&mut self, max_cycles: u64) -> RunSummary {
        let mut last = None;
        for _ in 0..max_cycles {
            last = Some(self.core.step());
            if self.core.is_finished() {
                break;
            }
        }
        RunSummary {
            cycles: self.core.cycle(),
            finished: self.core.is_finished(),
            final_snapshot: last,
        }
    }
}
