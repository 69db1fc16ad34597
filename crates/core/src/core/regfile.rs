//! Register file with producer-tag renaming.
//!
//! Each of the 64 flat-indexed registers holds a value and the tag of its
//! latest in-flight producer, or `None` when the value is architectural.
//! The producer field is what renames registers: issue overwrites it, and a
//! CDB broadcast updates the value only when its tag still matches (a stale
//! broadcast from an overwritten producer is suppressed, which is the whole
//! WAW story).

use crate::common::reg::NUM_REGS;
use crate::common::{Reg, Tag, Value};

/// One architectural register: current value plus pending producer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Register {
    /// Current value (meaningful only when `producer` is `None` or for
    /// consumers that issued before the producer).
    pub value: Value,
    /// Latest in-flight producer, or `None`.
    pub producer: Option<Tag>,
}

/// The unified integer + FP register file.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    regs: [Register; NUM_REGS],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// All registers zero, no pending producers.
    pub fn new() -> Self {
        Self {
            regs: [Register::default(); NUM_REGS],
        }
    }

    /// The register cell for `reg`.
    pub fn get(&self, reg: Reg) -> Register {
        self.regs[reg.index()]
    }

    /// Current value of `reg`.
    pub fn value(&self, reg: Reg) -> Value {
        self.regs[reg.index()].value
    }

    /// Pending producer of `reg`, or `None`.
    pub fn producer(&self, reg: Reg) -> Option<Tag> {
        self.regs[reg.index()].producer
    }

    /// Directly sets a register value (initial state only). No-op for `R0`.
    pub fn init(&mut self, reg: Reg, value: Value) {
        if reg.is_zero() {
            return;
        }
        self.regs[reg.index()].value = value;
    }

    /// Marks `reg` as produced by `tag`, overwriting any previous producer.
    /// No-op for `R0`, whose producer is never set.
    pub fn set_producer(&mut self, reg: Reg, tag: Tag) {
        if reg.is_zero() {
            return;
        }
        self.regs[reg.index()].producer = Some(tag);
    }

    /// Delivers a broadcast value to `reg`, but only when its producer still
    /// equals `tag`; the producer is then cleared. A stale tag (overwritten
    /// by a younger issue) leaves the register untouched.
    pub fn write_if_producer(&mut self, reg: Reg, tag: Tag, value: Value) -> bool {
        if reg.is_zero() {
            return false;
        }
        let cell = &mut self.regs[reg.index()];
        if cell.producer == Some(tag) {
            cell.value = value;
            cell.producer = None;
            true
        } else {
            false
        }
    }

    /// Iterates all register cells in flat order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Register)> {
        self.regs.iter().enumerate()
    }

    /// True when no register has a pending producer (a termination invariant).
    pub fn all_producers_clear(&self) -> bool {
        self.regs.iter().all(|r| r.producer.is_none())
    }
}
