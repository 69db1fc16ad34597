//! Initial register and memory state.
//!
//! External collaborators seed the machine before the first cycle: sparse
//! maps of register values and of doubles at byte addresses. Integer
//! registers are seeded on the integer view of the value bits, FP registers
//! on the double view.

use std::collections::BTreeMap;

use crate::common::{Reg, Value};
use crate::core::Core;

/// Sparse initial state, applied to a fresh core before stepping.
#[derive(Clone, Debug, Default)]
pub struct InitialState {
    regs: BTreeMap<Reg, Value>,
    mem: BTreeMap<u64, f64>,
}

impl InitialState {
    /// An empty initial state (all registers and memory zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds integer register `Rn` with `value`.
    pub fn int_reg(mut self, n: usize, value: i64) -> Self {
        let _ = self.regs.insert(Reg::int(n), Value::from_int(value));
        self
    }

    /// Seeds FP register `Fn` with `value`.
    pub fn fp_reg(mut self, n: usize, value: f64) -> Self {
        let _ = self.regs.insert(Reg::fp(n), Value::from_f64(value));
        self
    }

    /// Seeds the double at byte address `addr` with `value`.
    pub fn mem_f64(mut self, addr: u64, value: f64) -> Self {
        let _ = self.mem.insert(addr, value);
        self
    }

    /// Applies the seeds to a fresh core.
    pub fn apply(&self, core: &mut Core) {
        for (&reg, &value) in &self.regs {
            core.init_register(reg, value);
        }
        for (&addr, &value) in &self.mem {
            core.init_memory_f64(addr, value);
        }
    }
}
