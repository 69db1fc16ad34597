//! Load buffers.
//!
//! A load buffer carries a memory read from issue to CDB broadcast: it waits
//! for its effective address from an address unit, for memory ordering to
//! clear (no older conflicting store), counts down the cache access, and
//! then holds the loaded value until the CDB picks it. Sequence numbers
//! assigned at issue order the buffer against the store pool.

use crate::common::{Reg, StationClass, Tag, Value};
use crate::isa::Instruction;

/// Lifecycle state of a load buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
pub enum LoadState {
    /// Slot is empty.
    #[default]
    Free,
    /// Issued this cycle.
    Issued,
    /// Waiting for the effective address or for memory ordering.
    WaitingForAddress,
    /// Cache access in flight.
    Executing,
    /// Value loaded; waiting for the CDB broadcast to free the slot.
    ResultReady,
}

/// One load buffer slot.
#[derive(Clone, Debug)]
pub struct LoadBuffer {
    /// Identity of this slot.
    pub tag: Tag,
    /// Lifecycle state. `busy ⇔ state != Free`.
    pub state: LoadState,
    /// The issued load.
    pub inst: Option<Instruction>,
    /// Destination register.
    pub dest: Option<Reg>,
    /// Effective address, once the address unit delivers it. Kept signed so
    /// a negative base+offset stays representable and fails the bounds
    /// check instead of wrapping.
    pub ea: Option<i64>,
    /// Cycles left in the cache access (meaningful while `Executing`).
    pub remaining: u64,
    /// Access latency decided by the issue-time cache probe.
    pub latency: u64,
    /// Program-order sequence number among memory operations.
    pub seq: u64,
    /// Loaded value, valid in `ResultReady`.
    pub result: Value,
}

impl LoadBuffer {
    /// Creates the free slot `index` of the load pool.
    pub fn new(index: usize) -> Self {
        Self {
            tag: Tag::new(StationClass::Load, index),
            state: LoadState::Free,
            inst: None,
            dest: None,
            ea: None,
            remaining: 0,
            latency: 0,
            seq: 0,
            result: Value::ZERO,
        }
    }

    /// True while the slot holds a load.
    pub fn busy(&self) -> bool {
        self.state != LoadState::Free
    }

    /// Fills the slot at issue.
    pub fn issue(&mut self, inst: Instruction, dest: Reg, seq: u64, latency: u64) {
        debug_assert!(!self.busy(), "issue into busy load buffer {}", self.tag);
        self.state = LoadState::Issued;
        self.inst = Some(inst);
        self.dest = Some(dest);
        self.ea = None;
        self.remaining = 0;
        self.latency = latency;
        self.seq = seq;
        self.result = Value::ZERO;
    }

    /// Address unit delivery.
    pub fn set_ea(&mut self, ea: i64) {
        self.ea = Some(ea);
    }

    /// True once the effective address is known.
    pub fn address_ready(&self) -> bool {
        self.ea.is_some()
    }

    /// Begins the cache access with the issue-time latency.
    pub fn start_access(&mut self) {
        self.state = LoadState::Executing;
        self.remaining = self.latency;
    }

    /// One execute-phase tick; true when the access completes this cycle.
    pub fn tick(&mut self) -> bool {
        if self.state != LoadState::Executing {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Records the loaded value and waits for the CDB.
    pub fn on_result(&mut self, value: Value) {
        self.result = value;
        self.state = LoadState::ResultReady;
    }

    /// Frees the slot after its result was broadcast.
    pub fn release(&mut self) {
        self.state = LoadState::Free;
        self.inst = None;
        self.dest = None;
        self.ea = None;
    }
}
