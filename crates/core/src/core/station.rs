//! Reservation stations.
//!
//! A reservation station holds one issued arithmetic instruction from issue
//! until its result is broadcast: it captures operands (by value or by
//! producer tag), waits for a functional unit, and parks the finished result
//! until the CDB arbiter picks it. The `Issued` state exists to delay
//! operand wake-up by one cycle so a broadcast in the cycle of issue cannot
//! shortcut the pipeline.

use crate::common::{Reg, StationClass, Tag, Value};
use crate::isa::Instruction;

/// Lifecycle state of a reservation station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
pub enum RsState {
    /// Slot is empty.
    #[default]
    Free,
    /// Issued this cycle; transitions at the next cycle's advance phase.
    Issued,
    /// At least one operand is still owed by a producer.
    WaitingForOperands,
    /// Operands complete; waiting for a free functional unit.
    WaitingForFu,
    /// Executing on a functional unit.
    Executing,
    /// Result computed; waiting for the CDB broadcast to free the slot.
    Executed,
}

/// One reservation station slot.
#[derive(Clone, Debug)]
pub struct ReservationStation {
    /// Identity of this slot; renames the destination register while busy.
    pub tag: Tag,
    /// Which of the three arithmetic pools this slot belongs to.
    pub class: StationClass,
    /// Lifecycle state. `busy ⇔ state != Free`.
    pub state: RsState,
    /// The issued instruction.
    pub inst: Option<Instruction>,
    /// First operand value (valid once `qj` is `None`).
    pub vj: Value,
    /// Second operand value (valid once `qk` is `None`).
    pub vk: Value,
    /// Outstanding producer of the first operand.
    pub qj: Option<Tag>,
    /// Outstanding producer of the second operand.
    pub qk: Option<Tag>,
    /// Destination register, if the instruction writes one.
    pub dest: Option<Reg>,
    /// Result value, valid in the `Executed` state.
    pub result: Value,
}

impl ReservationStation {
    /// Creates the free slot `index` of the given pool.
    pub fn new(class: StationClass, index: usize) -> Self {
        Self {
            tag: Tag::new(class, index),
            class,
            state: RsState::Free,
            inst: None,
            vj: Value::ZERO,
            vk: Value::ZERO,
            qj: None,
            qk: None,
            dest: None,
            result: Value::ZERO,
        }
    }

    /// True while the slot holds an instruction.
    pub fn busy(&self) -> bool {
        self.state != RsState::Free
    }

    /// Fills the slot at issue with pre-resolved operand slots.
    pub fn issue(
        &mut self,
        inst: Instruction,
        vj: Value,
        qj: Option<Tag>,
        vk: Value,
        qk: Option<Tag>,
        dest: Option<Reg>,
    ) {
        debug_assert!(!self.busy(), "issue into busy station {}", self.tag);
        self.state = RsState::Issued;
        self.inst = Some(inst);
        self.vj = vj;
        self.vk = vk;
        self.qj = qj;
        self.qk = qk;
        self.dest = dest;
        self.result = Value::ZERO;
    }

    /// Both operands present.
    pub fn operands_ready(&self) -> bool {
        self.qj.is_none() && self.qk.is_none()
    }

    /// The advance-phase transition out of `Issued`.
    pub fn advance_from_issued(&mut self) {
        if self.state == RsState::Issued {
            self.state = if self.operands_ready() {
                RsState::WaitingForFu
            } else {
                RsState::WaitingForOperands
            };
        }
    }

    /// Delivers a broadcast. Returns true when this station captured the
    /// value into at least one operand slot.
    pub fn capture(&mut self, tag: Tag, value: Value) -> bool {
        if !self.busy() {
            return false;
        }
        let mut captured = false;
        if self.qj == Some(tag) {
            self.vj = value;
            self.qj = None;
            captured = true;
        }
        if self.qk == Some(tag) {
            self.vk = value;
            self.qk = None;
            captured = true;
        }
        if captured && self.state == RsState::WaitingForOperands && self.operands_ready() {
            self.state = RsState::WaitingForFu;
        }
        captured
    }

    /// Called by the FU when it starts this station.
    pub fn on_start_execution(&mut self) {
        debug_assert_eq!(self.state, RsState::WaitingForFu);
        self.state = RsState::Executing;
    }

    /// Called by the FU when the result is ready.
    pub fn on_execution_finished(&mut self, result: Value) {
        debug_assert_eq!(self.state, RsState::Executing);
        self.result = result;
        self.state = RsState::Executed;
    }

    /// Frees the slot after its result was broadcast.
    pub fn release(&mut self) {
        self.state = RsState::Free;
        self.inst = None;
        self.qj = None;
        self.qk = None;
        self.dest = None;
    }

    /// True when this busy station still owes an operand to `tag`.
    pub fn depends_on(&self, tag: Tag) -> bool {
        self.busy() && (self.qj == Some(tag) || self.qk == Some(tag))
    }

    /// True when a broadcast of `tag` would leave no outstanding operands
    /// here (the "ready dependent" test of CDB arbitration).
    pub fn ready_after(&self, tag: Tag) -> bool {
        self.depends_on(tag)
            && (self.qj.is_none() || self.qj == Some(tag))
            && (self.qk.is_none() || self.qk == Some(tag))
    }
}
