//! Branch handlers.
//!
//! Only `BEQ`/`BNE` are modeled, non-speculatively: issue stalls while a
//! branch is pending, so nothing younger than the branch is ever in flight
//! and a taken branch only has to flush the instruction queue. The handler
//! captures operands like a reservation station, then counts down the
//! branch latency and evaluates the condition.

use crate::common::{StationClass, Tag, Value};
use crate::isa::{Instruction, Opcode};

/// Lifecycle state of a branch handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
pub enum BranchState {
    /// Slot is empty.
    #[default]
    Free,
    /// Issued this cycle.
    Issued,
    /// At least one operand still owed by a producer.
    WaitingForOperands,
    /// Operands complete; counting down to evaluation.
    Ready,
}

/// Outcome of an evaluated branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BranchOutcome {
    /// True when the condition held.
    pub taken: bool,
    /// Next instruction index: the target when taken, fall-through otherwise.
    pub next_pc: usize,
}

/// One branch handler slot.
#[derive(Clone, Debug)]
pub struct BranchHandler {
    /// Identity of this slot.
    pub tag: Tag,
    /// Lifecycle state. `busy ⇔ state != Free`.
    pub state: BranchState,
    /// The issued branch.
    pub inst: Option<Instruction>,
    /// First operand value (valid once `qj` is `None`).
    pub vj: Value,
    /// Second operand value (valid once `qk` is `None`).
    pub vk: Value,
    /// Outstanding producer of the first operand.
    pub qj: Option<Tag>,
    /// Outstanding producer of the second operand.
    pub qk: Option<Tag>,
    /// Program counter of the branch itself.
    pub pc: usize,
    /// Target instruction index when taken.
    pub target: usize,
    /// Cycles left to evaluation (meaningful while `Ready`).
    pub remaining: u64,
    latency: u64,
}

impl BranchHandler {
    /// Creates the free slot `index` with the configured branch latency.
    pub fn new(index: usize, latency: u64) -> Self {
        Self {
            tag: Tag::new(StationClass::Branch, index),
            state: BranchState::Free,
            inst: None,
            vj: Value::ZERO,
            vk: Value::ZERO,
            qj: None,
            qk: None,
            pc: 0,
            target: 0,
            remaining: 0,
            latency,
        }
    }

    /// True while the slot holds a branch.
    pub fn busy(&self) -> bool {
        self.state != BranchState::Free
    }

    /// Fills the slot at issue with pre-resolved operand slots.
    pub fn issue(
        &mut self,
        inst: Instruction,
        vj: Value,
        qj: Option<Tag>,
        vk: Value,
        qk: Option<Tag>,
        pc: usize,
    ) {
        debug_assert!(!self.busy(), "issue into busy branch handler {}", self.tag);
        self.state = BranchState::Issued;
        self.target = inst.branch_target();
        self.inst = Some(inst);
        self.vj = vj;
        self.vk = vk;
        self.qj = qj;
        self.qk = qk;
        self.pc = pc;
        self.remaining = 0;
    }

    /// Both operands present.
    pub fn operands_ready(&self) -> bool {
        self.qj.is_none() && self.qk.is_none()
    }

    fn arm(&mut self) {
        self.state = BranchState::Ready;
        self.remaining = self.latency;
    }

    /// The advance-phase transition out of `Issued`.
    pub fn advance_from_issued(&mut self) {
        if self.state == BranchState::Issued {
            if self.operands_ready() {
                self.arm();
            } else {
                self.state = BranchState::WaitingForOperands;
            }
        }
    }

    /// Delivers a broadcast. Returns true when an operand was captured.
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
        if captured && self.state == BranchState::WaitingForOperands && self.operands_ready() {
            self.arm();
        }
        captured
    }

    /// One branch-evaluate tick. Returns the outcome when the countdown
    /// reaches zero this cycle; the caller frees the slot.
    pub fn evaluate_tick(&mut self) -> Option<BranchOutcome> {
        if self.state != BranchState::Ready {
            return None;
        }
        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }
        let equal = self.vj.as_int() == self.vk.as_int();
        let taken = match self.inst.map(|i| i.opcode) {
            Some(Opcode::Beq) => equal,
            _ => !equal,
        };
        Some(BranchOutcome {
            taken,
            next_pc: if taken { self.target } else { self.pc + 1 },
        })
    }

    /// Frees the slot after evaluation.
    pub fn release(&mut self) {
        self.state = BranchState::Free;
        self.inst = None;
        self.qj = None;
        self.qk = None;
    }

    /// True when this busy handler still owes an operand to `tag`.
    pub fn depends_on(&self, tag: Tag) -> bool {
        self.busy() && (self.qj == Some(tag) || self.qk == Some(tag))
    }

    /// True when a broadcast of `tag` would leave no outstanding operands.
    pub fn ready_after(&self, tag: Tag) -> bool {
        self.depends_on(tag)
            && (self.qj.is_none() || self.qj == Some(tag))
            && (self.qk.is_none() || self.qk == Some(tag))
    }
}
