//! Common Data Bus.
//!
//! The CDB is a single-writer broadcast path: at most one result reaches the
//! register file and the waiting stations per cycle. When several results
//! are ready the arbiter picks the most-depended-upon one; losers stay
//! queued ahead of any message that becomes ready in a later cycle, so a
//! contended result is deferred but never lost.

use crate::common::{Reg, Tag, Value};

/// One result on the bus: producer tag, value, destination register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CdbMessage {
    /// Producer whose result this is.
    pub tag: Tag,
    /// The result value.
    pub value: Value,
    /// Destination register, if the producer writes one.
    pub dest: Option<Reg>,
}

/// Dependency counts driving arbitration, computed per candidate tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DependencyCount {
    /// Busy structures whose `Qj`, `Qk`, or `sourceTag` equals the tag.
    pub dependents: u32,
    /// Dependents whose every other operand is already resolved.
    pub ready_dependents: u32,
}

/// The bus: a FIFO of ready messages plus the single-winner arbiter.
#[derive(Clone, Debug, Default)]
pub struct CommonDataBus {
    pending: Vec<CdbMessage>,
}

impl CommonDataBus {
    /// An empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message that became ready this cycle, behind everything
    /// deferred from earlier cycles.
    pub fn push(&mut self, msg: CdbMessage) {
        self.pending.push(msg);
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Picks and removes the winning message for this cycle.
    ///
    /// The winner maximizes `(dependents, ready_dependents)` as computed by
    /// `count`; remaining ties fall to queue order, which is first-come
    /// first-served because deferred messages precede newer ones.
    pub fn arbitrate(&mut self, count: impl Fn(Tag) -> DependencyCount) -> Option<CdbMessage> {
        if self.pending.is_empty() {
            return None;
        }
        let mut best = 0;
        let mut best_count = count(self.pending[0].tag);
        for (i, msg) in self.pending.iter().enumerate().skip(1) {
            let c = count(msg.tag);
            if (c.dependents, c.ready_dependents)
                > (best_count.dependents, best_count.ready_dependents)
            {
                best = i;
                best_count = c;
            }
        }
        Some(self.pending.remove(best))
    }

    /// Messages still queued (deferred to later cycles), in order.
    pub fn deferred(&self) -> &[CdbMessage] {
        &self.pending
    }
}
