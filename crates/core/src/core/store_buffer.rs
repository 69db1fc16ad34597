//! Store buffers.
//!
//! A store carries two dependencies: an address (base register, delivered by
//! an address unit) and a value (source register, read at issue when already
//! available, otherwise captured from the CDB). A CDB capture defers the
//! execute transition one further cycle, modelling the capture latency and
//! keeping a same-cycle store-commit out of the cache. Stores never
//! broadcast; committing the value to the cache frees the slot directly.

use crate::common::{StationClass, Tag, Value};
use crate::isa::Instruction;

/// Lifecycle state of a store buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
pub enum StoreState {
    /// Slot is empty.
    #[default]
    Free,
    /// Issued this cycle.
    Issued,
    /// Waiting for the address, the value, or memory ordering.
    Waiting,
    /// Cache commit in flight.
    Executing,
}

/// One store buffer slot.
#[derive(Clone, Debug)]
pub struct StoreBuffer {
    /// Identity of this slot.
    pub tag: Tag,
    /// Lifecycle state. `busy ⇔ state != Free`.
    pub state: StoreState,
    /// The issued store.
    pub inst: Option<Instruction>,
    /// Effective address, once the address unit delivers it.
    pub ea: Option<i64>,
    /// Value to store (valid once `source_tag` is `None`).
    pub value: Value,
    /// Outstanding producer of the stored value. `value_ready ⇔ None`.
    pub source_tag: Option<Tag>,
    /// Set by a CDB capture; consumed by the next advance phase to delay
    /// the execute transition one further cycle.
    pub capture_delay: bool,
    /// Cycles left in the cache commit (meaningful while `Executing`).
    pub remaining: u64,
    /// Program-order sequence number among memory operations.
    pub seq: u64,
}

impl StoreBuffer {
    /// Creates the free slot `index` of the store pool.
    pub fn new(index: usize) -> Self {
        Self {
            tag: Tag::new(StationClass::Store, index),
            state: StoreState::Free,
            inst: None,
            ea: None,
            value: Value::ZERO,
            source_tag: None,
            capture_delay: false,
            remaining: 0,
            seq: 0,
        }
    }

    /// True while the slot holds a store.
    pub fn busy(&self) -> bool {
        self.state != StoreState::Free
    }

    /// Fills the slot at issue. `value` holds the source register's value
    /// when it was available; otherwise `source_tag` names its producer.
    pub fn issue(&mut self, inst: Instruction, value: Value, source_tag: Option<Tag>, seq: u64) {
        debug_assert!(!self.busy(), "issue into busy store buffer {}", self.tag);
        self.state = StoreState::Issued;
        self.inst = Some(inst);
        self.ea = None;
        self.value = value;
        self.source_tag = source_tag;
        self.capture_delay = false;
        self.remaining = 0;
        self.seq = seq;
    }

    /// Address unit delivery.
    pub fn set_ea(&mut self, ea: i64) {
        self.ea = Some(ea);
    }

    /// True once the effective address is known.
    pub fn address_ready(&self) -> bool {
        self.ea.is_some()
    }

    /// True once the value is held locally.
    pub fn value_ready(&self) -> bool {
        self.source_tag.is_none()
    }

    /// Delivers a broadcast. Returns true when this store captured its value.
    pub fn capture(&mut self, tag: Tag, value: Value) -> bool {
        if self.busy() && self.source_tag == Some(tag) {
            self.value = value;
            self.source_tag = None;
            self.capture_delay = true;
            true
        } else {
            false
        }
    }

    /// Consumes the one-cycle capture delay. Returns true when the store
    /// must keep waiting this cycle even though address and value are ready.
    pub fn take_capture_delay(&mut self) -> bool {
        std::mem::take(&mut self.capture_delay)
    }

    /// Begins the cache commit with the latency probed at this moment.
    pub fn start_commit(&mut self, latency: u64) {
        self.state = StoreState::Executing;
        self.remaining = latency;
    }

    /// One execute-phase tick; true when the commit completes this cycle.
    pub fn tick(&mut self) -> bool {
        if self.state != StoreState::Executing {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Frees the slot once the value is in the cache.
    pub fn release(&mut self) {
        self.state = StoreState::Free;
        self.inst = None;
        self.ea = None;
        self.source_tag = None;
        self.capture_delay = false;
    }

    /// True when this busy store still owes its value to `tag`.
    pub fn depends_on(&self, tag: Tag) -> bool {
        self.busy() && self.source_tag == Some(tag)
    }

    /// True when a broadcast of `tag` would make this store runnable
    /// (its only other dependency, the address, already resolved).
    pub fn ready_after(&self, tag: Tag) -> bool {
        self.depends_on(tag) && self.address_ready()
    }
}
