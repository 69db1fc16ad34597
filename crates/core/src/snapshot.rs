//! Per-cycle snapshots and the phase log.
//!
//! After every cycle the core emits an immutable [`CycleSnapshot`]: the state
//! of every station, buffer, unit, and register, the cache line summaries,
//! the CDB broadcast (if any), and a human-readable log of what each phase
//! did. The external table UI consumes these; everything derives
//! `serde::Serialize` so the boundary can be JSON.

use serde::Serialize;

use crate::core::branch::BranchState;
use crate::core::load_buffer::LoadState;
use crate::core::station::RsState;
use crate::core::store_buffer::StoreState;
use crate::core::units::FuKind;
use crate::mem::cache::CacheLineSummary;
use crate::stats::SimStats;

/// The phase a log entry was produced in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// One-cycle state transitions and address delivery.
    Advance,
    /// FU and memory buffer ticks.
    Execute,
    /// CDB arbitration.
    Arbitrate,
    /// CDB delivery.
    Broadcast,
    /// Producer release after broadcast.
    Free,
    /// Branch evaluation.
    Branch,
    /// Station-to-FU dispatch.
    Dispatch,
    /// Instruction issue.
    Issue,
}

/// Severity of a log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Routine phase activity.
    Info,
    /// A recoverable anomaly (divide-by-zero, out-of-bounds access, ...).
    Warning,
}

/// One human-readable log line from a cycle.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    /// Producing phase.
    pub phase: Phase,
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}

/// Accumulates log entries while a cycle runs.
#[derive(Debug, Default)]
pub(crate) struct CycleLog {
    entries: Vec<LogEntry>,
}

impl CycleLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn info(&mut self, phase: Phase, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?phase, "{message}");
        self.entries.push(LogEntry {
            phase,
            severity: Severity::Info,
            message,
        });
    }

    pub(crate) fn warn(&mut self, phase: Phase, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(?phase, "{message}");
        self.entries.push(LogEntry {
            phase,
            severity: Severity::Warning,
            message,
        });
    }

    pub(crate) fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

/// Head of the instruction queue.
#[derive(Clone, Debug, Serialize)]
pub struct IqSnapshot {
    /// Program counter at the head, if any.
    pub head_pc: Option<usize>,
    /// Disassembly of the head instruction.
    pub head_inst: Option<String>,
    /// Pending instruction count.
    pub len: usize,
}

/// One reservation station.
#[derive(Clone, Debug, Serialize)]
pub struct StationSnapshot {
    /// Slot tag (`A1`, `M2`, `I1`, ...).
    pub tag: String,
    /// Lifecycle state.
    pub state: RsState,
    /// Disassembly of the held instruction.
    pub inst: Option<String>,
    /// First operand (double view).
    pub vj: f64,
    /// Second operand (double view).
    pub vk: f64,
    /// Outstanding first-operand producer.
    pub qj: Option<String>,
    /// Outstanding second-operand producer.
    pub qk: Option<String>,
    /// Destination register.
    pub dest: Option<String>,
}

/// One load buffer.
#[derive(Clone, Debug, Serialize)]
pub struct LoadBufferSnapshot {
    /// Slot tag (`L1`, ...).
    pub tag: String,
    /// Lifecycle state.
    pub state: LoadState,
    /// Disassembly of the held load.
    pub inst: Option<String>,
    /// Effective address, once known.
    pub ea: Option<i64>,
    /// Cycles left in the access.
    pub remaining: u64,
    /// Memory-order sequence number.
    pub seq: u64,
}

/// One store buffer.
#[derive(Clone, Debug, Serialize)]
pub struct StoreBufferSnapshot {
    /// Slot tag (`S1`, ...).
    pub tag: String,
    /// Lifecycle state.
    pub state: StoreState,
    /// Disassembly of the held store.
    pub inst: Option<String>,
    /// Effective address, once known.
    pub ea: Option<i64>,
    /// Value to store (double view; meaningful when `value_ready`).
    pub value: f64,
    /// Outstanding value producer.
    pub source_tag: Option<String>,
    /// True once the value is held locally.
    pub value_ready: bool,
    /// Cycles left in the commit.
    pub remaining: u64,
    /// Memory-order sequence number.
    pub seq: u64,
}

/// One branch handler.
#[derive(Clone, Debug, Serialize)]
pub struct BranchSnapshot {
    /// Slot tag (`B1`, ...).
    pub tag: String,
    /// Lifecycle state.
    pub state: BranchState,
    /// Disassembly of the held branch.
    pub inst: Option<String>,
    /// Outstanding first-operand producer.
    pub qj: Option<String>,
    /// Outstanding second-operand producer.
    pub qk: Option<String>,
    /// Branch's own program counter.
    pub pc: usize,
    /// Target instruction index.
    pub target: usize,
}

/// One functional unit.
#[derive(Clone, Debug, Serialize)]
pub struct FuSnapshot {
    /// Unit class.
    pub kind: FuKind,
    /// Tag of the station being executed, if any.
    pub station: Option<String>,
    /// Cycles left for the current operation.
    pub remaining: u64,
}

/// One address unit.
#[derive(Clone, Debug, Serialize)]
pub struct AddressUnitSnapshot {
    /// Tag of the buffer being computed for, if any.
    pub target: Option<String>,
    /// Cycles left until delivery.
    pub remaining: u64,
}

/// One architectural register.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterSnapshot {
    /// Register name (`R5`, `F3`).
    pub name: String,
    /// Double view of the value.
    pub value: f64,
    /// Integer view of the same bits.
    pub int_value: i64,
    /// Pending producer, if any.
    pub producer: Option<String>,
}

/// The CDB broadcast of a cycle.
#[derive(Clone, Debug, Serialize)]
pub struct CdbSnapshot {
    /// Producer tag.
    pub tag: String,
    /// Broadcast value (double view).
    pub value: f64,
    /// Destination register.
    pub dest: Option<String>,
}

/// Immutable record of one cycle, consumed by the external UI.
#[derive(Clone, Debug, Serialize)]
pub struct CycleSnapshot {
    /// Cycle number (1-based).
    pub cycle: u64,
    /// True once the machine has fully drained.
    pub finished: bool,
    /// Instruction queue head.
    pub iq: IqSnapshot,
    /// All reservation stations, FP add/sub then FP mul/div then integer.
    pub stations: Vec<StationSnapshot>,
    /// All load buffers.
    pub load_buffers: Vec<LoadBufferSnapshot>,
    /// All store buffers.
    pub store_buffers: Vec<StoreBufferSnapshot>,
    /// All branch handlers.
    pub branch_handlers: Vec<BranchSnapshot>,
    /// All functional units.
    pub functional_units: Vec<FuSnapshot>,
    /// All address units.
    pub address_units: Vec<AddressUnitSnapshot>,
    /// The full register file, flat order.
    pub registers: Vec<RegisterSnapshot>,
    /// Cache line summaries.
    pub cache_lines: Vec<CacheLineSummary>,
    /// The broadcast performed this cycle, if any.
    pub cdb: Option<CdbSnapshot>,
    /// Counters as of the end of this cycle.
    pub stats: SimStats,
    /// Phase log for this cycle.
    pub log: Vec<LogEntry>,
}

impl CycleSnapshot {
    /// Convenience: true when any log entry this cycle is a warning.
    pub fn has_warnings(&self) -> bool {
        self.log.iter().any(|e| e.severity == Severity::Warning)
    }
}
