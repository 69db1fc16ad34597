//! The per-cycle core scheduler.
//!
//! `Core` owns every microarchitectural structure and advances them once per
//! `step()`, in a fixed phase order that is part of the contract:
//!
//! 1. advance one-cycle transitions (stations, branch handlers, memory
//!    buffers under the memory-ordering rule, then address units);
//! 2. execute (functional units, then load and store buffers);
//! 3. CDB arbitration;
//! 4. broadcast to the register file, stations, store buffers, handlers;
//! 5. free the broadcasting producer;
//! 6. evaluate ready branches;
//! 7. dispatch waiting stations onto free functional units;
//! 8. issue at most one instruction from the queue head;
//! 9. snapshot.
//!
//! Operand capture and structure freeing depend on this order: a broadcast
//! in cycle `c` wakes consumers before dispatch in `c`, and an instruction
//! issued in `c` cannot observe anything later than the broadcast of `c`.

use crate::common::{Reg, StationClass, Tag, Value};
use crate::config::CoreConfig;
use crate::core::branch::BranchHandler;
use crate::core::cdb::{CdbMessage, CommonDataBus, DependencyCount};
use crate::core::load_buffer::{LoadBuffer, LoadState};
use crate::core::queue::InstructionQueue;
use crate::core::regfile::RegisterFile;
use crate::core::station::{ReservationStation, RsState};
use crate::core::store_buffer::{StoreBuffer, StoreState};
use crate::core::units::{
    AddressTarget, AddressUnit, ExecAnomaly, FuKind, FunctionalUnit, LatencyTable, evaluate,
};
use crate::isa::{Instruction, Opcode, Program};
use crate::mem::{DataCache, MainMemory};
use crate::snapshot::{
    AddressUnitSnapshot, BranchSnapshot, CdbSnapshot, CycleLog, CycleSnapshot, FuSnapshot,
    IqSnapshot, LoadBufferSnapshot, Phase, RegisterSnapshot, StationSnapshot,
    StoreBufferSnapshot,
};
use crate::stats::SimStats;

/// The simulator core: all structures plus the cycle counter.
#[derive(Debug)]
pub struct Core {
    config: CoreConfig,
    program: Program,
    regs: RegisterFile,
    iq: InstructionQueue,
    stations: Vec<ReservationStation>,
    loads: Vec<LoadBuffer>,
    stores: Vec<StoreBuffer>,
    branches: Vec<BranchHandler>,
    fus: Vec<FunctionalUnit>,
    address_units: Vec<AddressUnit>,
    cache: DataCache,
    memory: MainMemory,
    cdb: CommonDataBus,
    next_seq: u64,
    cycle: u64,
    branch_taken_this_cycle: bool,
    stats: SimStats,
}

impl Core {
    /// Builds a core for `program` under `config`.
    ///
    /// The configuration is validated here; nothing is simulated on error.
    pub fn new(program: Program, config: CoreConfig) -> Result<Self, crate::common::ConfigError> {
        config.validate()?;

        let mut stations = Vec::new();
        for i in 0..config.stations.fp_add_sub_rs {
            stations.push(ReservationStation::new(StationClass::FpAddSub, i));
        }
        for i in 0..config.stations.fp_mul_div_rs {
            stations.push(ReservationStation::new(StationClass::FpMulDiv, i));
        }
        for i in 0..config.stations.int_rs {
            stations.push(ReservationStation::new(StationClass::IntAlu, i));
        }

        let loads = (0..config.stations.load_buffers).map(LoadBuffer::new).collect();
        let stores = (0..config.stations.store_buffers).map(StoreBuffer::new).collect();
        let branches = (0..config.stations.branch_handlers)
            .map(|i| BranchHandler::new(i, config.latency.branch))
            .collect();

        let latencies = LatencyTable {
            int_alu: config.latency.int_alu,
            fp_add_sub: config.latency.fp_add_sub,
            fp_mul: config.latency.fp_mul,
            fp_div: config.latency.fp_div,
        };
        let mut fus = Vec::new();
        for _ in 0..config.stations.fp_add_sub_units {
            fus.push(FunctionalUnit::new(FuKind::FpAddSub, latencies));
        }
        for _ in 0..config.stations.fp_mul_div_units {
            fus.push(FunctionalUnit::new(FuKind::FpMulDiv, latencies));
        }
        for _ in 0..config.stations.int_alus {
            fus.push(FunctionalUnit::new(FuKind::IntAlu, latencies));
        }

        let address_units = vec![AddressUnit::new(); config.stations.address_units];
        let cache = DataCache::new(&config.cache);
        let memory = MainMemory::new(config.memory.size_bytes);
        let iq = InstructionQueue::new(program.len());

        Ok(Self {
            config,
            program,
            regs: RegisterFile::new(),
            iq,
            stations,
            loads,
            stores,
            branches,
            fus,
            address_units,
            cache,
            memory,
            cdb: CommonDataBus::new(),
            next_seq: 0,
            cycle: 0,
            branch_taken_this_cycle: false,
            stats: SimStats::default(),
        })
    }

    /// Seeds a register before the first step (`R0` stays zero).
    pub fn init_register(&mut self, reg: Reg, value: Value) {
        self.regs.init(reg, value);
    }

    /// Seeds a double in backing memory before the first step. A seed past
    /// the end of memory is dropped.
    pub fn init_memory_f64(&mut self, addr: u64, value: f64) {
        if self.memory.in_bounds(addr, 8) {
            self.memory.write_f64(addr, value);
        } else {
            tracing::warn!(addr, "initial-state memory seed out of bounds, dropped");
        }
    }

    /// Advances every structure by one cycle and returns the snapshot.
    pub fn step(&mut self) -> CycleSnapshot {
        self.cycle += 1;
        self.branch_taken_this_cycle = false;
        let mut log = CycleLog::new();

        self.phase_advance(&mut log);
        self.phase_execute(&mut log);
        let broadcast = self.phase_broadcast(&mut log);
        self.phase_branches(&mut log);
        self.phase_dispatch(&mut log);
        self.phase_issue(&mut log);

        self.stats.cycles = self.cycle;
        self.build_snapshot(broadcast, log)
    }

    /// True when the queue is empty and every structure has drained.
    pub fn is_finished(&self) -> bool {
        self.iq.is_empty()
            && self.stations.iter().all(|s| !s.busy())
            && self.loads.iter().all(|l| !l.busy())
            && self.stores.iter().all(|s| !s.busy())
            && self.branches.iter().all(|b| !b.busy())
            && self.fus.iter().all(|f| !f.busy())
            && self.address_units.iter().all(|u| !u.busy())
            && self.cdb.is_empty()
    }

    /// Current cycle count.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Accumulated counters.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Current value of `reg`.
    pub fn reg_value(&self, reg: Reg) -> Value {
        self.regs.value(reg)
    }

    /// Pending producer of `reg`.
    pub fn reg_producer(&self, reg: Reg) -> Option<Tag> {
        self.regs.producer(reg)
    }

    /// Reads a double at `addr` as a load would observe it: cached bytes
    /// where resident, memory otherwise. Never mutates cache state.
    pub fn peek_f64(&self, addr: u64) -> f64 {
        let mut buf = [0u8; 8];
        self.cache.peek_bytes(addr, &mut buf, &self.memory);
        f64::from_le_bytes(buf)
    }

    /// Writes all dirty cache lines back, making backing memory the full
    /// picture. Intended for terminal-state inspection.
    pub fn flush_cache(&mut self) {
        self.cache.flush_dirty(&mut self.memory);
    }

    /// Reads a double from backing memory only (use after [`Self::flush_cache`]).
    pub fn memory_f64(&self, addr: u64) -> f64 {
        self.memory.read_f64(addr)
    }

    // ────────────────────────────────────────────────────────────────
    // Phase 1: advance one-cycle transitions
    // ────────────────────────────────────────────────────────────────

    fn phase_advance(&mut self, log: &mut CycleLog) {
        for rs in &mut self.stations {
            if rs.state == RsState::Issued {
                rs.advance_from_issued();
                log.info(Phase::Advance, format!("{} -> {:?}", rs.tag, rs.state));
            }
        }
        for bh in &mut self.branches {
            if bh.busy() {
                bh.advance_from_issued();
            }
        }
        self.advance_loads(log);
        self.advance_stores(log);

        // Address units tick last: an EA delivered this cycle feeds the
        // buffer promotions of the next cycle's advance phase.
        for i in 0..self.address_units.len() {
            if let Some((target, ea)) = self.address_units[i].tick() {
                let tag = match target {
                    AddressTarget::Load(j) => {
                        self.loads[j].set_ea(ea);
                        self.loads[j].tag
                    }
                    AddressTarget::Store(j) => {
                        self.stores[j].set_ea(ea);
                        self.stores[j].tag
                    }
                };
                log.info(Phase::Advance, format!("address ready for {tag}: {ea}"));
            }
        }
    }

    fn advance_loads(&mut self, log: &mut CycleLog) {
        for i in 0..self.loads.len() {
            let state = self.loads[i].state;
            if state != LoadState::Issued && state != LoadState::WaitingForAddress {
                continue;
            }
            if self.loads[i].address_ready() && self.load_may_start(i) {
                // The miss fetch happens when the access starts, so probes
                // by younger operations observe the incoming line.
                if let Some(addr) = self.access_addr(self.loads[i].ea, self.loads[i].op_bytes()) {
                    self.cache.fetch_for_access(addr, &mut self.memory);
                }
                self.loads[i].start_access();
                log.info(
                    Phase::Advance,
                    format!(
                        "{} -> executing ({} cycles)",
                        self.loads[i].tag, self.loads[i].latency
                    ),
                );
            } else if state == LoadState::Issued {
                self.loads[i].state = LoadState::WaitingForAddress;
            }
        }
    }

    fn advance_stores(&mut self, log: &mut CycleLog) {
        for i in 0..self.stores.len() {
            let state = self.stores[i].state;
            if state != StoreState::Issued && state != StoreState::Waiting {
                continue;
            }
            if self.stores[i].take_capture_delay() {
                // CDB capture last cycle: the execute transition is deferred
                // one further cycle.
                self.stores[i].state = StoreState::Waiting;
                continue;
            }
            if self.stores[i].address_ready()
                && self.stores[i].value_ready()
                && self.store_may_start(i)
            {
                // Hit/miss is decided now, when the store becomes ready to
                // commit, so it reflects earlier cache state changes.
                let bytes = self.stores[i].op_bytes();
                let latency = match self.access_addr(self.stores[i].ea, bytes) {
                    Some(addr) => {
                        let latency = self.charge_cache_access(addr);
                        self.cache.fetch_for_access(addr, &mut self.memory);
                        latency
                    }
                    None => self.config.cache.hit_latency,
                };
                self.stores[i].start_commit(latency);
                log.info(
                    Phase::Advance,
                    format!("{} -> executing ({latency} cycles)", self.stores[i].tag),
                );
            } else if state == StoreState::Issued {
                self.stores[i].state = StoreState::Waiting;
            }
        }
    }

    /// A load may start only when every older store that could alias its
    /// address has completed. A store with an unknown address is a
    /// potential conflict.
    fn load_may_start(&self, idx: usize) -> bool {
        let load = &self.loads[idx];
        let Some(ea) = load.ea else { return false };
        self.stores.iter().all(|s| {
            !s.busy() || s.seq > load.seq || s.ea.is_some_and(|sea| sea != ea)
        })
    }

    /// A store may start only when every older aliasing store has completed
    /// and no older aliasing load is still busy.
    fn store_may_start(&self, idx: usize) -> bool {
        let store = &self.stores[idx];
        let Some(ea) = store.ea else { return false };
        let stores_ok = self.stores.iter().enumerate().all(|(j, s)| {
            j == idx || !s.busy() || s.seq > store.seq || s.ea.is_some_and(|sea| sea != ea)
        });
        let loads_ok = self.loads.iter().all(|l| {
            !l.busy() || l.seq > store.seq || l.ea.is_some_and(|lea| lea != ea)
        });
        stores_ok && loads_ok
    }

    // ────────────────────────────────────────────────────────────────
    // Phase 2: execute
    // ────────────────────────────────────────────────────────────────

    fn phase_execute(&mut self, log: &mut CycleLog) {
        for fi in 0..self.fus.len() {
            let Some(rs_idx) = self.fus[fi].tick() else {
                continue;
            };
            let Some(inst) = self.stations[rs_idx].inst else {
                continue;
            };
            let (result, anomaly) = evaluate(
                inst.opcode,
                self.stations[rs_idx].vj,
                self.stations[rs_idx].vk,
                inst.immediate,
            );
            match anomaly {
                Some(ExecAnomaly::IntDivideByZero) => {
                    self.stats.int_divide_by_zero += 1;
                    log.warn(
                        Phase::Execute,
                        format!("{}: integer divide by zero, result 0", self.stations[rs_idx].tag),
                    );
                }
                Some(ExecAnomaly::UnsupportedOpcode(op)) => {
                    log.warn(
                        Phase::Execute,
                        format!("{}: {op} not executable here, treated as NOP", self.stations[rs_idx].tag),
                    );
                }
                None => {}
            }
            let tag = self.stations[rs_idx].tag;
            let dest = self.stations[rs_idx].dest;
            self.stations[rs_idx].on_execution_finished(result);
            self.cdb.push(CdbMessage { tag, value: result, dest });
            log.info(
                Phase::Execute,
                format!("{tag} completed: {}", display_value(result, dest)),
            );
        }

        for i in 0..self.loads.len() {
            if !self.loads[i].tick() {
                continue;
            }
            let Some(inst) = self.loads[i].inst else {
                continue;
            };
            let tag = self.loads[i].tag;
            let dest = self.loads[i].dest;
            let value = match self.access_addr(self.loads[i].ea, inst.opcode.access_bytes()) {
                Some(addr) => {
                    let value = self.read_memory_value(inst.opcode, addr);
                    log.info(
                        Phase::Execute,
                        format!("{tag} read mem[{addr}] = {}", display_value(value, dest)),
                    );
                    value
                }
                None => {
                    self.stats.oob_accesses += 1;
                    log.warn(
                        Phase::Execute,
                        format!("{tag}: load address {:?} out of bounds, result 0", self.loads[i].ea),
                    );
                    Value::ZERO
                }
            };
            self.loads[i].on_result(value);
            self.cdb.push(CdbMessage { tag, value, dest });
            self.stats.loads_completed += 1;
        }

        for i in 0..self.stores.len() {
            if !self.stores[i].tick() {
                continue;
            }
            let Some(inst) = self.stores[i].inst else {
                continue;
            };
            let tag = self.stores[i].tag;
            let value = self.stores[i].value;
            match self.access_addr(self.stores[i].ea, inst.opcode.access_bytes()) {
                Some(addr) => {
                    self.write_memory_value(inst.opcode, addr, value);
                    log.info(
                        Phase::Execute,
                        format!(
                            "{tag} committed mem[{addr}] = {}",
                            display_value(value, inst.src1)
                        ),
                    );
                }
                None => {
                    self.stats.oob_accesses += 1;
                    log.warn(
                        Phase::Execute,
                        format!("{tag}: store address {:?} out of bounds, dropped", self.stores[i].ea),
                    );
                }
            }
            self.stores[i].release();
            self.stats.stores_committed += 1;
        }
    }

    fn read_memory_value(&mut self, op: Opcode, addr: u64) -> Value {
        match op {
            Opcode::Lw => {
                let word = self.cache.load_word(addr, &mut self.memory);
                Value::from_int(i64::from(word as i32))
            }
            _ => Value::from_f64(self.cache.load_double(addr, &mut self.memory)),
        }
    }

    fn write_memory_value(&mut self, op: Opcode, addr: u64, value: Value) {
        match op {
            Opcode::Sw => self
                .cache
                .store_word(addr, value.as_int() as u32, &mut self.memory),
            _ => self
                .cache
                .store_double(addr, value.as_f64(), &mut self.memory),
        }
    }

    /// Bounds check for an access of `bytes` at the signed EA; `None` marks
    /// an out-of-bounds access.
    fn access_addr(&self, ea: Option<i64>, bytes: usize) -> Option<u64> {
        let ea = ea?;
        if ea >= 0 && self.memory.in_bounds(ea as u64, bytes) {
            Some(ea as u64)
        } else {
            None
        }
    }

    /// Decides an access latency from a probe and counts the hit or miss.
    fn charge_cache_access(&mut self, addr: u64) -> u64 {
        if self.cache.probe(addr) {
            self.stats.dcache_hits += 1;
        } else {
            self.stats.dcache_misses += 1;
        }
        self.cache.access_latency(addr)
    }

    // ────────────────────────────────────────────────────────────────
    // Phases 3-5: arbitrate, broadcast, free
    // ────────────────────────────────────────────────────────────────

    fn phase_broadcast(&mut self, log: &mut CycleLog) -> Option<CdbMessage> {
        let mut cdb = std::mem::take(&mut self.cdb);
        let msg = cdb.arbitrate(|tag| self.count_dependents(tag));
        if msg.is_some() && !cdb.is_empty() {
            self.stats.cdb_deferrals += cdb.len() as u64;
            let losers: Vec<String> = cdb.deferred().iter().map(|m| m.tag.to_string()).collect();
            log.info(
                Phase::Arbitrate,
                format!("CDB contention: deferred {}", losers.join(", ")),
            );
        }
        self.cdb = cdb;

        let msg = msg?;
        self.stats.cdb_broadcasts += 1;
        log.info(
            Phase::Arbitrate,
            format!("CDB grant: {} = {}", msg.tag, display_value(msg.value, msg.dest)),
        );

        if let Some(dest) = msg.dest {
            if self.regs.write_if_producer(dest, msg.tag, msg.value) {
                log.info(
                    Phase::Broadcast,
                    format!("{dest} <- {}", display_value(msg.value, msg.dest)),
                );
            } else if dest.is_zero() {
                log.info(Phase::Broadcast, "write to R0 dropped");
            } else {
                log.info(
                    Phase::Broadcast,
                    format!("stale write to {dest} suppressed (renamed since)"),
                );
            }
        }
        for rs in &mut self.stations {
            if rs.capture(msg.tag, msg.value) && rs.state == RsState::WaitingForFu {
                log.info(Phase::Broadcast, format!("{} operands complete", rs.tag));
            }
        }
        for sb in &mut self.stores {
            if sb.capture(msg.tag, msg.value) {
                log.info(Phase::Broadcast, format!("{} captured store value", sb.tag));
            }
        }
        for bh in &mut self.branches {
            if bh.capture(msg.tag, msg.value) {
                log.info(Phase::Broadcast, format!("{} captured operand", bh.tag));
            }
        }

        self.free_producer(msg.tag, log);
        Some(msg)
    }

    fn count_dependents(&self, tag: Tag) -> DependencyCount {
        let mut count = DependencyCount::default();
        for rs in &self.stations {
            if rs.depends_on(tag) {
                count.dependents += 1;
                count.ready_dependents += u32::from(rs.ready_after(tag));
            }
        }
        for sb in &self.stores {
            if sb.depends_on(tag) {
                count.dependents += 1;
                count.ready_dependents += u32::from(sb.ready_after(tag));
            }
        }
        for bh in &self.branches {
            if bh.depends_on(tag) {
                count.dependents += 1;
                count.ready_dependents += u32::from(bh.ready_after(tag));
            }
        }
        count
    }

    fn free_producer(&mut self, tag: Tag, log: &mut CycleLog) {
        match tag.class {
            StationClass::Load => {
                self.loads[tag.index as usize].release();
            }
            _ => {
                if let Some(rs) = self.stations.iter_mut().find(|rs| rs.tag == tag) {
                    rs.release();
                }
            }
        }
        log.info(Phase::Free, format!("{tag} freed"));
    }

    // ────────────────────────────────────────────────────────────────
    // Phase 6: evaluate branches
    // ────────────────────────────────────────────────────────────────

    fn phase_branches(&mut self, log: &mut CycleLog) {
        for i in 0..self.branches.len() {
            let Some(outcome) = self.branches[i].evaluate_tick() else {
                continue;
            };
            self.stats.branches_resolved += 1;
            let tag = self.branches[i].tag;
            if outcome.taken {
                self.stats.branches_taken += 1;
                self.iq.reload_from(outcome.next_pc);
                self.branch_taken_this_cycle = true;
                log.info(
                    Phase::Branch,
                    format!("{tag} taken -> pc {}, queue reloaded", outcome.next_pc),
                );
            } else {
                log.info(Phase::Branch, format!("{tag} not taken"));
            }
            self.branches[i].release();
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Phase 7: dispatch
    // ────────────────────────────────────────────────────────────────

    fn phase_dispatch(&mut self, log: &mut CycleLog) {
        for rs_idx in 0..self.stations.len() {
            if self.stations[rs_idx].state != RsState::WaitingForFu {
                continue;
            }
            let Some(inst) = self.stations[rs_idx].inst else {
                continue;
            };
            let class = self.stations[rs_idx].class;
            if let Some(fu) = self
                .fus
                .iter_mut()
                .find(|f| !f.busy() && f.kind.serves(class))
            {
                fu.start(rs_idx, inst.opcode);
                self.stations[rs_idx].on_start_execution();
                log.info(
                    Phase::Dispatch,
                    format!(
                        "{} -> {:?} unit ({} cycles)",
                        self.stations[rs_idx].tag,
                        fu.kind,
                        fu.remaining
                    ),
                );
            }
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Phase 8: issue
    // ────────────────────────────────────────────────────────────────

    fn phase_issue(&mut self, log: &mut CycleLog) {
        let Some(pc) = self.iq.head() else { return };
        if self.branch_taken_this_cycle {
            self.stats.issue_stalls_branch += 1;
            log.info(Phase::Issue, "issue suppressed: branch taken this cycle");
            return;
        }
        if self.branches.iter().any(BranchHandler::busy) {
            self.stats.issue_stalls_branch += 1;
            log.info(Phase::Issue, "issue suppressed: branch pending");
            return;
        }
        let Some(inst) = self.program.get(pc).copied() else {
            let _ = self.iq.pop();
            return;
        };

        let issued = if inst.opcode.is_branch() {
            self.try_issue_branch(pc, inst, log)
        } else if inst.opcode.is_load() {
            self.try_issue_load(inst, log)
        } else if inst.opcode.is_store() {
            self.try_issue_store(inst, log)
        } else {
            self.try_issue_alu(inst, log)
        };

        if issued {
            let _ = self.iq.pop();
            self.stats.instructions_issued += 1;
        } else {
            self.stats.issue_stalls += 1;
        }
    }

    /// Reads a source register at issue: the value when no producer is
    /// outstanding, otherwise the producer's tag.
    fn read_operand(&self, reg: Reg) -> (Value, Option<Tag>) {
        match self.regs.producer(reg) {
            None => (self.regs.value(reg), None),
            some => (Value::ZERO, some),
        }
    }

    fn free_station(&self, class: StationClass) -> Option<usize> {
        self.stations
            .iter()
            .position(|rs| rs.class == class && !rs.busy())
    }

    fn free_address_unit(&self) -> Option<usize> {
        self.address_units.iter().position(|u| !u.busy())
    }

    fn try_issue_alu(&mut self, inst: Instruction, log: &mut CycleLog) -> bool {
        let class = if inst.opcode.is_fp_add_sub() {
            StationClass::FpAddSub
        } else if inst.opcode.is_fp_mul_div() {
            StationClass::FpMulDiv
        } else {
            StationClass::IntAlu
        };
        let Some(idx) = self.free_station(class) else {
            log.info(Phase::Issue, format!("stall: no free {class:?} station for {inst}"));
            return false;
        };

        let (vj, qj) = match inst.src1 {
            Some(reg) => self.read_operand(reg),
            None => (Value::ZERO, None),
        };
        let (vk, qk) = if inst.opcode.uses_second_source() {
            match inst.src2 {
                Some(reg) => self.read_operand(reg),
                None => (Value::ZERO, None),
            }
        } else {
            (Value::ZERO, None)
        };

        let tag = self.stations[idx].tag;
        self.stations[idx].issue(inst, vj, qj, vk, qk, inst.dest);
        if let Some(dest) = inst.dest {
            self.regs.set_producer(dest, tag);
        }
        log.info(Phase::Issue, format!("issued {inst} as {tag}"));
        true
    }

    fn try_issue_load(&mut self, inst: Instruction, log: &mut CycleLog) -> bool {
        let Some(base) = inst.base else { return false };
        let Some(dest) = inst.dest else { return false };
        let Some(idx) = self.loads.iter().position(|l| !l.busy()) else {
            log.info(Phase::Issue, format!("stall: no free load buffer for {inst}"));
            return false;
        };
        let Some(unit) = self.free_address_unit() else {
            log.info(Phase::Issue, format!("stall: no free address unit for {inst}"));
            return false;
        };
        if self.regs.producer(base).is_some() {
            log.info(Phase::Issue, format!("stall: base register {base} not ready for {inst}"));
            return false;
        }

        let ea = self.regs.value(base).as_int().wrapping_add(inst.offset);
        // A load's hit/miss latency is decided by an issue-time probe of the
        // address the base register already yields.
        let latency = match self.access_addr(Some(ea), inst.opcode.access_bytes()) {
            Some(addr) => self.charge_cache_access(addr),
            None => self.config.cache.hit_latency,
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let tag = self.loads[idx].tag;
        self.loads[idx].issue(inst, dest, seq, latency);
        self.address_units[unit].start(AddressTarget::Load(idx), ea, self.config.latency.address);
        self.regs.set_producer(dest, tag);
        log.info(Phase::Issue, format!("issued {inst} as {tag} (seq {seq})"));
        true
    }

    fn try_issue_store(&mut self, inst: Instruction, log: &mut CycleLog) -> bool {
        let Some(base) = inst.base else { return false };
        let Some(src) = inst.src1 else { return false };
        let Some(idx) = self.stores.iter().position(|s| !s.busy()) else {
            log.info(Phase::Issue, format!("stall: no free store buffer for {inst}"));
            return false;
        };
        let Some(unit) = self.free_address_unit() else {
            log.info(Phase::Issue, format!("stall: no free address unit for {inst}"));
            return false;
        };
        if self.regs.producer(base).is_some() {
            log.info(Phase::Issue, format!("stall: base register {base} not ready for {inst}"));
            return false;
        }

        let ea = self.regs.value(base).as_int().wrapping_add(inst.offset);
        let (value, source_tag) = self.read_operand(src);

        let seq = self.next_seq;
        self.next_seq += 1;
        let tag = self.stores[idx].tag;
        self.stores[idx].issue(inst, value, source_tag, seq);
        self.address_units[unit].start(AddressTarget::Store(idx), ea, self.config.latency.address);
        log.info(Phase::Issue, format!("issued {inst} as {tag} (seq {seq})"));
        true
    }

    fn try_issue_branch(&mut self, pc: usize, inst: Instruction, log: &mut CycleLog) -> bool {
        // Pending-branch suppression already ran, so some handler is free.
        let Some(idx) = self.branches.iter().position(|b| !b.busy()) else {
            return false;
        };
        let (vj, qj) = match inst.src1 {
            Some(reg) => self.read_operand(reg),
            None => (Value::ZERO, None),
        };
        let (vk, qk) = match inst.src2 {
            Some(reg) => self.read_operand(reg),
            None => (Value::ZERO, None),
        };
        let tag = self.branches[idx].tag;
        self.branches[idx].issue(inst, vj, qj, vk, qk, pc);
        log.info(Phase::Issue, format!("issued {inst} as {tag}"));
        true
    }

    // ────────────────────────────────────────────────────────────────
    // Phase 9: snapshot
    // ────────────────────────────────────────────────────────────────

    fn build_snapshot(&self, broadcast: Option<CdbMessage>, log: CycleLog) -> CycleSnapshot {
        let iq = IqSnapshot {
            head_pc: self.iq.head(),
            head_inst: self
                .iq
                .head()
                .and_then(|pc| self.program.get(pc))
                .map(ToString::to_string),
            len: self.iq.len(),
        };

        let stations = self
            .stations
            .iter()
            .map(|rs| StationSnapshot {
                tag: rs.tag.to_string(),
                state: rs.state,
                inst: rs.inst.map(|i| i.to_string()),
                vj: rs.vj.as_f64(),
                vk: rs.vk.as_f64(),
                qj: rs.qj.map(|t| t.to_string()),
                qk: rs.qk.map(|t| t.to_string()),
                dest: rs.dest.map(|d| d.to_string()),
            })
            .collect();

        let load_buffers = self
            .loads
            .iter()
            .map(|l| LoadBufferSnapshot {
                tag: l.tag.to_string(),
                state: l.state,
                inst: l.inst.map(|i| i.to_string()),
                ea: l.ea,
                remaining: l.remaining,
                seq: l.seq,
            })
            .collect();

        let store_buffers = self
            .stores
            .iter()
            .map(|s| StoreBufferSnapshot {
                tag: s.tag.to_string(),
                state: s.state,
                inst: s.inst.map(|i| i.to_string()),
                ea: s.ea,
                value: s.value.as_f64(),
                source_tag: s.source_tag.map(|t| t.to_string()),
                value_ready: s.value_ready(),
                remaining: s.remaining,
                seq: s.seq,
            })
            .collect();

        let branch_handlers = self
            .branches
            .iter()
            .map(|b| BranchSnapshot {
                tag: b.tag.to_string(),
                state: b.state,
                inst: b.inst.map(|i| i.to_string()),
                qj: b.qj.map(|t| t.to_string()),
                qk: b.qk.map(|t| t.to_string()),
                pc: b.pc,
                target: b.target,
            })
            .collect();

        let functional_units = self
            .fus
            .iter()
            .map(|f| FuSnapshot {
                kind: f.kind,
                station: f.current.map(|i| self.stations[i].tag.to_string()),
                remaining: f.remaining,
            })
            .collect();

        let address_units = self
            .address_units
            .iter()
            .map(|u| AddressUnitSnapshot {
                target: u.target.map(|t| match t {
                    AddressTarget::Load(i) => self.loads[i].tag.to_string(),
                    AddressTarget::Store(i) => self.stores[i].tag.to_string(),
                }),
                remaining: u.remaining,
            })
            .collect();

        let registers = self
            .regs
            .iter()
            .map(|(i, r)| RegisterSnapshot {
                name: if i < crate::common::reg::NUM_INT_REGS {
                    format!("R{i}")
                } else {
                    format!("F{}", i - crate::common::reg::NUM_INT_REGS)
                },
                value: r.value.as_f64(),
                int_value: r.value.as_int(),
                producer: r.producer.map(|t| t.to_string()),
            })
            .collect();

        CycleSnapshot {
            cycle: self.cycle,
            finished: self.is_finished(),
            iq,
            stations,
            load_buffers,
            store_buffers,
            branch_handlers,
            functional_units,
            address_units,
            registers,
            cache_lines: self.cache.line_summaries(),
            cdb: broadcast.map(|m| CdbSnapshot {
                tag: m.tag.to_string(),
                value: m.value.as_f64(),
                dest: m.dest.map(|d| d.to_string()),
            }),
            stats: self.stats.clone(),
            log: log.into_entries(),
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Invariant checking (used by the test suite after every cycle)
    // ────────────────────────────────────────────────────────────────

    /// Verifies the cross-structure invariants that must hold after every
    /// cycle; returns a description of the first violation found.
    pub fn verify_invariants(&self) -> Result<(), String> {
        // Every register producer names exactly one busy structure.
        for (i, r) in self.regs.iter() {
            if let Some(tag) = r.producer {
                let n = self.busy_producers(tag);
                if n != 1 {
                    return Err(format!(
                        "register {i} has producer {tag} with {n} busy owners"
                    ));
                }
            }
        }
        // Every outstanding Q tag names exactly one busy producer.
        let mut waiting: Vec<(String, Tag)> = Vec::new();
        for rs in &self.stations {
            for q in [rs.qj, rs.qk].into_iter().flatten() {
                if rs.busy() {
                    waiting.push((rs.tag.to_string(), q));
                }
            }
            if rs.state == RsState::WaitingForFu && !rs.operands_ready() {
                return Err(format!("{} waiting for FU with outstanding operands", rs.tag));
            }
        }
        for sb in &self.stores {
            if sb.busy()
                && let Some(q) = sb.source_tag
            {
                waiting.push((sb.tag.to_string(), q));
            }
        }
        for bh in &self.branches {
            if bh.busy() {
                for q in [bh.qj, bh.qk].into_iter().flatten() {
                    waiting.push((bh.tag.to_string(), q));
                }
            }
        }
        for (owner, q) in waiting {
            let n = self.busy_producers(q);
            if n != 1 {
                return Err(format!("{owner} waits on {q} with {n} busy producers"));
            }
        }
        // Busy memory-op sequence numbers are unique and below the counter.
        let mut seqs: Vec<u64> = self
            .loads
            .iter()
            .filter(|l| l.busy())
            .map(|l| l.seq)
            .chain(self.stores.iter().filter(|s| s.busy()).map(|s| s.seq))
            .collect();
        seqs.sort_unstable();
        if seqs.iter().any(|&s| s >= self.next_seq) {
            return Err("memory-op sequence number beyond the counter".into());
        }
        if seqs.windows(2).any(|w| w[0] == w[1]) {
            return Err("duplicate memory-op sequence numbers".into());
        }
        // Cache shape: dirty implies valid, total bytes constant.
        for line in self.cache.line_summaries() {
            if line.dirty && !line.valid {
                return Err(format!("cache line {} dirty but invalid", line.index));
            }
        }
        if self.cache.total_bytes() != self.config.cache.size_bytes {
            return Err("cache data size drifted from configuration".into());
        }
        Ok(())
    }

    fn busy_producers(&self, tag: Tag) -> usize {
        let stations = self
            .stations
            .iter()
            .filter(|rs| rs.busy() && rs.tag == tag)
            .count();
        let loads = self
            .loads
            .iter()
            .filter(|l| l.busy() && l.tag == tag)
            .count();
        stations + loads
    }
}

impl LoadBuffer {
    fn op_bytes(&self) -> usize {
        self.inst.map_or(8, |i| i.opcode.access_bytes())
    }
}

impl StoreBuffer {
    fn op_bytes(&self) -> usize {
        self.inst.map_or(8, |i| i.opcode.access_bytes())
    }
}

/// Formats a value by the bank of its destination register: FP registers
/// display the double view, everything else the integer view.
fn display_value(value: Value, dest: Option<Reg>) -> String {
    if dest.is_some_and(|d| !d.is_fp()) {
        value.as_int().to_string()
    } else {
        value.as_f64().to_string()
    }
}
