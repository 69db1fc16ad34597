//! Instruction shorthands, canonical machine state, and checked run loops.
//!
//! The shorthands keep scenario programs readable (`ld(6, 2, 0)` is
//! `L.D F6, 0(R2)`), and `run_checked` steps a simulator to completion
//! while verifying the cross-structure invariants after every cycle.

use tomasim_core::common::Reg;
use tomasim_core::config::CoreConfig;
use tomasim_core::isa::{Instruction, Opcode};
use tomasim_core::snapshot::CycleSnapshot;
use tomasim_core::{InitialState, Program, Simulator};

/// `L.D Fd, offset(Rb)`
pub fn ld(d: usize, b: usize, offset: i64) -> Instruction {
    Instruction::load(Opcode::Ld, Reg::fp(d), Reg::int(b), offset)
}

/// `LW Rd, offset(Rb)`
pub fn lw(d: usize, b: usize, offset: i64) -> Instruction {
    Instruction::load(Opcode::Lw, Reg::int(d), Reg::int(b), offset)
}

/// `S.D Fs, offset(Rb)`
pub fn sd(s: usize, b: usize, offset: i64) -> Instruction {
    Instruction::store(Opcode::Sd, Reg::fp(s), Reg::int(b), offset)
}

/// `SW Rs, offset(Rb)`
pub fn sw(s: usize, b: usize, offset: i64) -> Instruction {
    Instruction::store(Opcode::Sw, Reg::int(s), Reg::int(b), offset)
}

/// `ADD.D Fd, Fa, Fb`
pub fn add_d(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::alu(Opcode::AddD, Reg::fp(d), Reg::fp(a), Reg::fp(b))
}

/// `SUB.D Fd, Fa, Fb`
pub fn sub_d(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::alu(Opcode::SubD, Reg::fp(d), Reg::fp(a), Reg::fp(b))
}

/// `MUL.D Fd, Fa, Fb`
pub fn mul_d(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::alu(Opcode::MulD, Reg::fp(d), Reg::fp(a), Reg::fp(b))
}

/// `DIV.D Fd, Fa, Fb`
pub fn div_d(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::alu(Opcode::DivD, Reg::fp(d), Reg::fp(a), Reg::fp(b))
}

/// `DADD Rd, Ra, Rb`
pub fn dadd(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::alu(Opcode::Dadd, Reg::int(d), Reg::int(a), Reg::int(b))
}

/// `DDIV Rd, Ra, Rb`
pub fn ddiv(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::alu(Opcode::Ddiv, Reg::int(d), Reg::int(a), Reg::int(b))
}

/// `DADDI Rd, Ra, imm`
pub fn daddi(d: usize, a: usize, imm: i64) -> Instruction {
    Instruction::alu_imm(Opcode::Daddi, Reg::int(d), Reg::int(a), imm)
}

/// `BEQ Ra, Rb, target`
pub fn beq(a: usize, b: usize, target: usize) -> Instruction {
    Instruction::branch(Opcode::Beq, Reg::int(a), Reg::int(b), target)
}

/// `BNE Ra, Rb, target`
pub fn bne(a: usize, b: usize, target: usize) -> Instruction {
    Instruction::branch(Opcode::Bne, Reg::int(a), Reg::int(b), target)
}

/// The canonical machine state the scenario programs assume:
/// `R2 = 100`, doubles 1.0/2.0/3.0 at 100/108/120, `F1..F4 = 10, 2, 3, 4`.
pub fn textbook_init() -> InitialState {
    InitialState::new()
        .int_reg(2, 100)
        .mem_f64(100, 1.0)
        .mem_f64(108, 2.0)
        .mem_f64(120, 3.0)
        .fp_reg(1, 10.0)
        .fp_reg(2, 2.0)
        .fp_reg(3, 3.0)
        .fp_reg(4, 4.0)
}

/// Builds the simulator, panicking on construction errors.
pub fn simulator(insts: Vec<Instruction>, config: CoreConfig, init: &InitialState) -> Simulator {
    let program = Program::new(insts).unwrap();
    Simulator::new(program, config, init).unwrap()
}

/// Steps until the machine drains (or `cap` cycles pass), verifying core
/// invariants after every cycle. Returns the simulator and all snapshots.
pub fn run_checked(
    insts: Vec<Instruction>,
    config: CoreConfig,
    init: &InitialState,
    cap: u64,
) -> (Simulator, Vec<CycleSnapshot>) {
    let mut sim = simulator(insts, config, init);
    let mut snapshots = Vec::new();
    for _ in 0..cap {
        let snapshot = sim.step();
        if let Err(violation) = sim.core.verify_invariants() {
            panic!("invariant violated at cycle {}: {violation}", snapshot.cycle);
        }
        let finished = snapshot.finished;
        snapshots.push(snapshot);
        if finished {
            break;
        }
    }
    assert!(
        sim.core.is_finished(),
        "simulation did not drain within {cap} cycles"
    );
    (sim, snapshots)
}

/// Final double view of `Fn`.
pub fn fp(sim: &Simulator, n: usize) -> f64 {
    sim.core.reg_value(Reg::fp(n)).as_f64()
}

/// Final integer view of `Rn`.
pub fn int(sim: &Simulator, n: usize) -> i64 {
    sim.core.reg_value(Reg::int(n)).as_int()
}

/// The cycle in which `tag` was broadcast on the CDB, if any.
pub fn broadcast_cycle(snapshots: &[CycleSnapshot], tag: &str) -> Option<u64> {
    snapshots
        .iter()
        .find(|s| s.cdb.as_ref().is_some_and(|c| c.tag == tag))
        .map(|s| s.cycle)
}
