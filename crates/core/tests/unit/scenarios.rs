//! End-to-end scenarios on the textbook machine.

use pretty_assertions::assert_eq;
use tomasim_core::common::Reg;
use tomasim_core::{CoreConfig, InitialState};

use crate::common::*;

/// The classic RAW chain: two loads feed a multiply, subtract, divide, and
/// add, and the result is stored back. Every architectural value must match
/// the sequential execution.
#[test]
fn classic_raw_chain() {
    let program = vec![
        ld(6, 2, 0),     // F6 <- mem[100] = 1.0
        ld(2, 2, 8),     // F2 <- mem[108] = 2.0
        mul_d(0, 2, 4),  // F0 <- 2.0 * 4.0 = 8.0
        sub_d(8, 2, 6),  // F8 <- 2.0 - 1.0 = 1.0
        div_d(10, 0, 6), // F10 <- 8.0 / 1.0 = 8.0
        add_d(6, 8, 2),  // F6 <- 1.0 + 2.0 = 3.0
        sd(6, 2, 8),     // mem[108] <- 3.0
    ];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &textbook_init(), 200);

    assert_eq!(fp(&sim, 0), 8.0);
    assert_eq!(fp(&sim, 2), 2.0);
    assert_eq!(fp(&sim, 6), 3.0);
    assert_eq!(fp(&sim, 8), 1.0);
    assert_eq!(fp(&sim, 10), 8.0);
    assert_eq!(sim.core.peek_f64(108), 3.0);

    // The divide dominates the critical path.
    assert_eq!(sim.core.cycle(), 64);
    assert_eq!(sim.core.stats().cdb_broadcasts, 6);
    assert_eq!(sim.core.stats().stores_committed, 1);
    assert_eq!(sim.core.stats().cdb_deferrals, 0);

    // The first load's F6 write is stale by the time it broadcasts (the
    // trailing add renamed F6), yet its consumers still captured it.
    let first_load = broadcast_cycle(&snapshots, "L1").unwrap();
    let final_add = broadcast_cycle(&snapshots, "A2").unwrap();
    assert!(first_load < final_add);
}

/// At termination no producer tags remain anywhere.
#[test]
fn termination_leaves_no_producers() {
    let program = vec![
        ld(6, 2, 0),
        mul_d(0, 6, 4),
        add_d(1, 0, 6),
        sd(1, 2, 16),
    ];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &textbook_init(), 200);

    let last = snapshots.last().unwrap();
    assert!(last.finished);
    for reg in &last.registers {
        assert_eq!(reg.producer, None, "{} still renamed at termination", reg.name);
    }
    assert_eq!(fp(&sim, 1), 5.0); // 1.0 * 4.0 + 1.0
    assert_eq!(sim.core.peek_f64(116), 5.0);
}

/// Independent arithmetic with ample pool sizes drains in issue width plus
/// pipeline depth plus the operation latency.
#[test]
fn independent_arithmetic_is_bounded() {
    let mut config = CoreConfig::default();
    config.stations.int_rs = 8;
    config.stations.int_alus = 8;

    let n = 8;
    let program: Vec<_> = (1..=n).map(|i| daddi(i, 0, i as i64)).collect();
    let (sim, _) = run_checked(program, config.clone(), &InitialState::new(), 100);

    for i in 1..=n {
        assert_eq!(int(&sim, i), i as i64);
    }
    // One issue per cycle, one broadcast per cycle: wake (1) + execute (1)
    // after the final issue bounds the drain.
    assert!(sim.core.cycle() <= (n as u64) + config.latency.int_alu + 2);
}

/// Integer division by zero yields zero and a warning, without stopping
/// the machine; FP division by zero follows IEEE-754.
#[test]
fn divide_by_zero_is_recoverable() {
    let init = InitialState::new().fp_reg(2, 2.0);
    let program = vec![
        daddi(1, 0, 5),
        ddiv(3, 1, 0),   // 5 / 0 -> 0, with a warning
        div_d(1, 2, 5),  // 2.0 / 0.0 -> inf, no warning
    ];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &init, 200);

    assert_eq!(int(&sim, 3), 0);
    assert_eq!(fp(&sim, 1), f64::INFINITY);
    assert_eq!(sim.core.stats().int_divide_by_zero, 1);
    assert_eq!(
        snapshots.iter().filter(|s| s.has_warnings()).count(),
        1,
        "exactly the integer divide warns"
    );
}

/// Single-precision opcodes share the double path and the same FU pools.
#[test]
fn single_precision_shares_the_double_path() {
    use tomasim_core::Instruction;
    use tomasim_core::isa::Opcode;

    let init = InitialState::new().fp_reg(2, 2.0).fp_reg(3, 3.0);
    let program = vec![
        Instruction::alu(Opcode::AddS, Reg::fp(1), Reg::fp(2), Reg::fp(3)),
        Instruction::alu(Opcode::MulS, Reg::fp(4), Reg::fp(2), Reg::fp(3)),
    ];
    let (sim, _) = run_checked(program, CoreConfig::default(), &init, 200);

    assert_eq!(fp(&sim, 1), 5.0);
    assert_eq!(fp(&sim, 4), 6.0);
}

/// Snapshots serialize for the external UI.
#[test]
fn snapshots_serialize_to_json() {
    let program = vec![ld(6, 2, 0), add_d(1, 6, 2)];
    let (_, snapshots) = run_checked(program, CoreConfig::default(), &textbook_init(), 200);

    let json = serde_json::to_string(&snapshots[0]).unwrap();
    assert!(json.contains("\"cycle\":1"));
    assert!(json.contains("\"stations\""));
    assert!(json.contains("\"cache_lines\""));

    let last = serde_json::to_string(snapshots.last().unwrap()).unwrap();
    assert!(last.contains("\"finished\":true"));
}
