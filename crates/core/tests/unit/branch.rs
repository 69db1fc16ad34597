//! Branch capture, evaluation, flush, and issue suppression.

use pretty_assertions::assert_eq;
use tomasim_core::{CoreConfig, InitialState};

use crate::common::*;

/// A taken branch flushes the queue and reloads from the target: the
/// skipped instruction never issues and its destination stays untouched.
#[test]
fn taken_branch_flushes_and_reloads() {
    let program = vec![
        daddi(1, 0, 1),
        beq(1, 1, 3),
        add_d(1, 2, 3), // skipped
        add_d(4, 2, 3), // target
    ];
    let (sim, _) = run_checked(program, CoreConfig::default(), &textbook_init(), 50);

    assert_eq!(fp(&sim, 1), 10.0, "the skipped write never happened");
    assert_eq!(fp(&sim, 4), 5.0);
    assert_eq!(sim.core.stats().instructions_issued, 3);
    assert_eq!(sim.core.stats().branches_resolved, 1);
    assert_eq!(sim.core.stats().branches_taken, 1);
}

/// A not-taken branch falls through: the already-queued successors issue
/// normally.
#[test]
fn not_taken_branch_falls_through() {
    let program = vec![daddi(1, 0, 1), bne(1, 1, 3), dadd(3, 1, 1)];
    let (sim, _) = run_checked(program, CoreConfig::default(), &InitialState::new(), 50);

    assert_eq!(int(&sim, 3), 2);
    assert_eq!(sim.core.stats().instructions_issued, 3);
    assert_eq!(sim.core.stats().branches_resolved, 1);
    assert_eq!(sim.core.stats().branches_taken, 0);
}

/// While a branch waits on its operand nothing younger issues: the machine
/// is stall-on-branch, so no cancellation of in-flight work is ever needed.
#[test]
fn pending_branch_suppresses_issue() {
    let init = InitialState::new()
        .int_reg(2, 100)
        .mem_f64(100, f64::from_bits(7));

    let program = vec![
        lw(1, 2, 0),    // resolves at cycle 13
        beq(1, 0, 4),   // waits on R1; 7 != 0, not taken
        dadd(5, 2, 2),  // must not issue while the branch is pending
        dadd(6, 2, 2),
    ];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &init, 100);

    assert_eq!(int(&sim, 5), 200);
    assert_eq!(int(&sim, 6), 200);
    assert_eq!(sim.core.stats().branches_taken, 0);
    // The branch issues at cycle 2 and resolves with the load's broadcast
    // at cycle 13; the head stalls for every cycle in between.
    assert_eq!(sim.core.stats().issue_stalls_branch, 10);
    // No arithmetic result can appear before the branch resolved.
    let first_int = broadcast_cycle(&snapshots, "I1").unwrap();
    assert!(first_int > 13);
}

/// Comparison is on the integer view of the operands.
#[test]
fn branch_compares_integer_views() {
    let program = vec![daddi(1, 0, -3), daddi(3, 0, -3), beq(1, 3, 4), daddi(5, 0, 9)];
    let (sim, _) = run_checked(program, CoreConfig::default(), &InitialState::new(), 50);

    assert_eq!(int(&sim, 5), 0, "taken branch skipped the final write");
    assert_eq!(sim.core.stats().branches_taken, 1);
}
