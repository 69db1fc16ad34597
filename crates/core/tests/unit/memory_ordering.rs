//! Load/store ordering by sequence number.

use pretty_assertions::assert_eq;
use tomasim_core::{CoreConfig, InitialState};

use crate::common::*;

/// First cycle at which `pick` reads non-zero from the running stat counters.
fn first_cycle(snapshots: &[tomasim_core::CycleSnapshot], pick: fn(&tomasim_core::stats::SimStats) -> u64) -> Option<u64> {
    snapshots.iter().find(|s| pick(&s.stats) > 0).map(|s| s.cycle)
}

/// A load behind a store to the same address must wait for the commit, even
/// though the store itself waits on its value from the CDB. The load then
/// observes the stored value, not the pre-initialized one.
#[test]
fn load_waits_for_older_aliasing_store() {
    let program = vec![
        add_d(1, 2, 3),  // F1 = 5.0, the store's value
        sd(1, 2, 0),     // mem[100] <- F1 (captures via CDB)
        ld(4, 2, 0),     // must read 5.0, not the initial 1.0
    ];
    let (mut sim, snapshots) = run_checked(program, CoreConfig::default(), &textbook_init(), 100);

    assert_eq!(fp(&sim, 4), 5.0);
    assert_eq!(sim.core.peek_f64(100), 5.0);

    let store_done = first_cycle(&snapshots, |s| s.stores_committed).unwrap();
    let load_done = first_cycle(&snapshots, |s| s.loads_completed).unwrap();
    assert!(store_done < load_done, "store committed before the load read");

    sim.core.flush_cache();
    assert_eq!(sim.core.memory_f64(100), 5.0);
}

/// A store behind a load of the same address must wait for the load, so the
/// load observes the old value and memory ends with the new one.
#[test]
fn store_waits_for_older_aliasing_load() {
    let program = vec![ld(4, 2, 0), sd(2, 2, 0)];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &textbook_init(), 100);

    assert_eq!(fp(&sim, 4), 1.0, "load observed the pre-store value");
    assert_eq!(sim.core.peek_f64(100), 2.0);

    let load_done = first_cycle(&snapshots, |s| s.loads_completed).unwrap();
    let store_done = first_cycle(&snapshots, |s| s.stores_committed).unwrap();
    assert!(load_done < store_done, "load read before the store committed");
}

/// Disjoint addresses do not order against each other: a load behind a
/// store to a different address overlaps with it instead of waiting.
#[test]
fn disjoint_addresses_do_not_block() {
    let program = vec![sd(2, 2, 0), ld(4, 2, 20)];
    let (sim, _) = run_checked(program, CoreConfig::default(), &textbook_init(), 100);

    assert_eq!(fp(&sim, 4), 3.0);
    assert_eq!(sim.core.peek_f64(100), 2.0);
    // Store miss commits at cycle 13, load miss completes at 14; a blocked
    // load would have landed well past 20.
    assert!(sim.core.cycle() <= 15);
}

/// Two stores to one address commit in sequence order; a trailing load sees
/// the younger value.
#[test]
fn stores_to_one_address_commit_in_order() {
    let program = vec![sd(2, 2, 0), sd(3, 2, 0), ld(4, 2, 0)];
    let (sim, _) = run_checked(program, CoreConfig::default(), &textbook_init(), 100);

    assert_eq!(fp(&sim, 4), 3.0, "the younger store's value survives");
    assert_eq!(sim.core.peek_f64(100), 3.0);
    assert_eq!(sim.core.stats().stores_committed, 2);
}

/// Word stores write the low 32 bits; word loads sign-extend them back.
#[test]
fn word_accesses_round_trip() {
    let init = InitialState::new().int_reg(2, 100);
    let program = vec![daddi(1, 0, -5), sw(1, 2, 0), lw(3, 2, 0)];
    let (sim, _) = run_checked(program, CoreConfig::default(), &init, 100);

    assert_eq!(int(&sim, 3), -5);
    assert_eq!(sim.core.stats().stores_committed, 1);
    assert_eq!(sim.core.stats().loads_completed, 1);
}

/// Out-of-bounds loads read a defined zero and warn; the run continues.
#[test]
fn out_of_bounds_load_reads_zero() {
    let init = InitialState::new().int_reg(2, 5000).fp_reg(6, 9.0);
    let program = vec![ld(6, 2, 0)];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &init, 50);

    assert_eq!(fp(&sim, 6), 0.0);
    assert_eq!(sim.core.stats().oob_accesses, 1);
    assert!(snapshots.iter().any(tomasim_core::CycleSnapshot::has_warnings));
}

/// Out-of-bounds stores are dropped with a warning.
#[test]
fn out_of_bounds_store_is_dropped() {
    let init = InitialState::new().int_reg(2, -8).fp_reg(2, 2.0);
    let program = vec![sd(2, 2, 0)];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &init, 50);

    assert_eq!(sim.core.stats().oob_accesses, 1);
    assert_eq!(sim.core.stats().stores_committed, 1);
    assert!(snapshots.iter().any(tomasim_core::CycleSnapshot::has_warnings));
}
