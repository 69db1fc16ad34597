//! Cache hit/miss timing and write-back visibility.

use pretty_assertions::assert_eq;
use tomasim_core::{CoreConfig, InitialState};

use crate::common::*;

/// A cold load pays `hit + miss` cycles; once its block is resident, a
/// later load to the same block pays only the hit latency and can even
/// finish first.
#[test]
fn second_load_to_a_block_hits() {
    // The filler keeps the second load's issue (and probe) behind the first
    // load's block fetch.
    let program = vec![ld(1, 2, 0), dadd(9, 0, 0), ld(3, 2, 0)];
    let (sim, snapshots) = run_checked(program, CoreConfig::default(), &textbook_init(), 50);

    assert_eq!(fp(&sim, 1), 1.0);
    assert_eq!(fp(&sim, 3), 1.0);
    assert_eq!(sim.core.stats().dcache_misses, 1);
    assert_eq!(sim.core.stats().dcache_hits, 1);

    // The hit completes long before the miss: write-back order is L2, L1.
    let cold = broadcast_cycle(&snapshots, "L1").unwrap();
    let warm = broadcast_cycle(&snapshots, "L2").unwrap();
    assert_eq!(cold, 13);
    assert_eq!(warm, 5);
}

/// Loads to distinct blocks each pay the miss penalty.
#[test]
fn distinct_blocks_miss_separately() {
    let program = vec![ld(1, 2, 0), ld(3, 2, 8)];
    let (sim, _) = run_checked(program, CoreConfig::default(), &textbook_init(), 50);

    assert_eq!(fp(&sim, 1), 1.0);
    assert_eq!(fp(&sim, 3), 2.0);
    assert_eq!(sim.core.stats().dcache_misses, 2);
    assert_eq!(sim.core.stats().dcache_hits, 0);
}

/// The cache is write-back: a committed store dirties the line and memory
/// stays stale until the dirty line is flushed (or evicted).
#[test]
fn write_back_defers_memory_update() {
    let program = vec![sd(2, 2, 0)];
    let (mut sim, snapshots) = run_checked(program, CoreConfig::default(), &textbook_init(), 50);

    // Through the cache the store is visible; raw memory still holds 1.0.
    assert_eq!(sim.core.peek_f64(100), 2.0);
    assert_eq!(sim.core.memory_f64(100), 1.0);

    let final_lines = &snapshots.last().unwrap().cache_lines;
    assert!(final_lines.iter().any(|l| l.valid && l.dirty));

    sim.core.flush_cache();
    assert_eq!(sim.core.memory_f64(100), 2.0);
}

/// A conflicting fetch evicts the dirty line and writes it back, so the
/// store's effect survives eviction.
#[test]
fn eviction_writes_the_dirty_victim_back() {
    // 256-byte cache, 8-byte blocks: addresses 100 and 356 share index 12.
    let init = InitialState::new()
        .int_reg(2, 100)
        .fp_reg(2, 2.0)
        .mem_f64(356, 7.0);
    let program = vec![
        sd(2, 2, 0),     // dirties the line for address 100
        ld(4, 2, 256),   // conflicting fetch of address 356 evicts it
    ];
    let (sim, _) = run_checked(program, CoreConfig::default(), &init, 100);

    assert_eq!(fp(&sim, 4), 7.0);
    // The evicted line went back to memory without an explicit flush.
    assert_eq!(sim.core.memory_f64(100), 2.0);
}

/// A store's hit/miss outcome is decided when it becomes ready to commit,
/// so it benefits from a block an earlier access brought in.
#[test]
fn store_probes_at_commit_readiness() {
    let program = vec![ld(1, 2, 0), sd(2, 2, 0)];
    let (sim, _) = run_checked(program, CoreConfig::default(), &textbook_init(), 100);

    // The load misses; the store, ordered behind it, then hits.
    assert_eq!(sim.core.stats().dcache_misses, 1);
    assert_eq!(sim.core.stats().dcache_hits, 1);
    assert_eq!(sim.core.peek_f64(100), 2.0);
}
