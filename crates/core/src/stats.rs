//! Simulation statistics collection.
//!
//! This module tracks the counters the core accumulates while stepping. It
//! provides:
//! 1. **Throughput:** Cycles, issued and completed instruction counts.
//! 2. **Memory:** Load/store completions and data cache hit/miss counts.
//! 3. **CDB:** Broadcasts performed and messages deferred by arbitration.
//! 4. **Stalls:** Issue stalls, split by structural and pending-branch causes.
//! 5. **Anomalies:** Divide-by-zero and out-of-bounds access counts.

use serde::Serialize;

/// Counter block accumulated over a simulation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SimStats {
    /// Total cycles stepped.
    pub cycles: u64,
    /// Instructions issued from the queue.
    pub instructions_issued: u64,
    /// Results broadcast on the CDB (arithmetic ops and loads).
    pub cdb_broadcasts: u64,
    /// Ready messages deferred to a later cycle by CDB contention.
    pub cdb_deferrals: u64,

    /// Loads that completed their memory access.
    pub loads_completed: u64,
    /// Stores committed to the cache.
    pub stores_committed: u64,
    /// Branches evaluated.
    pub branches_resolved: u64,
    /// Branches evaluated as taken.
    pub branches_taken: u64,

    /// Data cache hits (counted when an access latency is decided).
    pub dcache_hits: u64,
    /// Data cache misses (counted when an access latency is decided).
    pub dcache_misses: u64,

    /// Cycles the queue head existed but could not issue.
    pub issue_stalls: u64,
    /// Cycles issue was suppressed because a branch was pending or taken.
    pub issue_stalls_branch: u64,

    /// Integer divide-by-zero anomalies.
    pub int_divide_by_zero: u64,
    /// Out-of-bounds memory accesses (reads and dropped writes).
    pub oob_accesses: u64,
}
