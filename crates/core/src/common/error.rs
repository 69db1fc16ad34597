//! Construction-time error types.
//!
//! Errors here are the caller's fault and are rejected before any simulation
//! runs: malformed configuration and malformed programs. Everything that can
//! go wrong *during* a cycle (divide-by-zero, out-of-bounds access) is a
//! recoverable anomaly surfaced through the cycle log, never through these
//! types.

use thiserror::Error;

/// Rejected configuration, reported at core construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Cache total size must be a power of two.
    #[error("cache size must be a power of two, got {0} bytes")]
    CacheSizeNotPowerOfTwo(usize),

    /// Cache block size must be a power of two.
    #[error("cache block size must be a power of two, got {0} bytes")]
    BlockSizeNotPowerOfTwo(usize),

    /// A block cannot exceed the whole cache.
    #[error("cache block ({block} bytes) larger than cache ({cache} bytes)")]
    BlockLargerThanCache {
        /// Configured block size in bytes.
        block: usize,
        /// Configured cache size in bytes.
        cache: usize,
    },

    /// Every station, buffer, and unit pool needs at least one slot.
    #[error("{0} pool size must be at least 1")]
    ZeroPoolSize(&'static str),

    /// Every latency is a positive cycle count.
    #[error("{0} latency must be at least 1 cycle")]
    ZeroLatency(&'static str),

    /// Backing memory must hold at least one cache block.
    #[error("memory size ({memory} bytes) smaller than one cache block ({block} bytes)")]
    MemoryTooSmall {
        /// Configured memory size in bytes.
        memory: usize,
        /// Configured block size in bytes.
        block: usize,
    },
}

/// Rejected program, reported at program construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    /// A branch names a target outside the program.
    #[error("branch at pc {pc} targets instruction {target}, but the program has {len} instructions")]
    BranchTargetOutOfRange {
        /// Index of the offending branch.
        pc: usize,
        /// Target instruction index.
        target: usize,
        /// Program length.
        len: usize,
    },
}
