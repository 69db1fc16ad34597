//! Configuration system for the simulator core.
//!
//! This module defines all configuration structures used to parameterize the
//! core. It provides:
//! 1. **Defaults:** Baseline hardware constants (pool sizes, latencies, cache geometry).
//! 2. **Structures:** Hierarchical config for stations, latencies, cache, and memory.
//! 3. **Validation:** Construction-time checks that reject malformed configurations
//!    before any simulation proceeds.
//!
//! Configuration is supplied as JSON by the external front-end, or use
//! `CoreConfig::default()` for the textbook machine.

use serde::Deserialize;

use crate::common::ConfigError;

/// Default configuration constants for the core.
///
/// These values describe the textbook Tomasulo machine used when nothing is
/// explicitly overridden.
mod defaults {
    /// FP add/subtract reservation stations.
    pub const FP_ADD_SUB_RS: usize = 3;

    /// FP multiply/divide reservation stations.
    pub const FP_MUL_DIV_RS: usize = 3;

    /// Integer ALU reservation stations.
    pub const INT_RS: usize = 3;

    /// Load buffers.
    pub const LOAD_BUFFERS: usize = 2;

    /// Store buffers.
    pub const STORE_BUFFERS: usize = 2;

    /// Branch handlers. One suffices: the core stalls issue while a branch
    /// is pending, so a second handler can never be occupied.
    pub const BRANCH_HANDLERS: usize = 1;

    /// Concurrent effective-address computations.
    pub const ADDRESS_UNITS: usize = 1;

    /// Integer ALU functional units.
    pub const INT_ALUS: usize = 2;

    /// FP add/subtract functional units.
    pub const FP_ADD_SUB_UNITS: usize = 1;

    /// FP multiply/divide functional units.
    pub const FP_MUL_DIV_UNITS: usize = 1;

    /// Integer ALU latency in cycles.
    pub const INT_ALU_LATENCY: u64 = 1;

    /// FP add/subtract latency in cycles.
    pub const FP_ADD_SUB_LATENCY: u64 = 2;

    /// FP multiply latency in cycles.
    pub const FP_MUL_LATENCY: u64 = 10;

    /// FP divide latency in cycles.
    pub const FP_DIV_LATENCY: u64 = 40;

    /// Effective-address computation latency in cycles.
    pub const ADDRESS_LATENCY: u64 = 1;

    /// Branch evaluation latency in cycles.
    pub const BRANCH_LATENCY: u64 = 1;

    /// Data cache total size in bytes.
    pub const CACHE_SIZE: usize = 256;

    /// Data cache block size in bytes.
    pub const CACHE_BLOCK: usize = 8;

    /// Data cache hit latency in cycles.
    pub const CACHE_HIT_LATENCY: u64 = 1;

    /// Additional cycles on a data cache miss.
    pub const CACHE_MISS_PENALTY: u64 = 10;

    /// Backing memory size in bytes.
    pub const MEMORY_SIZE: usize = 4096;
}

/// Root configuration for the simulator core.
///
/// # Examples
///
/// The default configuration is the textbook machine:
///
/// ```
/// use tomasim_core::config::CoreConfig;
///
/// let config = CoreConfig::default();
/// assert_eq!(config.stations.fp_add_sub_rs, 3);
/// assert_eq!(config.latency.fp_div, 40);
/// assert!(config.validate().is_ok());
/// ```
///
/// Deserializing from JSON (typical front-end usage); omitted fields keep
/// their defaults:
///
/// ```
/// use tomasim_core::config::CoreConfig;
///
/// let json = r#"{
///     "stations": { "int_rs": 5, "load_buffers": 4 },
///     "latency": { "fp_mul": 7 },
///     "cache": { "size_bytes": 512, "block_bytes": 16 },
///     "memory": { "size_bytes": 8192 }
/// }"#;
///
/// let config: CoreConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.stations.int_rs, 5);
/// assert_eq!(config.stations.store_buffers, 2);
/// assert_eq!(config.latency.fp_mul, 7);
/// assert_eq!(config.cache.block_bytes, 16);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreConfig {
    /// Station, buffer, and unit pool sizes.
    #[serde(default)]
    pub stations: StationConfig,
    /// Per-operation latencies.
    #[serde(default)]
    pub latency: LatencyConfig,
    /// Data cache geometry and timing.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Backing memory.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl CoreConfig {
    /// Checks the whole configuration, returning the first offense found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stations.validate()?;
        self.latency.validate()?;
        self.cache.validate()?;
        if self.memory.size_bytes < self.cache.block_bytes {
            return Err(ConfigError::MemoryTooSmall {
                memory: self.memory.size_bytes,
                block: self.cache.block_bytes,
            });
        }
        Ok(())
    }
}

/// Station, buffer, and functional unit pool sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    /// FP add/subtract reservation stations.
    #[serde(default = "StationConfig::default_fp_add_sub_rs")]
    pub fp_add_sub_rs: usize,

    /// FP multiply/divide reservation stations.
    #[serde(default = "StationConfig::default_fp_mul_div_rs")]
    pub fp_mul_div_rs: usize,

    /// Integer ALU reservation stations.
    #[serde(default = "StationConfig::default_int_rs")]
    pub int_rs: usize,

    /// Load buffers.
    #[serde(default = "StationConfig::default_load_buffers")]
    pub load_buffers: usize,

    /// Store buffers.
    #[serde(default = "StationConfig::default_store_buffers")]
    pub store_buffers: usize,

    /// Branch handlers.
    #[serde(default = "StationConfig::default_branch_handlers")]
    pub branch_handlers: usize,

    /// Concurrent effective-address computations.
    #[serde(default = "StationConfig::default_address_units")]
    pub address_units: usize,

    /// Integer ALU functional units.
    #[serde(default = "StationConfig::default_int_alus")]
    pub int_alus: usize,

    /// FP add/subtract functional units.
    #[serde(default = "StationConfig::default_fp_add_sub_units")]
    pub fp_add_sub_units: usize,

    /// FP multiply/divide functional units.
    #[serde(default = "StationConfig::default_fp_mul_div_units")]
    pub fp_mul_div_units: usize,
}

impl StationConfig {
    fn default_fp_add_sub_rs() -> usize {
        defaults::FP_ADD_SUB_RS
    }

    fn default_fp_mul_div_rs() -> usize {
        defaults::FP_MUL_DIV_RS
    }

    fn default_int_rs() -> usize {
        defaults::INT_RS
    }

    fn default_load_buffers() -> usize {
        defaults::LOAD_BUFFERS
    }

    fn default_store_buffers() -> usize {
        defaults::STORE_BUFFERS
    }

    fn default_branch_handlers() -> usize {
        defaults::BRANCH_HANDLERS
    }

    fn default_address_units() -> usize {
        defaults::ADDRESS_UNITS
    }

    fn default_int_alus() -> usize {
        defaults::INT_ALUS
    }

    fn default_fp_add_sub_units() -> usize {
        defaults::FP_ADD_SUB_UNITS
    }

    fn default_fp_mul_div_units() -> usize {
        defaults::FP_MUL_DIV_UNITS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let pools: [(&'static str, usize); 10] = [
            ("fp_add_sub_rs", self.fp_add_sub_rs),
            ("fp_mul_div_rs", self.fp_mul_div_rs),
            ("int_rs", self.int_rs),
            ("load_buffers", self.load_buffers),
            ("store_buffers", self.store_buffers),
            ("branch_handlers", self.branch_handlers),
            ("address_units", self.address_units),
            ("int_alus", self.int_alus),
            ("fp_add_sub_units", self.fp_add_sub_units),
            ("fp_mul_div_units", self.fp_mul_div_units),
        ];
        for (name, size) in pools {
            if size == 0 {
                return Err(ConfigError::ZeroPoolSize(name));
            }
        }
        Ok(())
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            fp_add_sub_rs: defaults::FP_ADD_SUB_RS,
            fp_mul_div_rs: defaults::FP_MUL_DIV_RS,
            int_rs: defaults::INT_RS,
            load_buffers: defaults::LOAD_BUFFERS,
            store_buffers: defaults::STORE_BUFFERS,
            branch_handlers: defaults::BRANCH_HANDLERS,
            address_units: defaults::ADDRESS_UNITS,
            int_alus: defaults::INT_ALUS,
            fp_add_sub_units: defaults::FP_ADD_SUB_UNITS,
            fp_mul_div_units: defaults::FP_MUL_DIV_UNITS,
        }
    }
}

/// Per-operation latencies, in cycles.
#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    /// Integer ALU operations.
    #[serde(default = "LatencyConfig::default_int_alu")]
    pub int_alu: u64,

    /// FP add/subtract.
    #[serde(default = "LatencyConfig::default_fp_add_sub")]
    pub fp_add_sub: u64,

    /// FP multiply.
    #[serde(default = "LatencyConfig::default_fp_mul")]
    pub fp_mul: u64,

    /// FP divide.
    #[serde(default = "LatencyConfig::default_fp_div")]
    pub fp_div: u64,

    /// Effective-address computation.
    #[serde(default = "LatencyConfig::default_address")]
    pub address: u64,

    /// Branch evaluation.
    #[serde(default = "LatencyConfig::default_branch")]
    pub branch: u64,
}

impl LatencyConfig {
    fn default_int_alu() -> u64 {
        defaults::INT_ALU_LATENCY
    }

    fn default_fp_add_sub() -> u64 {
        defaults::FP_ADD_SUB_LATENCY
    }

    fn default_fp_mul() -> u64 {
        defaults::FP_MUL_LATENCY
    }

    fn default_fp_div() -> u64 {
        defaults::FP_DIV_LATENCY
    }

    fn default_address() -> u64 {
        defaults::ADDRESS_LATENCY
    }

    fn default_branch() -> u64 {
        defaults::BRANCH_LATENCY
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let latencies: [(&'static str, u64); 6] = [
            ("int_alu", self.int_alu),
            ("fp_add_sub", self.fp_add_sub),
            ("fp_mul", self.fp_mul),
            ("fp_div", self.fp_div),
            ("address", self.address),
            ("branch", self.branch),
        ];
        for (name, cycles) in latencies {
            if cycles == 0 {
                return Err(ConfigError::ZeroLatency(name));
            }
        }
        Ok(())
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            int_alu: defaults::INT_ALU_LATENCY,
            fp_add_sub: defaults::FP_ADD_SUB_LATENCY,
            fp_mul: defaults::FP_MUL_LATENCY,
            fp_div: defaults::FP_DIV_LATENCY,
            address: defaults::ADDRESS_LATENCY,
            branch: defaults::BRANCH_LATENCY,
        }
    }
}

/// Data cache geometry and timing.
///
/// The cache is direct-mapped, write-back, write-allocate; geometry fields
/// must be powers of two with `block_bytes <= size_bytes`.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes.
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Block (line) size in bytes.
    #[serde(default = "CacheConfig::default_block")]
    pub block_bytes: usize,

    /// Access latency on a hit, in cycles.
    #[serde(default = "CacheConfig::default_hit_latency")]
    pub hit_latency: u64,

    /// Additional cycles on a miss.
    #[serde(default = "CacheConfig::default_miss_penalty")]
    pub miss_penalty: u64,
}

impl CacheConfig {
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_block() -> usize {
        defaults::CACHE_BLOCK
    }

    fn default_hit_latency() -> u64 {
        defaults::CACHE_HIT_LATENCY
    }

    fn default_miss_penalty() -> u64 {
        defaults::CACHE_MISS_PENALTY
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.size_bytes.is_power_of_two() {
            return Err(ConfigError::CacheSizeNotPowerOfTwo(self.size_bytes));
        }
        if !self.block_bytes.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(self.block_bytes));
        }
        if self.block_bytes > self.size_bytes {
            return Err(ConfigError::BlockLargerThanCache {
                block: self.block_bytes,
                cache: self.size_bytes,
            });
        }
        if self.hit_latency == 0 {
            return Err(ConfigError::ZeroLatency("cache_hit"));
        }
        if self.miss_penalty == 0 {
            return Err(ConfigError::ZeroLatency("cache_miss_penalty"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            block_bytes: defaults::CACHE_BLOCK,
            hit_latency: defaults::CACHE_HIT_LATENCY,
            miss_penalty: defaults::CACHE_MISS_PENALTY,
        }
    }
}

/// Backing memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Memory size in bytes. Accesses beyond this are recoverable anomalies:
    /// reads return zero, writes are dropped, and the cycle log records it.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: usize,
}

impl MemoryConfig {
    fn default_size() -> usize {
        defaults::MEMORY_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::MEMORY_SIZE,
        }
    }
}
