//! Memory subsystem: backing memory and the data cache.
//!
//! The hierarchy is deliberately small: a byte-addressable [`MainMemory`]
//! and a single direct-mapped, write-back, write-allocate [`DataCache`] in
//! front of it. Only data accesses go through the cache; instruction supply
//! is not modeled.

/// Direct-mapped write-back data cache.
pub mod cache;
/// Byte-addressable backing memory.
pub mod memory;

pub use cache::DataCache;
pub use memory::MainMemory;
