//! Direct-mapped write-back data cache.
//!
//! This module implements the single data cache in front of main memory.
//! It provides:
//! 1. **Timing:** Non-mutating hit probes and the hit/miss latency the
//!    load/store buffers charge for an access.
//! 2. **Data:** Block-granular storage with write-back of dirty victims and
//!    write-allocate on store misses.
//! 3. **Observability:** Per-line summaries for cycle snapshots.
//!
//! Address decomposition for a block size `B` and `N` blocks:
//! `offset = addr & (B-1)`, `index = (addr / B) % N`, `tag = addr / (B * N)`.

use crate::config::CacheConfig;
use crate::mem::MainMemory;

/// One cache line: tag, state bits, and a block of data bytes.
#[derive(Clone, Debug)]
struct CacheLine {
    valid: bool,
    dirty: bool,
    tag: u64,
    data: Vec<u8>,
}

/// Summary of one cache line, published in cycle snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CacheLineSummary {
    /// Line index within the cache.
    pub index: usize,
    /// True when the line holds a block.
    pub valid: bool,
    /// True when the line differs from main memory.
    pub dirty: bool,
    /// Address tag of the resident block.
    pub tag: u64,
}

/// Direct-mapped, write-back, write-allocate data cache.
#[derive(Clone, Debug)]
pub struct DataCache {
    lines: Vec<CacheLine>,
    block_bytes: usize,
    num_blocks: usize,
    hit_latency: u64,
    miss_penalty: u64,
}

impl DataCache {
    /// Creates an empty (all-invalid) cache with the configured geometry.
    ///
    /// Geometry is validated by [`CoreConfig::validate`](crate::config::CoreConfig::validate)
    /// before construction.
    pub fn new(config: &CacheConfig) -> Self {
        let num_blocks = config.size_bytes / config.block_bytes;
        let lines = (0..num_blocks)
            .map(|_| CacheLine {
                valid: false,
                dirty: false,
                tag: 0,
                data: vec![0; config.block_bytes],
            })
            .collect();
        Self {
            lines,
            block_bytes: config.block_bytes,
            num_blocks,
            hit_latency: config.hit_latency,
            miss_penalty: config.miss_penalty,
        }
    }

    /// Block size in bytes.
    pub fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    fn index_of(&self, addr: u64) -> usize {
        ((addr as usize) / self.block_bytes) % self.num_blocks
    }

    fn tag_of(&self, addr: u64) -> u64 {
        addr / (self.block_bytes * self.num_blocks) as u64
    }

    /// Base address of the block resident in `line`.
    fn line_base(&self, index: usize, tag: u64) -> u64 {
        (tag * self.num_blocks as u64 + index as u64) * self.block_bytes as u64
    }

    /// True when the byte at `addr` is resident. Never mutates state, so
    /// the buffers can use it to decide an access latency ahead of the
    /// access itself.
    pub fn probe(&self, addr: u64) -> bool {
        let line = &self.lines[self.index_of(addr)];
        line.valid && line.tag == self.tag_of(addr)
    }

    /// Latency charged for an access starting at `addr`.
    pub fn access_latency(&self, addr: u64) -> u64 {
        if self.probe(addr) {
            self.hit_latency
        } else {
            self.hit_latency + self.miss_penalty
        }
    }

    /// Makes the block containing `addr` resident, writing back a dirty
    /// victim first.
    fn ensure_line(&mut self, addr: u64, mem: &mut MainMemory) {
        let index = self.index_of(addr);
        let tag = self.tag_of(addr);
        if self.lines[index].valid && self.lines[index].tag == tag {
            return;
        }

        let victim_base = self.line_base(index, self.lines[index].tag);
        let block_base = addr & !(self.block_bytes as u64 - 1);
        let line = &mut self.lines[index];
        if line.valid && line.dirty {
            mem.write_block(victim_base, &line.data);
        }
        mem.read_block(block_base, &mut line.data);
        line.valid = true;
        line.dirty = false;
        line.tag = tag;
    }

    /// Reads `out.len()` bytes starting at `addr`, fetching blocks as
    /// needed (a read spanning two blocks touches both).
    pub fn read_bytes(&mut self, addr: u64, out: &mut [u8], mem: &mut MainMemory) {
        for (i, slot) in out.iter_mut().enumerate() {
            let byte_addr = addr + i as u64;
            self.ensure_line(byte_addr, mem);
            let index = self.index_of(byte_addr);
            let offset = (byte_addr as usize) & (self.block_bytes - 1);
            *slot = self.lines[index].data[offset];
        }
    }

    /// Writes `data` starting at `addr`, allocating blocks as needed and
    /// marking each touched line dirty.
    pub fn write_bytes(&mut self, addr: u64, data: &[u8], mem: &mut MainMemory) {
        for (i, byte) in data.iter().enumerate() {
            let byte_addr = addr + i as u64;
            self.ensure_line(byte_addr, mem);
            let index = self.index_of(byte_addr);
            let offset = (byte_addr as usize) & (self.block_bytes - 1);
            self.lines[index].data[offset] = *byte;
            self.lines[index].dirty = true;
        }
    }

    /// Reads a little-endian double through the cache.
    pub fn load_double(&mut self, addr: u64, mem: &mut MainMemory) -> f64 {
        let mut buf = [0u8; 8];
        self.read_bytes(addr, &mut buf, mem);
        f64::from_le_bytes(buf)
    }

    /// Writes a little-endian double through the cache.
    pub fn store_double(&mut self, addr: u64, value: f64, mem: &mut MainMemory) {
        self.write_bytes(addr, &value.to_le_bytes(), mem);
    }

    /// Reads a little-endian 32-bit word through the cache.
    pub fn load_word(&mut self, addr: u64, mem: &mut MainMemory) -> u32 {
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf, mem);
        u32::from_le_bytes(buf)
    }

    /// Writes a little-endian 32-bit word through the cache.
    pub fn store_word(&mut self, addr: u64, value: u32, mem: &mut MainMemory) {
        self.write_bytes(addr, &value.to_le_bytes(), mem);
    }

    /// Pre-fetches the block containing `addr` so that later reads or
    /// writes of it are hits. Used when an access *starts*, so that probes
    /// by younger operations observe the line this access will bring in.
    pub fn fetch_for_access(&mut self, addr: u64, mem: &mut MainMemory) {
        self.ensure_line(addr, mem);
    }

    /// Reads `out.len()` bytes as an observer: cached bytes where resident,
    /// backing memory otherwise. Never mutates cache state.
    pub fn peek_bytes(&self, addr: u64, out: &mut [u8], mem: &MainMemory) {
        for (i, slot) in out.iter_mut().enumerate() {
            let byte_addr = addr + i as u64;
            if self.probe(byte_addr) {
                let index = self.index_of(byte_addr);
                let offset = (byte_addr as usize) & (self.block_bytes - 1);
                *slot = self.lines[index].data[offset];
            } else {
                *slot = mem.read_byte(byte_addr);
            }
        }
    }

    /// Writes every dirty line back to memory, leaving lines valid and clean.
    pub fn flush_dirty(&mut self, mem: &mut MainMemory) {
        for index in 0..self.lines.len() {
            if self.lines[index].valid && self.lines[index].dirty {
                let base = self.line_base(index, self.lines[index].tag);
                mem.write_block(base, &self.lines[index].data);
                self.lines[index].dirty = false;
            }
        }
    }

    /// Per-line summaries for cycle snapshots.
    pub fn line_summaries(&self) -> Vec<CacheLineSummary> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| CacheLineSummary {
                index,
                valid: line.valid,
                dirty: line.dirty,
                tag: line.tag,
            })
            .collect()
    }

    /// Total data bytes held by the cache (an invariant check: always the
    /// configured cache size).
    pub fn total_bytes(&self) -> usize {
        self.lines.iter().map(|l| l.data.len()).sum()
    }
}
