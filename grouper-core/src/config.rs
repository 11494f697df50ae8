//! Auto-configuration: memory-tier selection.
//!
//! Runs once, before any point is loaded, and the result is treated as
//! process-global for the rest of the run — every later stage takes a
//! `RunConfig` by value or shared reference instead of re-deriving it.

use crate::cell::CellEntry;
use crate::point::{Point, WidePoint};

const HIGH_MEM_THRESHOLD: u64 = 64 * 1024 * 1024 * 1024;
const MED_MEM_THRESHOLD: u64 = 32 * 1024 * 1024 * 1024;

/// Average bytes per input line, used to turn a file size into an
/// estimated point count before a single line has been parsed.
pub const AVG_BYTES_PER_LINE: u64 = 35;

const MAX_HASH_BITS_HIGH: u32 = 27;
const MAX_HASH_BITS_BALANCED: u32 = 26;
const MAX_HASH_BITS_LOW: u32 = 24;
const MIN_HASH_BITS: u32 = 20;

const NEIGHBOR_BUF_HIGH: usize = 262_144;
const NEIGHBOR_BUF_BALANCED: usize = 131_072;
const NEIGHBOR_BUF_LOW: usize = 65_536;

const MAX_THREADS: usize = 256;

/// Memory-configuration class chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    High,
    Balanced,
    Low,
}

impl Tier {
    pub fn name(self) -> &'static str {
        match self {
            Tier::High => "HIGH",
            Tier::Balanced => "BALANCED",
            Tier::Low => "LOW",
        }
    }

    /// Size in bytes of one point record under this tier's layout.
    pub fn record_bytes(self) -> usize {
        match self {
            Tier::High | Tier::Balanced => std::mem::size_of::<WidePoint>(),
            Tier::Low => std::mem::size_of::<Point>(),
        }
    }

    /// Per-worker neighbor-gather buffer size.
    pub fn neighbor_buffer_size(self) -> usize {
        match self {
            Tier::High => NEIGHBOR_BUF_HIGH,
            Tier::Balanced => NEIGHBOR_BUF_BALANCED,
            Tier::Low => NEIGHBOR_BUF_LOW,
        }
    }

    /// Ceiling on hash-table bits for this tier.
    fn max_hash_bits(self) -> u32 {
        match self {
            Tier::High => MAX_HASH_BITS_HIGH,
            Tier::Balanced => MAX_HASH_BITS_BALANCED,
            Tier::Low => MAX_HASH_BITS_LOW,
        }
    }
}

/// Everything later stages need, derived once at startup.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub tier: Tier,
    pub cell_multiplier: u32,
    pub threads: usize,
    pub system_memory_bytes: u64,
    pub available_budget_bytes: u64,
}

impl RunConfig {
    /// Selects the highest tier whose projected footprint fits in 80%
    /// of physical RAM; falls back to LOW with a doubled cell
    /// multiplier (up to 16) until the projection fits, or gives up
    /// and proceeds anyway once the multiplier caps out.
    ///
    /// `system_memory_bytes` and `threads` are supplied by the caller
    /// (sourced from `sysinfo`/`std::thread::available_parallelism` in
    /// the CLI) so this function stays host-independent and testable.
    pub fn detect(estimated_points: u64, system_memory_bytes: u64, detected_threads: usize) -> Self {
        let available = (system_memory_bytes as u128 * 80 / 100) as u64;

        let wide = std::mem::size_of::<WidePoint>() as u64;
        let narrow = std::mem::size_of::<Point>() as u64;
        let cell = std::mem::size_of::<CellEntry>() as u64;
        let hash_slot = std::mem::size_of::<u32>() as u64;

        let high_perf_mem = estimated_points * wide
            + estimated_points * cell
            + (1u64 << MAX_HASH_BITS_HIGH) * hash_slot;

        let balanced_mem = estimated_points * wide
            + (estimated_points / 4) * cell
            + (1u64 << MAX_HASH_BITS_BALANCED) * hash_slot;

        let mut multiplier: u32;
        let tier;

        if system_memory_bytes >= HIGH_MEM_THRESHOLD && available >= high_perf_mem {
            tier = Tier::High;
            multiplier = 1;
        } else if system_memory_bytes >= MED_MEM_THRESHOLD && available >= balanced_mem {
            tier = Tier::Balanced;
            multiplier = 2;
        } else {
            tier = Tier::Low;
            multiplier = 4;
        }

        if tier == Tier::Low {
            let mut low_mem_need = |m: u32| {
                let divisor = (m as u64 * m as u64).max(1);
                estimated_points * narrow + (estimated_points / divisor) * cell + (1u64 << MIN_HASH_BITS) * hash_slot
            };

            while low_mem_need(multiplier) > available && multiplier < 16 {
                multiplier *= 2;
            }
        }

        let threads = detected_threads.clamp(1, MAX_THREADS);

        RunConfig {
            tier,
            cell_multiplier: multiplier,
            threads,
            system_memory_bytes,
            available_budget_bytes: available,
        }
    }

    /// Smallest power of two `>= 2*num_cells`, clamped to this tier's
    /// cap and floored at `2^20`.
    pub fn hash_table_size(&self, num_cells: u64) -> u64 {
        let cap = 1u64 << self.tier.max_hash_bits();
        let floor = 1u64 << MIN_HASH_BITS;

        let mut size = floor;
        while size < num_cells.saturating_mul(2) && size < cap {
            size *= 2;
        }
        size
    }
}
