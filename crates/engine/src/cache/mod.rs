//! Set-associative LRU tag store.
//!
//! This module implements the per-processor private cache as a tag store:
//! each line holds a tag, a coherence state, and an LRU rank, but no data.
//! Lookup, victim identification, and LRU maintenance live here; all state
//! transitions and writeback accounting are driven by the coherence engine,
//! because only the engine knows what a transition implies on the bus.

/// Per-cache operational counters and report formatting.
pub mod stats;

pub use stats::CacheStats;

use crate::common::Address;
use crate::config::{Protocol, SimConfig};

/// Coherence state of one cache line.
///
/// The full universe across all protocols; each protocol uses a subset:
/// MSI `{Invalid, Shared, Modified}`, MESI adds `Exclusive`, Dragon uses
/// `{Exclusive, SharedClean, SharedModified, Modified}` with `Invalid` only
/// marking an empty slot before the first fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineState {
    /// Empty slot, or invalidated by a peer's bus transaction.
    #[default]
    Invalid,
    /// Clean, possibly replicated in other caches.
    Shared,
    /// Clean and guaranteed to be the only cached copy.
    Exclusive,
    /// Dirty and guaranteed to be the only cached copy.
    Modified,
    /// Dragon: replicated, memory is up to date.
    SharedClean,
    /// Dragon: replicated and dirty; this cache owes the writeback.
    SharedModified,
}

impl LineState {
    /// Whether evicting a line in this state forces a writeback under the
    /// given protocol.
    pub fn is_dirty(self, protocol: Protocol) -> bool {
        match protocol {
            Protocol::Msi | Protocol::Mesi => self == LineState::Modified,
            Protocol::Dragon => {
                matches!(self, LineState::Modified | LineState::SharedModified)
            }
        }
    }
}

/// One cache line: tag, coherence state, LRU rank. No data is stored.
#[derive(Clone, Default)]
pub struct CacheLine {
    /// Block address shifted right by the block-offset bits. The index bits
    /// are kept in the tag; comparisons happen within a single set, so every
    /// candidate shares them and disambiguation still holds.
    pub tag: u64,
    /// Current coherence state; `Invalid` means the slot is empty.
    pub state: LineState,
    /// LRU rank; within a set, the lowest rank among valid lines is the
    /// replacement victim. Only the relative order matters.
    pub lru_rank: u64,
}

impl CacheLine {
    /// Whether the line holds a live block.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.state != LineState::Invalid
    }

    /// Resets the line to an empty slot.
    pub fn invalidate(&mut self) {
        self.tag = 0;
        self.state = LineState::Invalid;
    }
}

/// Set-associative tag store with LRU replacement.
///
/// Lines are stored in one flat vector; slot `set * ways + way` holds way
/// `way` of set `set`. A monotonic tick supplies fresh LRU ranks.
pub struct Cache {
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    block_bits: u32,
    tick: u64,
    stats: CacheStats,
}

impl Cache {
    /// Creates an empty cache for the given (validated) configuration.
    pub fn new(config: &SimConfig) -> Self {
        let num_sets = config.num_sets() as usize;
        let ways = config.ways as usize;
        Self {
            lines: vec![CacheLine::default(); num_sets * ways],
            num_sets,
            ways,
            block_bits: config.block_bits(),
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    /// Tag for an address: the block address, index bits included.
    #[inline]
    pub fn tag_of(&self, addr: Address) -> u64 {
        addr.val() >> self.block_bits
    }

    /// Set index for an address.
    #[inline]
    pub fn set_of(&self, addr: Address) -> usize {
        ((addr.val() >> self.block_bits) % self.num_sets as u64) as usize
    }

    /// Finds a valid line holding `addr`. Returns its slot, or `None` on miss.
    ///
    /// Lookup never mutates; LRU maintenance is a separate, explicit step
    /// ([`Cache::touch`]) so that snooping peers do not disturb recency.
    pub fn find_line(&self, addr: Address) -> Option<usize> {
        let tag = self.tag_of(addr);
        let base = self.set_of(addr) * self.ways;
        (base..base + self.ways).find(|&slot| {
            let line = &self.lines[slot];
            line.is_valid() && line.tag == tag
        })
    }

    /// Identifies the slot that a fill of `addr` will reuse.
    ///
    /// Prefers the first invalid slot in the set; otherwise the valid line
    /// with the smallest LRU rank. Identification only: the caller decides
    /// whether the victim's state implies a writeback, then overwrites it.
    pub fn find_victim(&self, addr: Address) -> usize {
        let base = self.set_of(addr) * self.ways;
        let mut victim = base;
        let mut min_rank = u64::MAX;
        for slot in base..base + self.ways {
            let line = &self.lines[slot];
            if !line.is_valid() {
                return slot;
            }
            if line.lru_rank < min_rank {
                min_rank = line.lru_rank;
                victim = slot;
            }
        }
        victim
    }

    /// Convenience lookup of the coherence state for `addr`.
    pub fn state_of(&self, addr: Address) -> Option<LineState> {
        self.find_line(addr).map(|slot| self.lines[slot].state)
    }

    /// Marks a line most recently used. Call after every hit and every fill.
    pub fn touch(&mut self, slot: usize) {
        self.lines[slot].lru_rank = self.tick;
        self.tick += 1;
    }

    /// Advances the per-cache request counter.
    pub fn bump_tick(&mut self) {
        self.tick += 1;
    }

    /// Read access to a line by slot.
    #[inline]
    pub fn line(&self, slot: usize) -> &CacheLine {
        &self.lines[slot]
    }

    /// Mutable access to a line by slot.
    #[inline]
    pub fn line_mut(&mut self, slot: usize) -> &mut CacheLine {
        &mut self.lines[slot]
    }

    /// The lines of one set, way-ordered.
    pub fn set_lines(&self, set: usize) -> &[CacheLine] {
        let base = set * self.ways;
        &self.lines[base..base + self.ways]
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Associativity.
    pub fn ways(&self) -> usize {
        self.ways
    }

    /// Operational counters, read-only.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Operational counters, for the engine to account events against.
    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }
}
