//! Per-cache statistics collection and reporting.
//!
//! This module tracks the operational metrics of one private cache. It
//! provides:
//! 1. **Access Counts:** Reads, writes, and the misses among them.
//! 2. **Traffic Counts:** Writebacks, memory transactions, and cache-to-cache
//!    transfers.
//! 3. **Coherence Counts:** Interventions, invalidations, flushes, and the
//!    bus-command breakdown (BusRd, BusRdX, BusUpgr/BusUpd).
//! 4. **Reporting:** The numbered twelve-line result block per cache.

use std::io::{self, Write};

/// Operational counters for one cache.
///
/// All counters start at zero and are monotonically non-decreasing; the
/// coherence engine increments them as it accounts each request and snoop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Read requests issued by the local processor.
    pub reads: u64,
    /// Read requests that missed.
    pub read_misses: u64,
    /// Write requests issued by the local processor.
    pub writes: u64,
    /// Write requests that missed.
    pub write_misses: u64,
    /// Dirty lines written back to memory (evictions and flushes).
    pub writebacks: u64,
    /// Blocks supplied to this cache by a peer instead of memory.
    pub cache_to_cache: u64,
    /// Transactions (reads or writes) with main memory.
    pub mem_transactions: u64,
    /// Times this cache supplied or downgraded a line for a peer's request.
    pub interventions: u64,
    /// Times a peer's bus transaction invalidated a line in this cache.
    pub invalidations: u64,
    /// Flush commands this cache placed on the bus.
    pub flushes: u64,
    /// BusRd commands this cache placed on the bus.
    pub bus_rd: u64,
    /// BusRdX commands this cache placed on the bus.
    pub bus_rdx: u64,
    /// BusUpgr or BusUpd commands this cache placed on the bus.
    pub bus_upgr_or_upd: u64,
}

impl CacheStats {
    /// Total miss rate in percent over all accesses.
    ///
    /// Returns 0.0 when the cache saw no accesses, so reporting an idle
    /// cache never divides by zero.
    pub fn miss_rate(&self) -> f64 {
        let accesses = self.reads + self.writes;
        if accesses == 0 {
            return 0.0;
        }
        (self.read_misses + self.write_misses) as f64 * 100.0 / accesses as f64
    }

    /// Writes the result block for cache `id`: a title line followed by the
    /// twelve numbered metrics.
    pub fn write_report<W: Write>(&self, w: &mut W, id: usize) -> io::Result<()> {
        writeln!(
            w,
            "============ Simulation results (Cache {}) ============",
            id
        )?;
        writeln!(w, "01. number of reads:    \t\t\t{}", self.reads)?;
        writeln!(w, "02. number of read misses:      \t\t{}", self.read_misses)?;
        writeln!(w, "03. number of writes:   \t\t\t{}", self.writes)?;
        writeln!(w, "04. number of write misses:     \t\t{}", self.write_misses)?;
        writeln!(w, "05. total miss rate:    \t\t\t{:.2}%", self.miss_rate())?;
        writeln!(w, "06. number of writebacks:\t\t\t{}", self.writebacks)?;
        writeln!(
            w,
            "07. number of cache-to-cache transfers: \t{}",
            self.cache_to_cache
        )?;
        writeln!(
            w,
            "08. number of memory transactions:      \t{}",
            self.mem_transactions
        )?;
        writeln!(
            w,
            "09. number of interventions:    \t\t{}",
            self.interventions
        )?;
        writeln!(
            w,
            "10. number of invalidations:    \t\t{}",
            self.invalidations
        )?;
        writeln!(w, "11. number of flushes:  \t\t\t{}", self.flushes)?;
        writeln!(w, "12. number of BusRdX:   \t\t\t{}", self.bus_rdx)?;
        Ok(())
    }
}
