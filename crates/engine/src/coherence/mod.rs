//! Bus-based coherence engine.
//!
//! This module orchestrates the shared bus between the per-processor caches.
//! It provides:
//! 1. **Bus Vocabulary:** The command set placed on the bus and the
//!    per-request bus record.
//! 2. **Engine:** Ownership of every cache and dispatch of each request to
//!    the active protocol's handler.
//!
//! Every handler follows the same four-phase skeleton: account and look up
//! the request in the requester's cache, determine the bus command, snoop
//! all peers in ascending processor order, then resolve the requester's
//! final line state. The bus record lives on the stack for exactly one
//! request, so nothing leaks between requests.

mod dragon;
mod mesi;
mod msi;

use crate::cache::Cache;
use crate::common::{Address, MemOp};
use crate::config::{Protocol, SimConfig};

/// Command placed on the shared bus during one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusCommand {
    /// Read-for-share: fetch a block without ownership.
    BusRd,
    /// Read-for-ownership: fetch a block and invalidate all other copies.
    BusRdX,
    /// Upgrade-to-modified without a data transfer (MESI).
    BusUpgr,
    /// Update broadcast to all sharers (Dragon).
    BusUpd,
    /// A dirty peer is writing the block back to memory while supplying it.
    Flush,
    /// A clean peer supplies the block; no memory writeback needed.
    FlushOpt,
}

/// Ephemeral record of the bus during one request.
///
/// Initialized when the requester issues a command; peers that respond take
/// over ownership and may replace the command with a supply (`Flush` or
/// `FlushOpt`). When several peers respond, the last one iterated owns the
/// bus at handler exit; peer iteration is ascending by processor id, so the
/// outcome is deterministic.
pub(crate) struct BusRecord {
    /// Processor currently driving the bus response.
    pub owner: usize,
    /// Block address of the request.
    pub addr: Address,
    /// Command currently on the bus.
    pub command: BusCommand,
    /// Wired-OR signal: at least one peer holds a valid copy.
    pub copies_exist: bool,
}

impl BusRecord {
    /// Opens the bus for a request by `proc` with the given command.
    pub fn issue(proc: usize, addr: Address, command: BusCommand) -> Self {
        Self {
            owner: proc,
            addr,
            command,
            copies_exist: false,
        }
    }

    /// Whether the final response was a peer supply.
    pub fn supplied_by_peer(&self) -> bool {
        matches!(self.command, BusCommand::Flush | BusCommand::FlushOpt)
    }
}

/// Coherence engine: every private cache plus the protocol they share.
///
/// The engine owns the caches for the lifetime of a run; requests are
/// processed strictly one at a time in trace order.
pub struct Engine {
    protocol: Protocol,
    caches: Vec<Cache>,
}

impl Engine {
    /// Creates an engine with one empty cache per processor.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            protocol: config.protocol,
            caches: (0..config.num_processors)
                .map(|_| Cache::new(config))
                .collect(),
        }
    }

    /// Processes one trace record against the requesting processor's cache.
    ///
    /// After return, the requester holds a valid line for `addr` in a state
    /// permitted by the protocol, every peer has reacted per the snoop
    /// rules, and all counters are up to date.
    ///
    /// # Panics
    ///
    /// Panics if `proc` is outside the configured processor range; a trace
    /// addressing a nonexistent processor is an invariant violation.
    pub fn process_request(&mut self, proc: usize, op: MemOp, addr: Address) {
        assert!(
            proc < self.caches.len(),
            "processor id {} out of range (have {})",
            proc,
            self.caches.len()
        );
        match self.protocol {
            Protocol::Msi => self.process_msi(proc, op, addr),
            Protocol::Mesi => self.process_mesi(proc, op, addr),
            Protocol::Dragon => self.process_dragon(proc, op, addr),
        }
    }

    /// The active protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Number of processors on the bus.
    pub fn num_processors(&self) -> usize {
        self.caches.len()
    }

    /// Read access to a processor's cache.
    pub fn cache(&self, proc: usize) -> &Cache {
        &self.caches[proc]
    }
}
