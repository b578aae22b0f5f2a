//! MSI protocol handler.
//!
//! Three-state invalidation protocol: Modified, Shared, Invalid. A read miss
//! issues BusRd, any write without ownership issues BusRdX. Memory always
//! sources the block for the requester; a Modified peer additionally flushes
//! on its own account.

use log::debug;

use super::{BusCommand, BusRecord, Engine};
use crate::cache::LineState;
use crate::common::{Address, MemOp};
use crate::config::Protocol;

impl Engine {
    pub(super) fn process_msi(&mut self, proc: usize, op: MemOp, addr: Address) {
        let cache = &mut self.caches[proc];
        cache.bump_tick();
        match op {
            MemOp::Read => cache.stats_mut().reads += 1,
            MemOp::Write => cache.stats_mut().writes += 1,
        }

        // Phase 1/2: lookup, then pick the bus command (if any).
        let mut bus: Option<BusRecord> = None;
        let (slot, hit) = match cache.find_line(addr) {
            Some(slot) => {
                // Only a write to a Shared line needs the bus on a hit.
                if op == MemOp::Write && cache.line(slot).state == LineState::Shared {
                    bus = Some(BusRecord::issue(proc, addr, BusCommand::BusRdX));
                    cache.stats_mut().bus_rdx += 1;
                }
                (slot, true)
            }
            None => {
                let victim = cache.find_victim(addr);
                if cache.line(victim).state.is_dirty(Protocol::Msi) {
                    cache.stats_mut().writebacks += 1;
                    cache.stats_mut().mem_transactions += 1;
                }
                match op {
                    MemOp::Read => {
                        cache.stats_mut().read_misses += 1;
                        bus = Some(BusRecord::issue(proc, addr, BusCommand::BusRd));
                        cache.stats_mut().bus_rd += 1;
                    }
                    MemOp::Write => {
                        cache.stats_mut().write_misses += 1;
                        bus = Some(BusRecord::issue(proc, addr, BusCommand::BusRdX));
                        cache.stats_mut().bus_rdx += 1;
                    }
                }
                (victim, false)
            }
        };

        // Phase 3: snoop peers in ascending processor order.
        if let Some(ref mut bus) = bus {
            debug!("p{} {:?} {:#x}: {:?}", proc, op, addr, bus.command);
            match bus.command {
                BusCommand::BusRd => {
                    // Memory sources the block; a Modified peer flushes too.
                    self.caches[proc].stats_mut().mem_transactions += 1;
                    for peer in 0..self.caches.len() {
                        if peer == proc {
                            continue;
                        }
                        let Some(pslot) = self.caches[peer].find_line(bus.addr) else {
                            continue;
                        };
                        if self.caches[peer].line(pslot).state == LineState::Modified {
                            self.caches[peer].line_mut(pslot).state = LineState::Shared;
                            let stats = self.caches[peer].stats_mut();
                            stats.interventions += 1;
                            stats.flushes += 1;
                            stats.mem_transactions += 1;
                            stats.writebacks += 1;
                            bus.owner = peer;
                            bus.command = BusCommand::Flush;
                            debug!("p{} flushes {:#x}", peer, addr);
                        }
                    }
                }
                BusCommand::BusRdX => {
                    self.caches[proc].stats_mut().mem_transactions += 1;
                    for peer in 0..self.caches.len() {
                        if peer == proc {
                            continue;
                        }
                        let Some(pslot) = self.caches[peer].find_line(bus.addr) else {
                            continue;
                        };
                        self.caches[peer].stats_mut().invalidations += 1;
                        if self.caches[peer].line(pslot).state == LineState::Modified {
                            let stats = self.caches[peer].stats_mut();
                            stats.flushes += 1;
                            stats.mem_transactions += 1;
                            stats.writebacks += 1;
                            bus.owner = peer;
                            bus.command = BusCommand::Flush;
                            debug!("p{} flushes {:#x}", peer, addr);
                        }
                        self.caches[peer].line_mut(pslot).invalidate();
                    }
                }
                _ => unreachable!("MSI issued {:?}", bus.command),
            }
        }

        // Phase 4: resolve the requester.
        let cache = &mut self.caches[proc];
        if !hit {
            let tag = cache.tag_of(addr);
            cache.line_mut(slot).tag = tag;
        }
        cache.touch(slot);
        match op {
            MemOp::Write => cache.line_mut(slot).state = LineState::Modified,
            MemOp::Read if !hit => cache.line_mut(slot).state = LineState::Shared,
            MemOp::Read => {}
        }
    }
}
