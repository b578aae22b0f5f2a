//! MESI (Illinois) protocol handler.
//!
//! Adds the Exclusive state: a read miss with no other cached copy lands in
//! Exclusive and later writes to it stay off the bus. Peers supply blocks
//! cache-to-cache (FlushOpt when clean, Flush when dirty); memory is charged
//! only when no peer responds. A write hit in Shared upgrades via BusUpgr
//! without a data transfer.

use log::debug;

use super::{BusCommand, BusRecord, Engine};
use crate::cache::LineState;
use crate::common::{Address, MemOp};
use crate::config::Protocol;

impl Engine {
    pub(super) fn process_mesi(&mut self, proc: usize, op: MemOp, addr: Address) {
        let cache = &mut self.caches[proc];
        cache.bump_tick();
        match op {
            MemOp::Read => cache.stats_mut().reads += 1,
            MemOp::Write => cache.stats_mut().writes += 1,
        }

        let mut bus: Option<BusRecord> = None;
        let (slot, hit) = match cache.find_line(addr) {
            Some(slot) => {
                if op == MemOp::Write && cache.line(slot).state == LineState::Shared {
                    bus = Some(BusRecord::issue(proc, addr, BusCommand::BusUpgr));
                    cache.stats_mut().bus_upgr_or_upd += 1;
                }
                (slot, true)
            }
            None => {
                let victim = cache.find_victim(addr);
                if cache.line(victim).state.is_dirty(Protocol::Mesi) {
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

        if let Some(ref mut bus) = bus {
            debug!("p{} {:?} {:#x}: {:?}", proc, op, addr, bus.command);
            match bus.command {
                BusCommand::BusRd => {
                    for peer in 0..self.caches.len() {
                        if peer == proc {
                            continue;
                        }
                        let Some(pslot) = self.caches[peer].find_line(bus.addr) else {
                            continue;
                        };
                        bus.copies_exist = true;
                        match self.caches[peer].line(pslot).state {
                            LineState::Modified => {
                                let stats = self.caches[peer].stats_mut();
                                stats.flushes += 1;
                                stats.mem_transactions += 1;
                                stats.writebacks += 1;
                                stats.interventions += 1;
                                bus.owner = peer;
                                bus.command = BusCommand::Flush;
                                debug!("p{} flushes {:#x}", peer, addr);
                            }
                            LineState::Exclusive => {
                                self.caches[peer].stats_mut().interventions += 1;
                                bus.owner = peer;
                                bus.command = BusCommand::FlushOpt;
                            }
                            _ => {
                                // A Shared peer can supply without memory traffic.
                                bus.owner = peer;
                                bus.command = BusCommand::FlushOpt;
                            }
                        }
                        self.caches[peer].line_mut(pslot).state = LineState::Shared;
                    }
                    if bus.owner == proc {
                        // Nobody answered; memory sources the block.
                        self.caches[proc].stats_mut().mem_transactions += 1;
                        bus.copies_exist = false;
                    }
                }
                BusCommand::BusRdX => {
                    for peer in 0..self.caches.len() {
                        if peer == proc {
                            continue;
                        }
                        let Some(pslot) = self.caches[peer].find_line(bus.addr) else {
                            continue;
                        };
                        self.caches[peer].stats_mut().invalidations += 1;
                        bus.owner = peer;
                        bus.command = BusCommand::FlushOpt;
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
                    if bus.owner == proc {
                        self.caches[proc].stats_mut().mem_transactions += 1;
                    }
                }
                BusCommand::BusUpgr => {
                    // Ownership upgrade: no data moves, sharers just drop out.
                    for peer in 0..self.caches.len() {
                        if peer == proc {
                            continue;
                        }
                        let Some(pslot) = self.caches[peer].find_line(bus.addr) else {
                            continue;
                        };
                        if self.caches[peer].line(pslot).state == LineState::Shared {
                            self.caches[peer].line_mut(pslot).invalidate();
                            self.caches[peer].stats_mut().invalidations += 1;
                        }
                    }
                }
                _ => unreachable!("MESI issued {:?}", bus.command),
            }
        }

        let cache = &mut self.caches[proc];
        if !hit {
            let tag = cache.tag_of(addr);
            cache.line_mut(slot).tag = tag;
        }
        cache.touch(slot);
        match op {
            MemOp::Write => cache.line_mut(slot).state = LineState::Modified,
            MemOp::Read if !hit => {
                let copies = bus.as_ref().is_some_and(|b| b.copies_exist);
                cache.line_mut(slot).state = if copies {
                    LineState::Shared
                } else {
                    LineState::Exclusive
                };
            }
            MemOp::Read => {}
        }

        // A peer supply is one cache-to-cache transfer for the requester.
        if bus.as_ref().is_some_and(BusRecord::supplied_by_peer) {
            cache.stats_mut().cache_to_cache += 1;
        }
    }
}
