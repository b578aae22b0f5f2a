//! Dragon protocol handler.
//!
//! Four-state update protocol: Exclusive, SharedClean, SharedModified,
//! Modified. Writes to shared lines broadcast a BusUpd instead of
//! invalidating peers, so lines are never invalidated after their first
//! fill; Invalid only marks a slot that has never been filled. A write miss
//! is a BusRd fetch followed by an update broadcast, reported as both a
//! BusRd and a BusUpd.

use log::debug;

use super::{BusCommand, BusRecord, Engine};
use crate::cache::LineState;
use crate::common::{Address, MemOp};
use crate::config::Protocol;

impl Engine {
    pub(super) fn process_dragon(&mut self, proc: usize, op: MemOp, addr: Address) {
        let cache = &mut self.caches[proc];
        cache.bump_tick();
        match op {
            MemOp::Read => cache.stats_mut().reads += 1,
            MemOp::Write => cache.stats_mut().writes += 1,
        }

        let mut bus: Option<BusRecord> = None;
        let (slot, hit) = match cache.find_line(addr) {
            Some(slot) => {
                // Writing a shared line broadcasts the new value to peers.
                if op == MemOp::Write
                    && matches!(
                        cache.line(slot).state,
                        LineState::SharedClean | LineState::SharedModified
                    )
                {
                    bus = Some(BusRecord::issue(proc, addr, BusCommand::BusUpd));
                    cache.stats_mut().bus_upgr_or_upd += 1;
                }
                (slot, true)
            }
            None => {
                let victim = cache.find_victim(addr);
                if cache.line(victim).state.is_dirty(Protocol::Dragon) {
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
                        // Fetch plus update broadcast; both bus counters move.
                        cache.stats_mut().write_misses += 1;
                        bus = Some(BusRecord::issue(proc, addr, BusCommand::BusUpd));
                        cache.stats_mut().bus_rd += 1;
                        cache.stats_mut().bus_upgr_or_upd += 1;
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
                                stats.interventions += 1;
                                stats.mem_transactions += 1;
                                self.caches[peer].line_mut(pslot).state =
                                    LineState::SharedModified;
                                bus.owner = peer;
                                bus.command = BusCommand::Flush;
                                debug!("p{} flushes {:#x}", peer, addr);
                            }
                            LineState::Exclusive => {
                                self.caches[peer].stats_mut().interventions += 1;
                                self.caches[peer].line_mut(pslot).state = LineState::SharedClean;
                                bus.owner = peer;
                            }
                            LineState::SharedModified => {
                                let stats = self.caches[peer].stats_mut();
                                stats.flushes += 1;
                                stats.mem_transactions += 1;
                                bus.owner = peer;
                                bus.command = BusCommand::Flush;
                                debug!("p{} flushes {:#x}", peer, addr);
                            }
                            LineState::SharedClean => {
                                bus.owner = peer;
                            }
                            state => unreachable!("Dragon peer snooped in {:?}", state),
                        }
                    }
                    // Memory sources the block unless a dirty peer flushed it.
                    if bus.owner == proc || bus.command != BusCommand::Flush {
                        self.caches[proc].stats_mut().mem_transactions += 1;
                    }
                }
                BusCommand::BusUpd => {
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
                                stats.interventions += 1;
                                stats.mem_transactions += 1;
                                self.caches[peer].line_mut(pslot).state = LineState::SharedClean;
                                bus.owner = peer;
                                bus.command = BusCommand::Flush;
                                debug!("p{} flushes {:#x}", peer, addr);
                            }
                            LineState::Exclusive => {
                                self.caches[peer].stats_mut().interventions += 1;
                                self.caches[peer].line_mut(pslot).state = LineState::SharedClean;
                                bus.owner = peer;
                            }
                            LineState::SharedModified => {
                                // The owner only flushes when the updater
                                // also needs the block fetched.
                                if !hit {
                                    let stats = self.caches[peer].stats_mut();
                                    stats.flushes += 1;
                                    stats.mem_transactions += 1;
                                }
                                self.caches[peer].line_mut(pslot).state = LineState::SharedClean;
                                bus.owner = peer;
                                bus.command = BusCommand::Flush;
                            }
                            LineState::SharedClean => {
                                bus.owner = peer;
                            }
                            state => unreachable!("Dragon peer snooped in {:?}", state),
                        }
                    }
                    // Update broadcasts on a hit move no block; only a
                    // missing requester can owe memory a fetch.
                    if !hit && (bus.owner == proc || bus.command != BusCommand::Flush) {
                        self.caches[proc].stats_mut().mem_transactions += 1;
                    }
                }
                _ => unreachable!("Dragon issued {:?}", bus.command),
            }
        }

        let cache = &mut self.caches[proc];
        let was_exclusive = hit && cache.line(slot).state == LineState::Exclusive;
        let copies = bus.as_ref().is_some_and(|b| b.copies_exist);
        if !hit {
            let tag = cache.tag_of(addr);
            cache.line_mut(slot).tag = tag;
        }
        cache.touch(slot);
        match op {
            MemOp::Write => {
                // An Exclusive hit upgrades in place; otherwise surviving
                // peer copies force the shared dirty state.
                cache.line_mut(slot).state = if copies && !was_exclusive {
                    LineState::SharedModified
                } else {
                    LineState::Modified
                };
            }
            MemOp::Read if !hit => {
                cache.line_mut(slot).state = if copies {
                    LineState::SharedClean
                } else {
                    LineState::Exclusive
                };
            }
            MemOp::Read => {}
        }
    }
}
