//! MESI Protocol Unit Tests.
//!
//! Verifies the Illinois handler: the Exclusive state, cache-to-cache
//! supplies (Flush/FlushOpt), the BusUpgr upgrade path, and the
//! copies-exist resolution of read misses.

use smp_core::cache::LineState;
use smp_core::common::MemOp;
use smp_core::config::Protocol;

use crate::common::{drive, engine_with, state_of};

// ══════════════════════════════════════════════════════════
// 1. Exclusive Fills
// ══════════════════════════════════════════════════════════

/// A read miss with no cached peers lands in Exclusive; re-reading hits
/// silently and stays there.
#[test]
fn lone_read_fills_exclusive() {
    let mut engine = engine_with(Protocol::Mesi, 2);
    drive(
        &mut engine,
        &[(0, MemOp::Read, 0x100), (0, MemOp::Read, 0x100)],
    );

    let c0 = engine.cache(0).stats();
    assert_eq!(c0.reads, 2);
    assert_eq!(c0.read_misses, 1);
    assert_eq!(c0.bus_rd, 1);
    assert_eq!(c0.mem_transactions, 1, "memory answered the lone miss");
    assert_eq!(c0.cache_to_cache, 0);
    assert_eq!(state_of(&engine, 0, 0x100), Some(LineState::Exclusive));
}

/// A silent upgrade: writing an Exclusive line needs no bus transaction.
#[test]
fn exclusive_write_hit_is_silent() {
    let mut engine = engine_with(Protocol::Mesi, 2);
    drive(
        &mut engine,
        &[(0, MemOp::Read, 0x100), (0, MemOp::Write, 0x100)],
    );

    let c0 = engine.cache(0).stats();
    assert_eq!(c0.bus_rdx, 0);
    assert_eq!(c0.bus_upgr_or_upd, 0);
    assert_eq!(c0.mem_transactions, 1, "only the original fill");
    assert_eq!(state_of(&engine, 0, 0x100), Some(LineState::Modified));
}

// ══════════════════════════════════════════════════════════
// 2. Cache-to-Cache Supply
// ══════════════════════════════════════════════════════════

/// An Exclusive peer supplies the block (FlushOpt): the requester is charged
/// one cache-to-cache transfer and no memory transaction; the peer records
/// the intervention.
#[test]
fn exclusive_peer_supplies_flushopt() {
    let mut engine = engine_with(Protocol::Mesi, 2);
    drive(
        &mut engine,
        &[(0, MemOp::Read, 0x100), (1, MemOp::Read, 0x100)],
    );

    let c1 = engine.cache(1).stats();
    assert_eq!(c1.cache_to_cache, 1, "peer supplied the block");
    assert_eq!(c1.mem_transactions, 0, "memory stayed out of it");

    let c0 = engine.cache(0).stats();
    assert_eq!(c0.interventions, 1);
    assert_eq!(c0.writebacks, 0, "Exclusive supply is clean");
    assert_eq!(state_of(&engine, 0, 0x100), Some(LineState::Shared));
    assert_eq!(state_of(&engine, 1, 0x100), Some(LineState::Shared));
}

/// A Modified peer supplies with a Flush: writeback plus memory transaction
/// on the peer, cache-to-cache on the requester.
#[test]
fn modified_peer_supplies_flush() {
    let mut engine = engine_with(Protocol::Mesi, 2);
    drive(
        &mut engine,
        &[(0, MemOp::Write, 0x100), (1, MemOp::Read, 0x100)],
    );

    let c0 = engine.cache(0).stats();
    assert_eq!(c0.flushes, 1);
    assert_eq!(c0.writebacks, 1);
    assert_eq!(c0.interventions, 1);
    assert_eq!(c0.mem_transactions, 2, "own fill plus the flush");
    assert_eq!(state_of(&engine, 0, 0x100), Some(LineState::Shared));

    let c1 = engine.cache(1).stats();
    assert_eq!(c1.cache_to_cache, 1);
    assert_eq!(c1.mem_transactions, 0);
    assert_eq!(state_of(&engine, 1, 0x100), Some(LineState::Shared));
}

/// Several sharers can all respond, but the requester is charged exactly one
/// cache-to-cache transfer.
#[test]
fn many_sharers_one_transfer() {
    let mut engine = engine_with(Protocol::Mesi, 4);
    drive(
        &mut engine,
        &[
            (0, MemOp::Read, 0x100),
            (1, MemOp::Read, 0x100),
            (2, MemOp::Read, 0x100),
            (3, MemOp::Read, 0x100),
        ],
    );

    let c3 = engine.cache(3).stats();
    assert_eq!(c3.cache_to_cache, 1, "one transfer regardless of sharers");
    assert_eq!(c3.mem_transactions, 0);
    assert_eq!(state_of(&engine, 3, 0x100), Some(LineState::Shared));
}

// ══════════════════════════════════════════════════════════
// 3. Write Paths
// ══════════════════════════════════════════════════════════

/// A write hit in Shared upgrades with BusUpgr: sharers are invalidated,
/// nothing is transferred, memory is not involved.
#[test]
fn shared_write_hit_upgrades() {
    let mut engine = engine_with(Protocol::Mesi, 2);
    drive(
        &mut engine,
        &[
            (0, MemOp::Read, 0x100),
            (1, MemOp::Read, 0x100),
            (0, MemOp::Write, 0x100),
        ],
    );

    let c0 = engine.cache(0).stats();
    assert_eq!(c0.bus_upgr_or_upd, 1);
    assert_eq!(c0.bus_rdx, 0);
    assert_eq!(c0.mem_transactions, 1, "the upgrade moved no data");
    assert_eq!(c0.cache_to_cache, 1, "from the earlier FlushOpt fill");
    assert_eq!(state_of(&engine, 0, 0x100), Some(LineState::Modified));

    let c1 = engine.cache(1).stats();
    assert_eq!(c1.invalidations, 1);
    assert_eq!(state_of(&engine, 1, 0x100), None);
}

/// A write miss over a Modified peer: the peer flushes and is invalidated;
/// the requester takes the block cache-to-cache and skips memory.
#[test]
fn write_miss_over_modified_peer() {
    let mut engine = engine_with(Protocol::Mesi, 2);
    drive(
        &mut engine,
        &[(0, MemOp::Write, 0x100), (1, MemOp::Write, 0x100)],
    );

    let c0 = engine.cache(0).stats();
    assert_eq!(c0.invalidations, 1);
    assert_eq!(c0.flushes, 1);
    assert_eq!(c0.writebacks, 1);
    assert_eq!(state_of(&engine, 0, 0x100), None);

    let c1 = engine.cache(1).stats();
    assert_eq!(c1.bus_rdx, 1);
    assert_eq!(c1.mem_transactions, 0, "peer flush covered the fill");
    assert_eq!(c1.cache_to_cache, 1);
    assert_eq!(state_of(&engine, 1, 0x100), Some(LineState::Modified));
}

/// A write miss with no cached peers is served by memory.
#[test]
fn lone_write_miss_reads_memory() {
    let mut engine = engine_with(Protocol::Mesi, 2);
    drive(&mut engine, &[(0, MemOp::Write, 0x100)]);

    let c0 = engine.cache(0).stats();
    assert_eq!(c0.bus_rdx, 1);
    assert_eq!(c0.mem_transactions, 1);
    assert_eq!(c0.cache_to_cache, 0);
    assert_eq!(state_of(&engine, 0, 0x100), Some(LineState::Modified));
}
