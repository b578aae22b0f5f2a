//! Snoopy bus cache coherence simulation engine.
//!
//! This crate implements a trace-driven simulator of bus-based cache coherence
//! for a shared-memory multiprocessor. It provides the following:
//! 1. **Caches:** Per-processor set-associative tag stores with LRU replacement.
//! 2. **Coherence:** Request/snoop/resolve state machines for the MSI, MESI
//!    (Illinois), and Dragon protocols.
//! 3. **Statistics:** Per-cache operational counters (hits, misses, writebacks,
//!    bus transactions, interventions, invalidations, flushes) and reporting.
//! 4. **Trace input:** A reader for `<proc> <op> <hex_addr>` memory-access traces.
//! 5. **Simulation:** A driver that feeds a trace through the engine and emits
//!    the per-cache metric blocks.
//!
//! No data payloads, timing, or pipeline effects are modelled; the simulator is
//! an event counter over tags and coherence states.

/// Common types (addresses, memory operations, errors).
pub mod common;
/// Simulator configuration (geometry, protocol selection, validation).
pub mod config;
/// Set-associative LRU tag store and per-cache statistics.
pub mod cache;
/// Coherence engine (bus record, protocol handlers, snoop logic).
pub mod coherence;
/// Memory-access trace parsing.
pub mod trace;
/// Top-level simulation driver.
pub mod sim;

/// Simulation configuration; validate with [`SimConfig::validate`] before use.
pub use crate::config::{Protocol, SimConfig};
/// Coherence engine; one [`cache::Cache`] per processor on a shared bus.
pub use crate::coherence::Engine;
/// Top-level driver; construct with [`Simulator::new`], feed it a trace, report.
pub use crate::sim::Simulator;
