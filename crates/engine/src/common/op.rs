//! Memory operation classification.
//!
//! This module defines the read/write classification of processor requests.
//! The classification is used for the following:
//! 1. **Bus Command Selection:** Reads and writes issue different bus
//!    transactions under each coherence protocol.
//! 2. **Statistics Tracking:** Categorizing accesses and misses per cache.

/// Type of processor memory request.
///
/// Every trace record is either a load or a store; there are no other
/// request kinds in the simulated system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemOp {
    /// Data read access (load).
    Read,

    /// Data write access (store).
    Write,
}
