//! Error definitions for the coherence simulator.
//!
//! This module defines the error taxonomy surfaced to callers. It provides:
//! 1. **Configuration Errors:** Rejected cache geometries and protocol ids,
//!    reported before any simulation takes place.
//! 2. **Trace Errors:** Failures opening or reading the memory-access trace.
//!
//! Engine-internal invariant violations (an unknown bus command reaching a
//! snoop handler, a processor id outside the configured range) are not
//! represented here; they are simulator bugs and abort via panic.

use std::fmt;
use std::io;

/// Error raised when a simulation configuration is rejected.
///
/// All variants are detected by [`crate::config::SimConfig::validate`] before
/// any cache is constructed.
#[derive(Debug)]
pub enum ConfigError {
    /// A geometry or topology field that must be positive was zero.
    ///
    /// The associated value names the offending field.
    ZeroField(&'static str),

    /// A derived or supplied geometry value was not an exact power of two.
    ///
    /// Carries the field name and the rejected value.
    NotPowerOfTwo(&'static str, u64),

    /// The cache size is not divisible into whole sets of `block * ways` bytes.
    ///
    /// Carries the cache size, block size, and associativity.
    IndivisibleGeometry(u64, u64, u64),

    /// The numeric protocol selector was not one of 0 (MSI), 1 (MESI), 2 (Dragon).
    UnknownProtocol(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroField(field) => {
                write!(f, "configuration field `{}` must be non-zero", field)
            }
            ConfigError::NotPowerOfTwo(field, value) => {
                write!(f, "`{}` must be a power of two, got {}", field, value)
            }
            ConfigError::IndivisibleGeometry(cache, block, ways) => {
                write!(
                    f,
                    "cache size {} is not divisible into sets of {} x {} bytes",
                    cache, ways, block
                )
            }
            ConfigError::UnknownProtocol(id) => {
                write!(f, "unknown protocol id {} (expected 0, 1, or 2)", id)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error raised while opening or reading a trace file.
#[derive(Debug)]
pub enum TraceError {
    /// The trace file could not be opened. Carries the path and the cause.
    Open(String, io::Error),

    /// A read from the trace stream failed mid-run.
    Read(io::Error),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Open(path, err) => write!(f, "cannot open trace `{}`: {}", path, err),
            TraceError::Read(err) => write!(f, "trace read failed: {}", err),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::Open(_, err) | TraceError::Read(err) => Some(err),
        }
    }
}
