//! Configuration for the coherence simulator.
//!
//! This module defines the structures and enums used to parameterize a
//! simulation run. It provides:
//! 1. **Defaults:** Baseline geometry constants used when a field is omitted.
//! 2. **Structures:** The per-run [`SimConfig`] (cache geometry, processor
//!    count, protocol) with validation.
//! 3. **Enums:** The coherence [`Protocol`] selector.
//!
//! Configuration is supplied by the CLI from positional arguments or
//! deserialized from a JSON document; use [`SimConfig::default`] in tests.

use serde::Deserialize;
use std::fmt;

use crate::common::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline cache organisation when not explicitly
/// overridden.
mod defaults {
    /// Default per-processor cache capacity in bytes (4 KiB).
    pub const CACHE_BYTES: u64 = 4096;

    /// Default cache block (line) size in bytes.
    ///
    /// Matches typical modern processor cache line sizes.
    pub const BLOCK_BYTES: u64 = 64;

    /// Default associativity (2 ways).
    pub const WAYS: u64 = 2;

    /// Default number of processors sharing the bus.
    pub const NUM_PROCESSORS: usize = 4;
}

/// Snoopy coherence protocol selector.
///
/// Determines the coherence state set, the bus-command vocabulary, and the
/// snoop reactions applied by the engine. The numeric values match the CLI
/// protocol argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Protocol {
    /// Three-state invalidation protocol (Modified, Shared, Invalid).
    #[default]
    #[serde(alias = "MSI")]
    Msi,

    /// Four-state Illinois invalidation protocol (adds Exclusive).
    #[serde(alias = "MESI")]
    Mesi,

    /// Four-state update protocol (Exclusive, SharedClean, SharedModified,
    /// Modified); writes broadcast updates instead of invalidating sharers.
    Dragon,
}

impl TryFrom<u32> for Protocol {
    type Error = ConfigError;

    /// Maps the CLI protocol id (0, 1, 2) onto a protocol.
    fn try_from(id: u32) -> Result<Self, ConfigError> {
        match id {
            0 => Ok(Protocol::Msi),
            1 => Ok(Protocol::Mesi),
            2 => Ok(Protocol::Dragon),
            other => Err(ConfigError::UnknownProtocol(other)),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Msi => write!(f, "MSI"),
            Protocol::Mesi => write!(f, "MESI"),
            Protocol::Dragon => write!(f, "Dragon"),
        }
    }
}

/// Configuration of one simulation run.
///
/// Geometry is identical for every processor's private L1. Validate before
/// constructing caches; [`crate::cache::Cache::new`] and
/// [`crate::coherence::Engine::new`] assume a validated configuration.
///
/// # Examples
///
/// Deserializing from JSON (the CLI `--config` path):
///
/// ```
/// use smp_core::config::{Protocol, SimConfig};
///
/// let json = r#"{
///     "cache_bytes": 1024,
///     "block_bytes": 16,
///     "ways": 2,
///     "num_processors": 4,
///     "protocol": "Dragon"
/// }"#;
///
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// config.validate().unwrap();
/// assert_eq!(config.protocol, Protocol::Dragon);
/// assert_eq!(config.num_sets(), 32);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Total capacity of each private cache in bytes.
    #[serde(default = "SimConfig::default_cache_bytes")]
    pub cache_bytes: u64,

    /// Cache block (line) size in bytes.
    #[serde(default = "SimConfig::default_block_bytes")]
    pub block_bytes: u64,

    /// Associativity: number of ways per set.
    #[serde(default = "SimConfig::default_ways")]
    pub ways: u64,

    /// Number of processors (one private cache each) on the shared bus.
    #[serde(default = "SimConfig::default_num_processors")]
    pub num_processors: usize,

    /// Coherence protocol applied by the engine.
    #[serde(default)]
    pub protocol: Protocol,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cache_bytes: defaults::CACHE_BYTES,
            block_bytes: defaults::BLOCK_BYTES,
            ways: defaults::WAYS,
            num_processors: defaults::NUM_PROCESSORS,
            protocol: Protocol::default(),
        }
    }
}

impl SimConfig {
    fn default_cache_bytes() -> u64 {
        defaults::CACHE_BYTES
    }

    fn default_block_bytes() -> u64 {
        defaults::BLOCK_BYTES
    }

    fn default_ways() -> u64 {
        defaults::WAYS
    }

    fn default_num_processors() -> usize {
        defaults::NUM_PROCESSORS
    }

    /// Checks the geometry and topology for consistency.
    ///
    /// Rejects zero-valued fields, a cache size that does not divide into
    /// whole sets, and a block size or set count that is not an exact power
    /// of two (the address decomposition relies on shift/mask arithmetic).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_bytes == 0 {
            return Err(ConfigError::ZeroField("cache_bytes"));
        }
        if self.block_bytes == 0 {
            return Err(ConfigError::ZeroField("block_bytes"));
        }
        if self.ways == 0 {
            return Err(ConfigError::ZeroField("ways"));
        }
        if self.num_processors == 0 {
            return Err(ConfigError::ZeroField("num_processors"));
        }
        if !self.block_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo("block_bytes", self.block_bytes));
        }
        if self.cache_bytes % (self.block_bytes * self.ways) != 0 {
            return Err(ConfigError::IndivisibleGeometry(
                self.cache_bytes,
                self.block_bytes,
                self.ways,
            ));
        }
        let sets = self.cache_bytes / (self.block_bytes * self.ways);
        if !sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo("num_sets", sets));
        }
        Ok(())
    }

    /// Number of sets in each cache.
    pub fn num_sets(&self) -> u64 {
        self.cache_bytes / (self.block_bytes * self.ways)
    }

    /// Number of address bits consumed by the block offset.
    pub fn block_bits(&self) -> u32 {
        self.block_bytes.trailing_zeros()
    }
}
