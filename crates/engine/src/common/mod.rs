//! Common types used throughout the coherence simulator.
//!
//! This module provides the fundamental building blocks shared across all
//! components of the simulator. It includes:
//! 1. **Address Type:** A strong type for memory addresses fed from the trace.
//! 2. **Memory Operations:** The read/write classification of trace records.
//! 3. **Error Handling:** Configuration and trace error taxonomies.

/// Address type definition.
pub mod addr;

/// Memory operation classification.
pub mod op;

/// Error types for configuration and trace input.
pub mod error;

pub use addr::Address;
pub use error::{ConfigError, TraceError};
pub use op::MemOp;
