//! Error handling and poll statistics.
//!
//! This module provides:
//! - Error type definitions for startup, configuration and transport failures
//! - Poll event counters shared between the loop and handler tasks
//!
//! Failures are split by how far they may travel:
//! - **Initialization**: fatal, the process exits with status 1
//! - **Transport**: logged, the loop continues with the next scheduled fetch
//! - **Handler**: contained inside the detached task that raised them

mod stats;
mod types;

// Re-export public API
pub use stats::PollStats;
pub use types::{ConfigError, InitializationError, PollEvent, TransportError};
