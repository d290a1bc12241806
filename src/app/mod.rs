//! Main application modules.
//!
//! Process-level concerns around the poll loop: signal handling and shutdown.

pub mod shutdown;

// Re-export public API
pub use shutdown::{shutdown_gracefully, spawn_signal_listener};
