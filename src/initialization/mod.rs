//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources:
//! - Logger
//! - HTTP client (timeouts, user agent)
//! - Quota window
//! - Optional handler concurrency limit

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::pacer::QuotaWindow;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes the semaphore bounding concurrently running handlers.
///
/// Returns `None` when `count` is 0, which leaves handler dispatch unbounded.
pub fn init_handler_limit(count: usize) -> Option<Arc<Semaphore>> {
    if count == 0 {
        None
    } else {
        Some(Arc::new(Semaphore::new(count)))
    }
}

/// Initializes an empty quota window from the config.
///
/// # Errors
///
/// Returns `InitializationError::InvalidQuota` if the config allows zero calls per window.
pub fn init_quota_window(config: &Config) -> Result<QuotaWindow, InitializationError> {
    QuotaWindow::new(config.max_calls_per_window, config.window())
}
