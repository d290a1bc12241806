//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (quota defaults, endpoint, timeouts)
//! - CLI option types and validation
//! - Key file lookup for the API credential
//! - The fixed polling target

mod constants;
mod key_file;
mod target;
mod types;

// Re-export all constants
pub use constants::*;
pub use key_file::{lookup_key, read_key};
pub use target::Target;
pub use types::{Config, FailedCallPolicy, LogFormat, LogLevel};
