//! HTTP client initialization.
//!
//! The poller builds exactly one client at startup and reuses it (and its
//! connection pool) for every fetch.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error_handling::InitializationError;
use reqwest::ClientBuilder;

/// Initializes the HTTP client used for polling.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the config
/// - Per-request timeout from the config
/// - Default redirect policy (up to 10 hops)
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the TLS backend or
/// client cannot be initialized.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}
