//! odds_poller library: rate-limited API polling with detached response handling.
//!
//! The poller fetches one endpoint over and over, never exceeding a fixed
//! number of calls per quota window, and hands every response body to a
//! [`ResponseHandler`] running in its own task so that slow processing never
//! delays the next fetch.
//!
//! # Example
//!
//! ```no_run
//! use odds_poller::{run_poller, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     max_calls_per_window: 10,
//!     window_ms: 60_000,
//!     ..Default::default()
//! };
//!
//! // Runs until Ctrl-C
//! let report = run_poller(config).await?;
//! println!("{} fetches, {} succeeded", report.attempts, report.successes);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
mod dispatch;
mod error_handling;
mod handler;
pub mod initialization;
mod pacer;
mod poller;
mod transport;

// Re-export public API
pub use config::{Config, FailedCallPolicy, LogFormat, LogLevel, Target};
pub use dispatch::Dispatcher;
pub use error_handling::{ConfigError, InitializationError, PollEvent, PollStats, TransportError};
pub use handler::{LoggingHandler, ResponseEnvelope, ResponseHandler};
pub use pacer::{Directive, QuotaWindow};
pub use poller::{FetchOutcome, PollReport, Poller};
pub use run::{run_poller, run_poller_with};
pub use tokio_util::sync::CancellationToken;
pub use transport::{HttpTransport, Transport};

// Internal run module (wires configuration, transport and handler into a poller)
mod run {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::info;
    use tokio_util::sync::CancellationToken;

    use crate::app::{shutdown_gracefully, spawn_signal_listener};
    use crate::config::{read_key, Config, Target};
    use crate::error_handling::InitializationError;
    use crate::handler::{LoggingHandler, ResponseHandler};
    use crate::initialization::{init_client, init_handler_limit, init_quota_window};
    use crate::poller::{PollReport, Poller};
    use crate::transport::HttpTransport;

    /// Polls the configured endpoint with the [`LoggingHandler`] until Ctrl-C or SIGTERM.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The configuration fails validation
    /// - The API key is missing or empty in the key file
    /// - The HTTP client cannot be initialized
    ///
    /// Per-request failures are never returned; they are logged and polling continues.
    pub async fn run_poller(config: Config) -> Result<PollReport> {
        let cancel = CancellationToken::new();
        let signal_task = spawn_signal_listener(cancel.clone());
        let result = run_poller_with(config, Arc::new(LoggingHandler), cancel.clone()).await;
        shutdown_gracefully(cancel, Some(signal_task)).await;
        result
    }

    /// Polls the configured endpoint with a custom handler until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Same startup failures as [`run_poller`].
    pub async fn run_poller_with<H: ResponseHandler>(
        config: Config,
        handler: Arc<H>,
        cancel: CancellationToken,
    ) -> Result<PollReport> {
        config.validate().context("Invalid configuration")?;

        let api_key = read_key(&config.config_file, &config.api_key_name);
        if api_key.is_empty() {
            return Err(InitializationError::MissingApiKey {
                key: config.api_key_name.clone(),
                path: config.config_file.display().to_string(),
            }
            .into());
        }

        let target =
            Target::new(&config.endpoint, &api_key).context("Failed to build target URL")?;
        let window = init_quota_window(&config).context("Failed to initialize quota window")?;
        let client = init_client(&config).context("Failed to initialize HTTP client")?;
        let handler_limit = init_handler_limit(config.max_in_flight_handlers);

        info!("Target: {}", target.redacted_url());
        if let Some(ref limit) = handler_limit {
            info!(
                "Handler concurrency limited to {} tasks",
                limit.available_permits()
            );
        }

        let mut poller = Poller::new(
            HttpTransport::new(client),
            handler,
            target.url(),
            window,
        )
        .with_failed_call_policy(config.failed_call_policy)
        .with_handler_limit(handler_limit);

        let stats = poller.stats();
        let report = poller.run(cancel).await;
        stats.log_summary();
        Ok(report)
    }
}
