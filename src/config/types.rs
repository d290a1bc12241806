//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_API_KEY_NAME, DEFAULT_CONFIG_FILE, DEFAULT_ENDPOINT, DEFAULT_MAX_CALLS_PER_WINDOW,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, DEFAULT_WINDOW_MS,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Whether a failed fetch uses up a slot in the quota window.
///
/// A failed request may or may not have reached the provider, so there is no
/// single right answer. Either way the loop still waits before the next fetch,
/// and the sequence number only advances on success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FailedCallPolicy {
    /// Failed fetches count toward the window like successful ones (default)
    #[default]
    ConsumeQuota,
    /// Only successful fetches count toward the window
    Free,
}

/// Poller configuration.
///
/// Parsed from the command line by the binary, or built programmatically with
/// `..Default::default()`. The defaults match the provider's free tier:
/// 20 calls per 60 second window.
///
/// # Examples
///
/// ```no_run
/// use odds_poller::Config;
///
/// let config = Config {
///     max_calls_per_window: 10,
///     window_ms: 30_000,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "odds_poller",
    version,
    about = "Polls an API endpoint at a bounded rate and handles each response in the background."
)]
pub struct Config {
    /// Key file holding KEY=VALUE lines
    #[arg(long, value_parser, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Name of the API key entry in the key file
    #[arg(long, default_value = DEFAULT_API_KEY_NAME)]
    pub api_key_name: String,

    /// Endpoint to poll (the API key is appended as a query parameter)
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Maximum calls per quota window
    #[arg(long, default_value_t = DEFAULT_MAX_CALLS_PER_WINDOW)]
    pub max_calls_per_window: u32,

    /// Quota window length in milliseconds
    #[arg(long, default_value_t = DEFAULT_WINDOW_MS)]
    pub window_ms: u64,

    /// Whether failed fetches consume a quota slot
    #[arg(long, value_enum, default_value_t = FailedCallPolicy::ConsumeQuota)]
    pub failed_call_policy: FailedCallPolicy,

    /// Maximum handler tasks running at once (0 = unbounded)
    ///
    /// Excess handlers wait for a slot inside their own task, so the fetch
    /// cadence is never held back by slow handlers.
    #[arg(long, default_value_t = 0)]
    pub max_in_flight_handlers: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            api_key_name: DEFAULT_API_KEY_NAME.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_calls_per_window: DEFAULT_MAX_CALLS_PER_WINDOW,
            window_ms: DEFAULT_WINDOW_MS,
            failed_call_policy: FailedCallPolicy::ConsumeQuota,
            max_in_flight_handlers: 0,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Checks the configuration for values that would make the loop misbehave.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_calls_per_window == 0 {
            return Err(ConfigError::ZeroCallsPerWindow);
        }
        if self.window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.window_ms < u64::from(self.max_calls_per_window) {
            return Err(ConfigError::WindowTooShort {
                window_ms: self.window_ms,
                max_calls: self.max_calls_per_window,
            });
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.api_key_name.is_empty() {
            return Err(ConfigError::EmptyKeyName);
        }
        match url::Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::InvalidEndpoint(self.endpoint.clone())),
        }
    }

    /// Quota window length.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}
