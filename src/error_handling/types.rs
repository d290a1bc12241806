//! Error type definitions.
//!
//! This module defines the error types and event kinds used throughout the poller.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
///
/// Every variant is fatal: the binary reports it and exits with status 1.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The API key is missing from the key file, or its value is empty.
    #[error("API key not found: no non-empty `{key}` entry in {path}")]
    MissingApiKey {
        /// Key that was looked up
        key: String,
        /// Key file that was read
        path: String,
    },

    /// The quota allows zero calls per window.
    #[error("Invalid quota: max calls per window must be greater than zero")]
    InvalidQuota,

    /// The endpoint could not be parsed as a URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Errors raised by [`Config::validate`](crate::Config::validate).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_calls_per_window must be greater than zero")]
    ZeroCallsPerWindow,

    #[error("window_ms must be greater than zero")]
    ZeroWindow,

    /// The pacing interval would truncate to zero milliseconds.
    #[error("window_ms ({window_ms}) must be at least max_calls_per_window ({max_calls})")]
    WindowTooShort { window_ms: u64, max_calls: u32 },

    #[error("timeout_seconds must be greater than zero")]
    ZeroTimeout,

    #[error("endpoint must be an http(s) URL, got `{0}`")]
    InvalidEndpoint(String),

    #[error("api_key_name must not be empty")]
    EmptyKeyName,
}

/// A single fetch failed.
///
/// Recoverable: the loop logs it and moves on to the pacing step.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be sent or its body could not be read.
    ///
    /// Built with the URL stripped, as request URLs carry the API key.
    #[error("request failed: {0}")]
    Request(#[source] ReqwestError),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    /// Failure reported by a non-HTTP transport.
    #[error("{0}")]
    Other(String),
}

/// Events counted by [`PollStats`](crate::PollStats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum PollEvent {
    /// A fetch was attempted, whatever its outcome
    FetchAttempt,
    /// A fetch returned a body and a handler was spawned
    FetchSuccess,
    /// A fetch failed with a [`TransportError`]
    TransportFailure,
    /// A handler returned `Ok`
    HandlerSuccess,
    /// A handler returned `Err`
    HandlerFailure,
    /// A handler panicked
    HandlerPanic,
    /// The quota was exhausted and the loop slept for a full window
    Cooldown,
}

impl std::fmt::Display for PollEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PollEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollEvent::FetchAttempt => "Fetch attempts",
            PollEvent::FetchSuccess => "Successful fetches",
            PollEvent::TransportFailure => "Transport failures",
            PollEvent::HandlerSuccess => "Handlers completed",
            PollEvent::HandlerFailure => "Handler errors",
            PollEvent::HandlerPanic => "Handler panics",
            PollEvent::Cooldown => "Quota cooldowns",
        }
    }
}
