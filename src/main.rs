//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `odds_poller` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Exit status on startup failure
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use odds_poller::initialization::init_logger_with;
use odds_poller::{run_poller, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` is optional; RUST_LOG may be set there
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_poller(config).await {
        Ok(report) => {
            println!(
                "Stopped after {} fetch{} ({} succeeded, {} failed) in {:.1}s",
                report.attempts,
                if report.attempts == 1 { "" } else { "es" },
                report.successes,
                report.failures,
                report.elapsed.as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("odds_poller error: {:#}", e);
            process::exit(1);
        }
    }
}
