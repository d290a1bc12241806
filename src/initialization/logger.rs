//! Logger initialization.
//!
//! `env_logger` behind the `log` facade, writing either colored plain lines or
//! JSON objects, one per record.

use std::io::Write;

use colored::*;
use env_logger::fmt::Formatter;
use log::{Level, LevelFilter, Record};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Dependencies whose debug output drowns the poll loop's own.
const QUIET_MODULES: [&str; 3] = ["reqwest", "hyper", "hyper_util"];

/// Installs the global logger.
///
/// `RUST_LOG` is applied first, so per-module directives such as
/// `RUST_LOG=odds_poller::transport=trace` still work; `level` then sets the
/// overall and crate-wide threshold, as given by `--log-level`. HTTP stack
/// modules never log below `info`.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for module in QUIET_MODULES {
        builder.filter_module(module, LevelFilter::Info);
    }
    builder.filter_module("odds_poller", level);

    match format {
        LogFormat::Json => builder.format(write_json),
        LogFormat::Plain => builder.format(write_plain),
    };

    builder.try_init()?;
    Ok(())
}

/// `{"ts":<epoch ms>,"level":..,"target":..,"msg":..}`
fn write_json(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    let msg = serde_json::to_string(&record.args().to_string()).unwrap_or_else(|_| "\"\"".into());
    writeln!(
        buf,
        "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
        chrono::Utc::now().timestamp_millis(),
        record.level(),
        record.target(),
        msg
    )
}

/// `HH:MM:SS.mmm [LEVEL] target message`
fn write_plain(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    writeln!(
        buf,
        "{} [{}] {} {}",
        chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
        paint_level(record.level()),
        record.target().cyan(),
        record.args()
    )
}

fn paint_level(level: Level) -> ColoredString {
    let name = level.to_string();
    match level {
        Level::Error => name.red().bold(),
        Level::Warn => name.yellow(),
        Level::Info => name.green(),
        Level::Debug => name.blue(),
        Level::Trace => name.purple(),
    }
}
