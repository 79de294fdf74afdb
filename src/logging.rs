// src/logging.rs

//! Diagnostics for the supervisor itself, on stderr.
//!
//! stdout is reserved for the failure report, which cron mails to the job
//! owner; everything logged here goes to stderr instead. A level chosen by
//! `--log-level` or `CRONGUARD_LOG=<level>` applies to cronguard's own
//! events only. Dependencies (the redis client, tokio) stay at `error` so
//! a debug run is not drowned in connection chatter. `CRONGUARD_LOG` also
//! accepts full filter directives such as `cronguard=debug,redis=trace`.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "CRONGUARD_LOG";

/// Target prefix of every event emitted by this crate.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Resolve the filter: the CLI flag wins, then `CRONGUARD_LOG` (a level
/// name or raw directives), then `error`.
///
/// Unparseable directives fall back to the default rather than failing,
/// since logging problems must not stop the job from running.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return own_level(level_from_log_level(lvl));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => match parse_level_str(directives) {
            Some(level) => own_level(level),
            None => EnvFilter::try_new(directives).unwrap_or_else(|_| own_level(Level::ERROR)),
        },
        None => own_level(Level::ERROR),
    }
}

fn own_level(level: Level) -> EnvFilter {
    EnvFilter::new(format!(
        "error,{OWN_TARGET}={}",
        level.as_str().to_ascii_lowercase()
    ))
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

/// Parse a bare level name as accepted by `CRONGUARD_LOG`.
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
