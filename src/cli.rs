// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Options must precede the command: everything from `<CMD>` onwards is
//! handed to the child untouched, including arguments that look like flags.
//!
//! Most options are `Option`s so that [`crate::config::Settings::resolve`]
//! can tell "not given" apart from "given the default value" when merging
//! with a config file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::{LockKind, ReportKind};

/// Command-line arguments for `cronguard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cronguard",
    version,
    about = "Run a cron job with a timeout, a lock and a structured report.",
    long_about = None
)]
pub struct CliArgs {
    /// Job identity; used as the lock key and in every report.
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// Wall-clock timeout in seconds. Unbounded when omitted.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRONGUARD_LOG` or `error` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Optional TOML file providing defaults for the options below.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Lock backend (default: file).
    #[arg(long, value_enum, value_name = "KIND")]
    pub lock_type: Option<LockKind>,

    /// Wait for the lock instead of exiting when another run holds it.
    #[arg(long)]
    pub lock_blocking: bool,

    /// Directory for file locks (default: first writable of
    /// /var/run/lock, /var/run, /tmp, .).
    #[arg(long, value_name = "DIR")]
    pub lock_dir: Option<PathBuf>,

    /// Key prefix for redis locks (default: "lock:").
    #[arg(long, value_name = "PREFIX")]
    pub lock_prefix: Option<String>,

    /// Lease of a redis lock in seconds. No expiry when omitted.
    #[arg(long, value_name = "SECS")]
    pub lock_lease: Option<u64>,

    /// Poll interval while waiting for a redis lock (default: 100).
    #[arg(long, value_name = "MS")]
    pub lock_sleep_ms: Option<u64>,

    /// Where lifecycle records go (default: none).
    #[arg(long, value_enum, value_name = "KIND")]
    pub report: Option<ReportKind>,

    #[arg(long, value_name = "HOST")]
    pub redis_host: Option<String>,

    #[arg(long, value_name = "PORT")]
    pub redis_port: Option<u16>,

    #[arg(long, value_name = "DB")]
    pub redis_db: Option<i64>,

    /// List key records are pushed onto.
    #[arg(long, value_name = "KEY")]
    pub redis_key: Option<String>,

    /// Collector host for `--report udp`.
    #[arg(long, value_name = "HOST")]
    pub udp_host: Option<String>,

    #[arg(long, value_name = "PORT")]
    pub udp_port: Option<u16>,

    /// Failure report template (`$name` placeholders).
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Shell trace prompt to split stderr on, instead of `$PS4`.
    #[arg(long, value_name = "PS4", conflicts_with = "no_trace_split")]
    pub trace_prefix: Option<String>,

    /// Keep stderr as-is, without separating trace lines.
    #[arg(long)]
    pub no_trace_split: bool,

    /// The command to supervise.
    #[arg(value_name = "CMD")]
    pub cmd: String,

    /// Arguments passed to the command.
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
