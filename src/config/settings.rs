// src/config/settings.rs

//! Fully resolved configuration, handed to each component's constructor.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::FileConfig;
use crate::lock::redis::DEFAULT_PREFIX;
use crate::types::{LockKind, ReportKind};

/// Supervision tick used unless the config file overrides it.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything one invocation needs, after merging CLI flags, the optional
/// config file and built-in defaults (in that order of precedence).
#[derive(Debug, Clone)]
pub struct Settings {
    pub name: String,
    pub cmd: String,
    pub args: Vec<String>,
    pub task: TaskSettings,
    pub lock: LockSettings,
    pub redis: RedisSettings,
    pub report: ReportSettings,
}

/// How the stderr trace pattern is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceMode {
    /// Derive it from `$PS4` / the shell default.
    Discover,
    /// Use this prompt.
    Prompt(String),
    /// Do not split stderr.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct TaskSettings {
    pub timeout: Option<Duration>,
    /// Custom report template; the built-in one is used when `None`.
    pub template: Option<PathBuf>,
    pub trace: TraceMode,
    pub poll_interval: Duration,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            template: None,
            trace: TraceMode::Discover,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LockSettings {
    pub kind: LockKind,
    pub blocking: bool,
    pub directory: Option<PathBuf>,
    pub prefix: String,
    pub lease: Option<Duration>,
    pub sleep: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            kind: LockKind::default(),
            blocking: false,
            directory: None,
            prefix: DEFAULT_PREFIX.to_string(),
            lease: None,
            sleep: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl RedisSettings {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "logstash".to_string(),
            port: 6379,
            db: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub kind: ReportKind,
    /// List key for the redis reporter.
    pub key: String,
    pub udp_host: Option<String>,
    pub udp_port: u16,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            kind: ReportKind::default(),
            key: "logstash_json".to_string(),
            udp_host: None,
            udp_port: 5959,
        }
    }
}

impl Settings {
    /// Merge `args` over `file` over defaults. No validation happens here;
    /// see [`crate::config::validate_settings`].
    pub fn resolve(args: &CliArgs, file: FileConfig) -> Self {
        let FileConfig {
            lock,
            redis,
            report,
            task,
        } = file;

        let lock_defaults = LockSettings::default();
        let lock = LockSettings {
            kind: args.lock_type.or(lock.kind).unwrap_or(lock_defaults.kind),
            blocking: args.lock_blocking || lock.blocking.unwrap_or(lock_defaults.blocking),
            directory: args.lock_dir.clone().or(lock.directory),
            prefix: args
                .lock_prefix
                .clone()
                .or(lock.prefix)
                .unwrap_or(lock_defaults.prefix),
            lease: args
                .lock_lease
                .or(lock.lease_secs)
                .map(Duration::from_secs),
            sleep: args
                .lock_sleep_ms
                .or(lock.sleep_ms)
                .map(Duration::from_millis)
                .unwrap_or(lock_defaults.sleep),
        };

        let redis_defaults = RedisSettings::default();
        let redis = RedisSettings {
            host: args
                .redis_host
                .clone()
                .or(redis.host)
                .unwrap_or(redis_defaults.host),
            port: args.redis_port.or(redis.port).unwrap_or(redis_defaults.port),
            db: args.redis_db.or(redis.db).unwrap_or(redis_defaults.db),
        };

        let report_defaults = ReportSettings::default();
        let report = ReportSettings {
            kind: args.report.or(report.kind).unwrap_or(report_defaults.kind),
            key: args
                .redis_key
                .clone()
                .or(report.key)
                .unwrap_or(report_defaults.key),
            udp_host: args.udp_host.clone().or(report.udp_host),
            udp_port: args
                .udp_port
                .or(report.udp_port)
                .unwrap_or(report_defaults.udp_port),
        };

        let trace = if args.no_trace_split || task.trace_split == Some(false) {
            TraceMode::Disabled
        } else {
            match args.trace_prefix.clone().or(task.trace_prefix) {
                Some(prompt) => TraceMode::Prompt(prompt),
                None => TraceMode::Discover,
            }
        };

        let task = TaskSettings {
            timeout: args
                .timeout
                .or(task.timeout_secs)
                .map(Duration::from_secs),
            template: args.template.clone().or(task.template),
            trace,
            poll_interval: task
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
        };

        Self {
            name: args.name.clone(),
            cmd: args.cmd.clone(),
            args: args.args.clone(),
            task,
            lock,
            redis,
            report,
        }
    }
}
