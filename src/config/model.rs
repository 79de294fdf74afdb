// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{LockKind, ReportKind};

/// Optional defaults file, read with `--config`.
///
/// ```toml
/// [lock]
/// type = "redis"
/// blocking = false
/// prefix = "lock:"
/// lease_secs = 3600
///
/// [redis]
/// host = "logstash"
/// port = 6379
/// db = 0
///
/// [report]
/// type = "redis"
/// key = "logstash_json"
///
/// [task]
/// timeout_secs = 600
/// template = "/etc/cronguard/error-template"
/// ```
///
/// Every field is optional; command-line flags win over this file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub lock: LockSection,

    #[serde(default)]
    pub redis: RedisSection,

    #[serde(default)]
    pub report: ReportSection,

    #[serde(default)]
    pub task: TaskSection,
}

/// `[lock]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockSection {
    #[serde(rename = "type")]
    pub kind: Option<LockKind>,
    pub blocking: Option<bool>,
    pub directory: Option<PathBuf>,
    pub prefix: Option<String>,
    pub lease_secs: Option<u64>,
    pub sleep_ms: Option<u64>,
}

/// `[redis]` section, shared by the redis lock and the redis reporter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db: Option<i64>,
}

/// `[report]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    #[serde(rename = "type")]
    pub kind: Option<ReportKind>,
    pub key: Option<String>,
    pub udp_host: Option<String>,
    pub udp_port: Option<u16>,
}

/// `[task]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSection {
    pub timeout_secs: Option<u64>,
    pub template: Option<PathBuf>,
    pub trace_prefix: Option<String>,
    pub trace_split: Option<bool>,
    /// Supervision tick; one second unless overridden.
    pub poll_interval_ms: Option<u64>,
}
