// src/supervise/context.rs

//! Snapshot of a finished (or running) task, as shipped in STOPPED records
//! and substituted into failure reports.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Second-precision ISO-8601, the format log collectors index on.
const WIRE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const HUMAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const MISSING: &str = "n/a";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskContext {
    pub name: String,
    pub cmd: String,
    pub args: Vec<String>,
    pub return_code: Option<i32>,
    #[serde(serialize_with = "iso_seconds")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "iso_seconds")]
    pub stop_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "float_seconds")]
    pub run_time: Option<Duration>,
    #[serde(serialize_with = "float_seconds")]
    pub timeout: Option<Duration>,
    pub stdout: String,
    pub stderr: String,
    /// Absent when trace classification is disabled.
    pub trace: Option<String>,
}

impl TaskContext {
    /// Human-readable rendering of every field, keyed by template placeholder.
    pub fn template_values(&self) -> BTreeMap<&'static str, String> {
        let mut values = BTreeMap::new();
        values.insert("name", self.name.clone());
        values.insert("cmd", self.cmd.clone());
        values.insert("args", self.args.join(" "));
        values.insert(
            "return_code",
            self.return_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
        );
        values.insert("start_time", human_time(self.start_time));
        values.insert("stop_time", human_time(self.stop_time));
        values.insert("run_time", human_duration(self.run_time));
        values.insert("timeout", human_duration(self.timeout));
        values.insert("stdout", self.stdout.trim_end_matches('\n').to_string());
        values.insert("stderr", self.stderr.trim_end_matches('\n').to_string());
        values.insert(
            "trace",
            self.trace
                .as_deref()
                .map(|t| t.trim_end_matches('\n').to_string())
                .unwrap_or_else(|| MISSING.to_string()),
        );
        values
    }
}

fn human_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format(HUMAN_TIME_FORMAT).to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn human_duration(d: Option<Duration>) -> String {
    d.map(|d| format!("{:.3}s", d.as_secs_f64()))
        .unwrap_or_else(|| MISSING.to_string())
}

fn iso_seconds<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(t) => serializer.serialize_str(&t.format(WIRE_TIME_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

fn float_seconds<S: Serializer>(
    value: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_f64(d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}
