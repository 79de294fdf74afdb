// src/report/record.rs

//! The JSON record shipped for each lifecycle transition.

use serde::Serialize;

use crate::supervise::{SupervisedTask, TaskContext};

/// Value of the `type` field; collectors route on it.
pub const RECORD_TYPE: &str = "cron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

/// One lifecycle event. `result` and `timeline` are only present on
/// `STOPPED` records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub action: Action,
    pub status: Status,
    pub name: String,
    pub cmd: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
}

impl Record {
    pub fn started(task: &SupervisedTask, host: &str) -> Self {
        Self {
            kind: RECORD_TYPE,
            id: task.id().to_string(),
            action: Action::Started,
            status: Status::Ok,
            name: task.name().to_string(),
            cmd: task.cmd().to_string(),
            host: host.to_string(),
            result: None,
            timeline: None,
        }
    }

    pub fn stopped(task: &SupervisedTask, host: &str, status: Status, context: TaskContext) -> Self {
        Self {
            kind: RECORD_TYPE,
            id: task.id().to_string(),
            action: Action::Stopped,
            status,
            name: task.name().to_string(),
            cmd: task.cmd().to_string(),
            host: host.to_string(),
            result: Some(context),
            timeline: Some(task.format_timeline()),
        }
    }

    /// `STOPPED`/`ERROR` for a run whose supervision failed. The result is
    /// included when the captured output could still be read.
    pub fn aborted(task: &SupervisedTask, host: &str, context: Option<TaskContext>) -> Self {
        Self {
            kind: RECORD_TYPE,
            id: task.id().to_string(),
            action: Action::Stopped,
            status: Status::Error,
            name: task.name().to_string(),
            cmd: task.cmd().to_string(),
            host: host.to_string(),
            result: context,
            timeline: Some(task.format_timeline()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
