// src/supervise/timeline.rs

//! Append-only diagnostic timeline of a task run.

use chrono::{DateTime, Utc};

/// Timestamp format used when rendering the timeline for humans.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// One `(timestamp, action)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub action: String,
}

/// Ordered list of entries; timestamps never go backwards even if the wall
/// clock is stepped back while the task runs.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `action` at the current time.
    pub fn push(&mut self, action: impl Into<String>) {
        self.push_at(Utc::now(), action);
    }

    /// Record `action` at `at`, clamped to the last recorded timestamp.
    pub fn push_at(&mut self, at: DateTime<Utc>, action: impl Into<String>) {
        let at = match self.entries.last() {
            Some(last) if last.at > at => last.at,
            _ => at,
        };
        self.entries.push(TimelineEntry {
            at,
            action: action.into(),
        });
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as an indented bullet list, oldest first, without a trailing
    /// newline.
    pub fn format(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("  * {} - {}", e.at.format(TIMESTAMP_FORMAT), e.action))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
