// src/engine/mod.rs

//! Orchestration of one supervised run.
//!
//! [`Runner`] drives a [`SupervisedTask`](crate::supervise::SupervisedTask)
//! through start, the fixed-cadence supervision loop, classification and
//! reporting. Locking wraps around it in [`crate::run`].

pub mod runner;

use crate::report::Status;
use crate::supervise::TaskContext;

pub use runner::Runner;

/// Exit code when another run holds the lock (`EWOULDBLOCK`, 11 on Linux).
pub const EXIT_WOULD_BLOCK: i32 = libc::EWOULDBLOCK;

/// Exit code for setup failures (bad config, spawn failure, ...).
pub const EXIT_FATAL: i32 = 1;

/// Options for the supervision loop.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Sleep between two `supervise()` ticks.
    pub poll_interval: std::time::Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: crate::config::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: Status,
    pub return_code: Option<i32>,
    /// Rendered failure report, only for `Status::Error`.
    pub error_message: Option<String>,
    pub context: TaskContext,
}

impl RunReport {
    /// Process exit code to forward: the child's own code, or `128 + N`
    /// when it died from signal N.
    pub fn exit_code(&self) -> i32 {
        match self.return_code {
            Some(code) if code >= 0 => code,
            Some(code) => 128 - code,
            None => EXIT_FATAL,
        }
    }
}
