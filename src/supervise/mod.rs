// src/supervise/mod.rs

//! Process supervision: the task state machine and everything needed to
//! turn a finished run into a report.
//!
//! - [`task`] owns the child process, its capture files and the escalation
//!   protocol (SIGTERM, then SIGKILL on the next tick).
//! - [`state`] holds the state enum and its transition table.
//! - [`trace`] separates `set -x` trace lines from real stderr output.
//! - [`timeline`] is the append-only diagnostic log of a run.
//! - [`context`] is the serializable snapshot of a run.
//! - [`template`] renders the human-readable failure report.

pub mod context;
pub mod state;
pub mod task;
pub mod template;
pub mod timeline;
pub mod trace;

pub use context::TaskContext;
pub use state::{TaskState, Transition, is_exceptional};
pub use task::{SupervisedTask, TaskOptions};
pub use template::ErrorTemplate;
pub use timeline::{Timeline, TimelineEntry};
pub use trace::{SplitStderr, TracePattern, split_stream};
