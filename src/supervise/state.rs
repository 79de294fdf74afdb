// src/supervise/state.rs

//! Lifecycle state of a supervised task and its transition table.

use std::fmt;

use serde::Serialize;

/// Why the supervisor last acted on the task.
///
/// Process exit is tracked separately (through the observed return code);
/// these labels only record which escalation step was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Initial,
    Started,
    #[serde(rename = "TIMEDOUT")]
    TimedOut,
    Terminated,
    Killed,
}

/// Events that move a task between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Spawned,
    TimeoutObserved,
    TerminateSent,
    KillSent,
}

impl TaskState {
    pub const ALL: [TaskState; 5] = [
        TaskState::Initial,
        TaskState::Started,
        TaskState::TimedOut,
        TaskState::Terminated,
        TaskState::Killed,
    ];

    /// Apply `event`, returning the next state or `None` if the event is not
    /// allowed from this state.
    pub fn next(self, event: Transition) -> Option<TaskState> {
        use TaskState::*;
        use Transition::*;

        match (self, event) {
            (Initial, Spawned) => Some(Started),
            (Started, TimeoutObserved) => Some(TimedOut),
            (Started | TimedOut, TerminateSent) => Some(Terminated),
            (Started | TimedOut | Terminated, KillSent) => Some(Killed),
            _ => None,
        }
    }

    /// States that can only be reached once the timeout has been crossed.
    pub fn past_timeout(self) -> bool {
        matches!(
            self,
            TaskState::TimedOut | TaskState::Terminated | TaskState::Killed
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Initial => "INITIAL",
            TaskState::Started => "STARTED",
            TaskState::TimedOut => "TIMEDOUT",
            TaskState::Terminated => "TERMINATED",
            TaskState::Killed => "KILLED",
        };
        f.write_str(s)
    }
}

/// Success/failure classification shared by every caller.
///
/// A run is exceptional iff the timeout was observed and not yet acted upon
/// (`TIMEDOUT`) or a non-zero return code was observed.
pub fn is_exceptional(state: TaskState, return_code: Option<i32>) -> bool {
    if state == TaskState::TimedOut {
        return true;
    }
    matches!(return_code, Some(code) if code != 0)
}
