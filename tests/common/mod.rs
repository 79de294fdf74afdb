#![allow(dead_code)]

use std::time::Duration;

pub use cronguard_test_utils::builders::{SettingsBuilder, TaskBuilder};
pub use cronguard_test_utils::memory_reporter::MemoryReporter;
pub use cronguard_test_utils::{init_tracing, supervise_to_exit, with_timeout};

/// Tick used by tests; much shorter than the production one second.
pub const TICK: Duration = Duration::from_millis(100);

/// Collapse consecutive duplicates, keeping the order of first appearance.
pub fn dedup<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if out.last() != Some(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Number of timeline entries whose action contains `needle`.
pub fn count_actions(task: &cronguard::supervise::SupervisedTask, needle: &str) -> usize {
    task.timeline()
        .entries()
        .iter()
        .filter(|e| e.action.contains(needle))
        .count()
}

/// Linux-specific: a pid is running unless it is gone or a zombie.
pub fn process_is_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => {
            // Field 3, after the parenthesised command name.
            let state = stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next());
            !matches!(state, Some("Z") | Some("X"))
        }
        Err(_) => false,
    }
}

/// Poll until `pid` is no longer running; panics after three seconds.
pub async fn wait_until_gone(pid: u32) {
    let deadline = std::time::Instant::now() + Duration::from_secs(3);
    while process_is_running(pid) {
        assert!(std::time::Instant::now() < deadline, "process {pid} is still running");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
