pub mod builders;
pub mod memory_reporter;

use std::sync::Once;
use std::time::Duration;

use cronguard::supervise::SupervisedTask;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Tick `task` every `interval` until it exits; returns the state observed
/// after each tick.
pub async fn supervise_to_exit(
    task: &mut SupervisedTask,
    interval: Duration,
) -> Vec<cronguard::supervise::TaskState> {
    let mut observed = Vec::new();
    loop {
        let alive = task.supervise().expect("supervise failed");
        observed.push(task.state());
        if !alive {
            return observed;
        }
        tokio::time::sleep(interval).await;
    }
}
