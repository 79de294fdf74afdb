// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod lock;
pub mod logging;
pub mod report;
pub mod supervise;
pub mod types;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{Settings, TraceMode, load_settings};
use crate::engine::{EXIT_WOULD_BLOCK, RunOptions, Runner};
use crate::errors::Result;
use crate::lock::{LockOutcome, build_lock, with_lock};
use crate::report::build_reporter;
use crate::supervise::{ErrorTemplate, SupervisedTask, TaskOptions, TracePattern};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - settings (CLI flags + optional config file)
/// - the lock for this job name
/// - the reporter
/// - the supervised task and its run loop
///
/// The failure report is printed to stdout only when the run is
/// exceptional.
pub async fn run(args: CliArgs) -> Result<i32> {
    let settings = load_settings(&args)?;
    debug!(?settings, "resolved settings");
    run_with_settings(&settings).await
}

/// Same as [`run`], for callers that already hold resolved settings.
pub async fn run_with_settings(settings: &Settings) -> Result<i32> {
    let mut lock = build_lock(&settings.lock, &settings.redis, &settings.name)?;
    let reporter = build_reporter(&settings.report, &settings.redis)?;
    let mut task = build_task(settings)?;

    let runner = Runner::new(
        reporter.as_ref(),
        Runner::local_host(),
        RunOptions {
            poll_interval: settings.task.poll_interval,
        },
    );

    match with_lock(lock.as_mut(), runner.run(&mut task)).await? {
        LockOutcome::Ran(report) => {
            if let Some(message) = &report.error_message {
                println!("{message}");
            }
            Ok(report.exit_code())
        }
        LockOutcome::WouldBlock => {
            info!(task = %settings.name, "another run holds the lock; exiting");
            Ok(EXIT_WOULD_BLOCK)
        }
    }
}

/// Construct the task described by `settings`.
pub fn build_task(settings: &Settings) -> Result<SupervisedTask> {
    let template = match &settings.task.template {
        Some(path) => ErrorTemplate::from_path(path)?,
        None => ErrorTemplate::default(),
    };
    let trace_pattern = match &settings.task.trace {
        TraceMode::Discover => TracePattern::discover(),
        TraceMode::Prompt(prompt) => TracePattern::from_prompt(prompt)?,
        TraceMode::Disabled => None,
    };

    SupervisedTask::new(
        settings.name.clone(),
        settings.cmd.clone(),
        settings.args.clone(),
        TaskOptions {
            timeout: settings.task.timeout,
            template,
            trace_pattern,
        },
    )
}
