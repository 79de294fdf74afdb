mod common;
use crate::common::{
    MemoryReporter, SettingsBuilder, TICK, TaskBuilder, count_actions, init_tracing, with_timeout,
};

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use clap::Parser;

use cronguard::cli::CliArgs;
use cronguard::engine::runner::canonical_host_name;
use cronguard::engine::{EXIT_WOULD_BLOCK, RunOptions, Runner};
use cronguard::errors::CronguardError;
use cronguard::lock::{FileLock, Lock};
use cronguard::report::{Action, Record, Reporter, Status};
use cronguard::supervise::TaskState;
use cronguard::types::{BoxFuture, LockKind, ReportKind};

fn fast() -> RunOptions {
    RunOptions { poll_interval: TICK }
}

#[tokio::test]
async fn test_clean_run_reports_started_then_ok() {
    init_tracing();
    let reporter = MemoryReporter::new();
    let runner = Runner::new(&reporter, "test-host", fast());
    let mut task = TaskBuilder::new("/bin/true").build();

    let report = with_timeout(runner.run(&mut task)).await.unwrap();

    assert_eq!(report.status, Status::Ok);
    assert_eq!(report.return_code, Some(0));
    assert_eq!(report.exit_code(), 0);
    assert!(report.error_message.is_none());
    assert_eq!(task.state(), TaskState::Started);
    assert!(!task.in_exceptional_state());

    let records = reporter.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, Action::Started);
    assert_eq!(records[0].status, Status::Ok);
    assert!(records[0].result.is_none());
    assert_eq!(records[1].action, Action::Stopped);
    assert_eq!(records[1].status, Status::Ok);
    assert_eq!(records[1].host, "test-host");
    assert_eq!(records[0].id, records[1].id);
    assert_eq!(records[1].result.as_ref().unwrap().return_code, Some(0));
}

#[tokio::test]
async fn test_timeout_run_escalates_and_reports_error() {
    init_tracing();
    let reporter = MemoryReporter::new();
    let runner = Runner::new(&reporter, "test-host", fast());
    let mut task = TaskBuilder::shell("trap '' TERM; sleep 10")
        .timeout(Duration::from_millis(300))
        .build();

    let report = with_timeout(runner.run(&mut task)).await.unwrap();

    assert_eq!(task.state(), TaskState::Killed);
    assert!(!task.is_alive());
    assert_eq!(report.status, Status::Error);
    assert_eq!(report.return_code, Some(-9));
    assert_eq!(report.exit_code(), 137);

    let message = report.error_message.expect("failure report");
    assert!(message.contains("job \"test-job\""));
    assert!(message.contains("timed out"));
    assert!(message.contains("forceful kill (SIGKILL)"));

    let records = reporter.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status, Status::Error);
    assert!(records[1].timeline.as_deref().unwrap().contains("graceful termination"));
}

#[tokio::test]
async fn test_missing_executable_reports_nothing() {
    init_tracing();
    let reporter = MemoryReporter::new();
    let runner = Runner::new(&reporter, "test-host", fast());
    let mut task = TaskBuilder::new("/nonexistent/cronguard-missing").build();

    let result = runner.run(&mut task).await;

    assert!(matches!(result, Err(CronguardError::SpawnError { .. })));
    assert!(reporter.records().is_empty());
}

#[tokio::test]
async fn test_non_zero_exit_is_forwarded_with_report() {
    init_tracing();
    let reporter = MemoryReporter::new();
    let runner = Runner::new(&reporter, "test-host", fast());
    let mut task = TaskBuilder::shell("echo partial; echo 'disk full' >&2; exit 3")
        .name("nightly")
        .build();

    let report = with_timeout(runner.run(&mut task)).await.unwrap();

    assert_eq!(report.status, Status::Error);
    assert_eq!(report.exit_code(), 3);
    assert_eq!(report.context.stdout, "partial\n");
    assert_eq!(report.context.stderr, "disk full\n");

    let message = report.error_message.unwrap();
    assert!(message.contains("job \"nightly\""));
    assert!(message.contains("disk full"));
    assert!(message.contains("exit code:   3"));
}

#[tokio::test]
async fn test_custom_template_is_used_for_the_report() {
    let reporter = MemoryReporter::new();
    let runner = Runner::new(&reporter, "test-host", fast());
    let mut task = TaskBuilder::shell("exit 2")
        .name("tmpl")
        .template("$name failed with $return_code")
        .build();

    let report = with_timeout(runner.run(&mut task)).await.unwrap();
    assert_eq!(report.error_message.as_deref(), Some("tmpl failed with 2"));
}

/// Reaps the child behind the supervisor's back as soon as STARTED is
/// reported, so the next `try_wait` fails with `ECHILD`.
struct ReapingReporter {
    pid_file: PathBuf,
    inner: MemoryReporter,
}

impl Reporter for ReapingReporter {
    fn record<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if record.action == Action::Started {
                let pid = read_pid(&self.pid_file).await;
                unsafe {
                    libc::kill(pid, libc::SIGKILL);
                    let mut status = 0;
                    libc::waitpid(pid, &mut status, 0);
                }
            }
            self.inner.record(record).await;
        })
    }
}

async fn read_pid(path: &Path) -> i32 {
    with_timeout(async {
        loop {
            if let Some(pid) = std::fs::read_to_string(path)
                .ok()
                .and_then(|s| s.trim().parse().ok())
            {
                return pid;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

#[tokio::test]
async fn test_supervision_failure_still_reports_stopped() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let reporter = ReapingReporter {
        pid_file: pid_file.clone(),
        inner: MemoryReporter::new(),
    };
    let runner = Runner::new(&reporter, "test-host", fast());
    let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());
    let mut task = TaskBuilder::shell(&script).name("reaped").build();

    let result = with_timeout(runner.run(&mut task)).await;

    assert!(matches!(result, Err(CronguardError::IoError(_))), "{result:?}");
    assert_eq!(count_actions(&task, "aborted (SIGKILL)"), 1);

    let records = reporter.inner.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, Action::Started);
    assert_eq!(records[1].action, Action::Stopped);
    assert_eq!(records[1].status, Status::Error);
    assert_eq!(records[0].id, records[1].id);
    assert!(records[1].result.is_some());
    assert!(records[1].timeline.as_deref().unwrap().contains("aborted (SIGKILL)"));
}

#[tokio::test]
async fn test_held_lock_skips_the_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let settings = SettingsBuilder::new("locked-job", "touch")
        .arg(marker.to_str().unwrap())
        .file_lock(dir.path())
        .build();
    assert_eq!(settings.lock.kind, LockKind::File);

    let mut other = FileLock::open(dir.path().join("locked-job"), false).unwrap();
    assert!(other.acquire().await.unwrap());

    let code = with_timeout(cronguard::run_with_settings(&settings)).await.unwrap();
    assert_eq!(code, EXIT_WOULD_BLOCK);
    assert!(!marker.exists());

    other.release().await;

    let code = with_timeout(cronguard::run_with_settings(&settings)).await.unwrap();
    assert_eq!(code, 0);
    assert!(marker.exists());

    // The run released its lock on the way out.
    assert!(other.acquire().await.unwrap());
    other.release().await;
}

#[tokio::test]
async fn test_run_with_settings_forwards_signal_exit() {
    let settings = SettingsBuilder::new("signalled", "sh")
        .arg("-c")
        .arg("kill -TERM $$")
        .build();

    let code = with_timeout(cronguard::run_with_settings(&settings)).await.unwrap();
    assert_eq!(code, 128 + 15);
}

#[test]
fn test_cli_passes_command_arguments_through() {
    let args = CliArgs::try_parse_from([
        "cronguard",
        "--name",
        "backup",
        "--timeout",
        "30",
        "tar",
        "-czf",
        "/tmp/x.tgz",
        "--verbose",
    ])
    .unwrap();

    assert_eq!(args.name, "backup");
    assert_eq!(args.timeout, Some(30));
    assert_eq!(args.cmd, "tar");
    assert_eq!(args.args, vec!["-czf", "/tmp/x.tgz", "--verbose"]);
}

#[test]
fn test_cli_double_dash_separates_command() {
    let args = CliArgs::try_parse_from([
        "cronguard",
        "--name",
        "job",
        "--lock-type",
        "redis",
        "--report",
        "udp",
        "--udp-host",
        "collector",
        "--",
        "--weird-command",
        "arg",
    ])
    .unwrap();

    assert_eq!(args.lock_type, Some(LockKind::Redis));
    assert_eq!(args.udp_host.as_deref(), Some("collector"));
    assert_eq!(args.cmd, "--weird-command");
    assert_eq!(args.args, vec!["arg"]);
}

#[test]
fn test_cli_requires_name_and_command() {
    assert!(CliArgs::try_parse_from(["cronguard", "/bin/true"]).is_err());
    assert!(CliArgs::try_parse_from(["cronguard", "--name", "x"]).is_err());
    assert!(
        CliArgs::try_parse_from([
            "cronguard",
            "--name",
            "x",
            "--trace-prefix",
            "+ ",
            "--no-trace-split",
            "true"
        ])
        .is_err()
    );
}

#[test]
fn test_cli_rejects_unknown_backends() {
    for (flag, value) in [("--lock-type", "zookeeper"), ("--report", "syslog")] {
        let result = CliArgs::try_parse_from(["cronguard", "--name", "x", flag, value, "true"]);
        assert!(result.is_err(), "{flag} {value} was accepted");
    }

    let args =
        CliArgs::try_parse_from(["cronguard", "--name", "x", "--report", "udp", "true"]).unwrap();
    assert_eq!(args.report, Some(ReportKind::Udp));
}

#[test]
fn test_local_host_is_a_single_name() {
    let host = Runner::local_host();
    assert!(!host.is_empty());
    assert!(!host.contains(char::is_whitespace), "{host:?}");
}

#[test]
fn test_canonical_host_name() {
    assert_eq!(canonical_host_name("bad\0name"), None);
    if let Some(name) = canonical_host_name("localhost") {
        assert!(name.starts_with("localhost"), "{name}");
    }
}

fn cronguard_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cronguard"));
    cmd.env_remove("CRONGUARD_LOG");
    cmd
}

#[test]
fn test_binary_prints_report_on_failure() {
    let output = cronguard_bin()
        .args([
            "--name",
            "failing",
            "--lock-type",
            "none",
            "--no-trace-split",
            "sh",
            "-c",
            "echo oops >&2; exit 3",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("job \"failing\""), "stdout: {stdout}");
    assert!(stdout.contains("oops"), "stdout: {stdout}");
}

#[test]
fn test_binary_is_silent_on_success() {
    let output = cronguard_bin()
        .args(["--name", "quiet", "--lock-type", "none", "/bin/true"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_binary_exits_would_block_when_locked() {
    let dir = tempfile::tempdir().unwrap();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut held = FileLock::open(dir.path().join("busy"), false).unwrap();
    assert!(rt.block_on(held.acquire()).unwrap());

    let output = cronguard_bin()
        .args(["--name", "busy", "--lock-dir"])
        .arg(dir.path())
        .arg("/bin/true")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(EXIT_WOULD_BLOCK));
    assert!(output.stdout.is_empty());
    rt.block_on(held.release());
}

#[test]
fn test_binary_fails_fast_on_bad_config() {
    let output = cronguard_bin()
        .args(["--name", "a/b", "/bin/true"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must not contain '/'"), "stderr: {stderr}");
}
