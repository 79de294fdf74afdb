// src/supervise/task.rs

//! A single supervised command invocation.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use chrono::{DateTime, Utc};
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{CronguardError, Result};
use crate::supervise::context::TaskContext;
use crate::supervise::state::{TaskState, Transition, is_exceptional};
use crate::supervise::template::ErrorTemplate;
use crate::supervise::timeline::Timeline;
use crate::supervise::trace::{SplitStderr, TracePattern, split_stream};

/// How long [`SupervisedTask::abort`] waits for the killed child to exit.
const ABORT_WAIT: Duration = Duration::from_secs(5);

/// Optional knobs for a [`SupervisedTask`].
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Wall-clock limit; `None` means the task may run forever.
    pub timeout: Option<Duration>,
    /// Layout of the failure report.
    pub template: ErrorTemplate,
    /// Classifier for shell trace lines on stderr; `None` disables splitting.
    pub trace_pattern: Option<TracePattern>,
}

/// One external command run under supervision.
///
/// The caller drives the task: [`start`](Self::start) once, then
/// [`supervise`](Self::supervise) on a fixed cadence until it returns
/// `false`, then [`build_context`](Self::build_context) to collect output.
///
/// stdout and stderr go to anonymous temporary files owned by the task,
/// so a chatty child can never block on a full pipe.
#[derive(Debug)]
pub struct SupervisedTask {
    id: Uuid,
    name: String,
    cmd: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    template: ErrorTemplate,
    trace_pattern: Option<TracePattern>,

    state: TaskState,
    child: Option<Child>,
    pid: Option<u32>,
    return_code: Option<i32>,
    start_time: Option<DateTime<Utc>>,
    stop_time: Option<DateTime<Utc>>,
    timeline: Timeline,

    stdout: File,
    stderr: File,
}

impl SupervisedTask {
    pub fn new(
        name: impl Into<String>,
        cmd: impl Into<String>,
        args: Vec<String>,
        options: TaskOptions,
    ) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            cmd: cmd.into(),
            args,
            timeout: options.timeout,
            template: options.template,
            trace_pattern: options.trace_pattern,
            state: TaskState::Initial,
            child: None,
            pid: None,
            return_code: None,
            start_time: None,
            stop_time: None,
            timeline: Timeline::new(),
            stdout: tempfile::tempfile()?,
            stderr: tempfile::tempfile()?,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Return code once exit has been observed; `-N` for death by signal N.
    pub fn return_code(&self) -> Option<i32> {
        self.return_code
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.stop_time
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn trace_pattern(&self) -> Option<&TracePattern> {
        self.trace_pattern.as_ref()
    }

    /// Spawn the command in its own process group with output captured.
    ///
    /// A missing or non-executable command is returned as
    /// [`CronguardError::SpawnError`]; it is never retried.
    pub fn start(&mut self) -> Result<()> {
        if self.state != TaskState::Initial || self.child.is_some() {
            return Err(CronguardError::AlreadyStarted(self.name.clone()));
        }
        debug!(task = %self.name, cmd = %self.cmd, args = ?self.args, "starting task");

        let mut command = Command::new(&self.cmd);
        command
            .args(&self.args)
            .stdout(Stdio::from(self.stdout.try_clone()?))
            .stderr(Stdio::from(self.stderr.try_clone()?))
            .process_group(0);

        self.start_time = Some(Utc::now());
        let child = command.spawn().map_err(|source| CronguardError::SpawnError {
            cmd: self.cmd.clone(),
            source,
        })?;

        self.pid = child.id();
        self.child = Some(child);
        let pid = self
            .pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        self.timeline.push(format!("task started (PID {pid})"));
        self.apply(Transition::Spawned)?;

        info!(task = %self.name, pid = %pid, "task started");
        Ok(())
    }

    /// Non-blocking exit check. Only the first observed exit records the
    /// stop time; later calls return the cached code.
    pub fn poll(&mut self) -> Result<Option<i32>> {
        if let Some(code) = self.return_code {
            return Ok(Some(code));
        }

        let child = self
            .child
            .as_mut()
            .ok_or_else(|| CronguardError::NotStarted(self.name.clone()))?;

        debug!(task = %self.name, state = %self.state, "polling task");
        let Some(status) = child.try_wait()? else {
            return Ok(None);
        };

        Ok(Some(self.observe_exit(status)))
    }

    fn observe_exit(&mut self, status: ExitStatus) -> i32 {
        let code = return_code_of(status);
        self.return_code = Some(code);
        self.stop_time = Some(Utc::now());
        self.timeline.push(format!("task stopped (return code {code})"));
        info!(task = %self.name, return_code = code, state = %self.state, "task stopped");
        code
    }

    /// True until an exit has been observed by [`poll`](Self::poll).
    pub fn is_alive(&self) -> bool {
        self.return_code.is_none()
    }

    /// Start to now while running, start to stop once exited.
    pub fn run_time(&self) -> Option<Duration> {
        let start = self.start_time?;
        let end = self.stop_time.unwrap_or_else(Utc::now);
        Some((end - start).to_std().unwrap_or(Duration::ZERO))
    }

    /// Check the timeout, moving `STARTED` to `TIMEDOUT` on first crossing.
    ///
    /// Sticky: once any timeout-driven state has been entered this returns
    /// `true` without looking at the clock again.
    pub fn timed_out(&mut self) -> bool {
        if self.state.past_timeout() {
            return true;
        }

        let (Some(timeout), Some(run_time)) = (self.timeout, self.run_time()) else {
            return false;
        };
        if run_time <= timeout {
            return false;
        }

        match self.state.next(Transition::TimeoutObserved) {
            Some(next) => {
                warn!(
                    task = %self.name,
                    run_time = run_time.as_secs_f64(),
                    timeout = timeout.as_secs_f64(),
                    "task timed out"
                );
                self.state = next;
                self.timeline.push("timed out");
                true
            }
            None => false,
        }
    }

    /// One supervision tick: observe exit, then escalate if the timeout has
    /// been crossed. Returns whether the process is still alive.
    ///
    /// The first tick past the timeout sends SIGTERM to the process group.
    /// A later tick that still finds it alive sends SIGKILL, once.
    pub fn supervise(&mut self) -> Result<bool> {
        self.poll()?;

        if self.is_alive() && self.timed_out() {
            match self.state {
                TaskState::Terminated => self.kill()?,
                TaskState::Killed => {
                    debug!(task = %self.name, "SIGKILL already sent; waiting for exit")
                }
                _ => self.terminate()?,
            }
        }

        Ok(self.is_alive())
    }

    /// Ask the whole process group to stop (SIGTERM).
    pub fn terminate(&mut self) -> Result<()> {
        let pid = self.signal_target()?;
        self.apply(Transition::TerminateSent)?;
        self.timeline.push("graceful termination (SIGTERM)");
        info!(task = %self.name, pid, "terminating task");
        self.signal_group(pid, Signal::SIGTERM)
    }

    /// Kill the whole process group (SIGKILL).
    pub fn kill(&mut self) -> Result<()> {
        let pid = self.signal_target()?;
        self.apply(Transition::KillSent)?;
        self.timeline.push("forceful kill (SIGKILL)");
        warn!(task = %self.name, pid, "killing task");
        self.signal_group(pid, Signal::SIGKILL)
    }

    /// Kill the process group and wait (bounded) for the exit to be reaped.
    ///
    /// Used when supervision itself fails: the child must not outlive the
    /// run that holds its lock. A no-op once exit has been observed.
    pub async fn abort(&mut self) {
        if !self.is_alive() {
            return;
        }
        let Some(pid) = self.pid else {
            return;
        };

        if let Some(next) = self.state.next(Transition::KillSent) {
            self.state = next;
        }
        self.timeline.push("aborted (SIGKILL)");
        warn!(task = %self.name, pid, "aborting task");
        if let Err(e) = self.signal_group(pid, Signal::SIGKILL) {
            warn!(task = %self.name, pid, error = %e, "failed to kill process group");
        }

        let Some(child) = self.child.as_mut() else {
            return;
        };
        let waited = tokio::time::timeout(ABORT_WAIT, child.wait()).await;
        match waited {
            Ok(Ok(status)) => {
                self.observe_exit(status);
            }
            Ok(Err(e)) => warn!(task = %self.name, error = %e, "failed to reap aborted task"),
            Err(_) => warn!(task = %self.name, pid, "aborted task did not exit in time"),
        }
    }

    /// Captured stderr, split into genuine output and shell trace lines.
    pub fn split_stderr(&self) -> Result<SplitStderr> {
        let raw = read_all(&self.stderr)?;
        Ok(split_stream(self.trace_pattern.as_ref(), &raw))
    }

    pub fn format_timeline(&self) -> String {
        self.timeline.format()
    }

    /// Snapshot of command, timing, return code and classified output.
    /// Safe to call repeatedly; the capture files are rewound each time.
    pub fn build_context(&self) -> Result<TaskContext> {
        let stdout = read_all(&self.stdout)?;
        let split = self.split_stderr()?;

        let ctx = TaskContext {
            name: self.name.clone(),
            cmd: self.cmd.clone(),
            args: self.args.clone(),
            return_code: self.return_code,
            start_time: self.start_time,
            stop_time: self.stop_time,
            run_time: self.run_time(),
            timeout: self.timeout,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&split.stderr).into_owned(),
            trace: split
                .trace
                .map(|t| String::from_utf8_lossy(&t).into_owned()),
        };
        debug!(task = %self.name, context = ?ctx, "task context");
        Ok(ctx)
    }

    /// Render the failure report for `ctx` with this task's timeline.
    pub fn build_error_message(&self, ctx: &TaskContext) -> String {
        let mut values = ctx.template_values();
        values.insert("timeline", self.format_timeline());
        self.template.render(&values)
    }

    /// Sole success/failure classification: `TIMEDOUT`, or a non-zero
    /// return code.
    pub fn in_exceptional_state(&self) -> bool {
        is_exceptional(self.state, self.return_code)
    }

    fn apply(&mut self, event: Transition) -> Result<()> {
        let next = self
            .state
            .next(event)
            .ok_or(CronguardError::InvalidTransition {
                from: self.state,
                event,
            })?;
        debug!(task = %self.name, from = %self.state, to = %next, "state transition");
        self.state = next;
        Ok(())
    }

    fn signal_target(&self) -> Result<u32> {
        self.pid
            .ok_or_else(|| CronguardError::NotStarted(self.name.clone()))
    }

    fn signal_group(&self, pid: u32, signal: Signal) -> Result<()> {
        match killpg(Pid::from_raw(pid as i32), signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!(task = %self.name, pid, signal = ?signal, "process group already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// A started task never outlives its handle: whatever is still running in
/// the process group is killed.
impl Drop for SupervisedTask {
    fn drop(&mut self) {
        if !self.is_alive() || self.child.is_none() {
            return;
        }
        let Some(pid) = self.pid else {
            return;
        };
        warn!(task = %self.name, pid, "task dropped while running; killing process group");
        if let Err(e) = self.signal_group(pid, Signal::SIGKILL) {
            warn!(task = %self.name, pid, error = %e, "failed to kill process group");
        }
    }
}

impl fmt::Display for SupervisedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task '{}' ({}, {})", self.name, self.cmd, self.state)
    }
}

fn return_code_of(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

fn read_all(file: &File) -> std::io::Result<Vec<u8>> {
    let mut file = file;
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
