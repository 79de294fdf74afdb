// src/engine/runner.rs

use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::report::{Record, Reporter, Status};
use crate::supervise::SupervisedTask;

use super::{RunOptions, RunReport};

/// Drives a single task and reports around it.
///
/// Record order is always one `STARTED` after a successful spawn, then one
/// `STOPPED` once exit has been observed, or once the task was aborted
/// because supervision failed. A spawn failure returns before anything is
/// reported.
pub struct Runner<'r> {
    reporter: &'r dyn Reporter,
    host: String,
    options: RunOptions,
}

impl fmt::Debug for Runner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("host", &self.host)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'r> Runner<'r> {
    pub fn new(reporter: &'r dyn Reporter, host: impl Into<String>, options: RunOptions) -> Self {
        Self {
            reporter,
            host: host.into(),
            options,
        }
    }

    /// Fully-qualified name of this host as reported in every record.
    ///
    /// The short `gethostname` name is used when the resolver has no
    /// canonical name for it, and `localhost` when even that fails.
    pub fn local_host() -> String {
        let short = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                warn!(error = %e, "unable to read host name");
                return "localhost".to_string();
            }
        };
        match canonical_host_name(&short) {
            Some(fqdn) => fqdn,
            None => {
                debug!(host = %short, "no canonical name; using short host name");
                short
            }
        }
    }

    /// Start `task`, supervise it until exit, classify and report.
    ///
    /// If supervision fails after the spawn, the process group is killed
    /// and a `STOPPED`/`ERROR` record is sent before the error is returned,
    /// so the caller never releases its lock under a live child.
    pub async fn run(&self, task: &mut SupervisedTask) -> Result<RunReport> {
        task.start()?;
        self.reporter
            .record(&Record::started(task, &self.host))
            .await;

        match self.supervise(task).await {
            Ok(report) => {
                let record =
                    Record::stopped(task, &self.host, report.status, report.context.clone());
                self.reporter.record(&record).await;
                Ok(report)
            }
            Err(e) => {
                error!(task = %task.name(), error = %e, "supervision failed; aborting task");
                task.abort().await;
                let context = task.build_context().ok();
                let record = Record::aborted(task, &self.host, context);
                self.reporter.record(&record).await;
                Err(e)
            }
        }
    }

    async fn supervise(&self, task: &mut SupervisedTask) -> Result<RunReport> {
        while task.supervise()? {
            sleep(self.options.poll_interval).await;
        }
        debug!(task = %task.name(), state = %task.state(), "supervision loop finished");

        let context = task.build_context()?;
        let (status, error_message) = if task.in_exceptional_state() {
            (Status::Error, Some(task.build_error_message(&context)))
        } else {
            (Status::Ok, None)
        };
        info!(
            task = %task.name(),
            status = ?status,
            return_code = ?task.return_code(),
            run_time = ?task.run_time(),
            "task finished"
        );

        Ok(RunReport {
            status,
            return_code: task.return_code(),
            error_message,
            context,
        })
    }
}

/// Canonical name of `host` according to the system resolver
/// (`getaddrinfo` with `AI_CANONNAME`).
pub fn canonical_host_name(host: &str) -> Option<String> {
    let node = CString::new(host).ok()?;
    // SAFETY: an all-zero addrinfo is the documented "no hints" value.
    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_flags = libc::AI_CANONNAME;

    let mut res: *mut libc::addrinfo = ptr::null_mut();
    let rc = unsafe { libc::getaddrinfo(node.as_ptr(), ptr::null(), &hints, &mut res) };
    if rc != 0 || res.is_null() {
        return None;
    }

    // SAFETY: `res` is a valid list returned by getaddrinfo until freed below.
    let name = unsafe {
        let canon = (*res).ai_canonname;
        (!canon.is_null()).then(|| CStr::from_ptr(canon).to_string_lossy().into_owned())
    };
    unsafe { libc::freeaddrinfo(res) };

    name.filter(|n| !n.is_empty())
}
