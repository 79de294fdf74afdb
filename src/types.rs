use std::future::Future;
use std::pin::Pin;

use clap::ValueEnum;
use serde::Deserialize;

/// Boxed, `Send` future returned by the dyn-compatible lock and reporter traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backing mechanism used to serialize runs of the same job.
///
/// - `None`: no mutual exclusion at all.
/// - `File`: advisory lock on a node-local file named after the job
///   (default behaviour).
/// - `Redis`: lock key in a shared redis instance, so several hosts running
///   the same job serialize correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    None,
    File,
    Redis,
}

impl Default for LockKind {
    fn default() -> Self {
        LockKind::File
    }
}

/// Where lifecycle records are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Drop records on the floor.
    None,
    /// `LPUSH` onto a list key, drained by a log shipper.
    Redis,
    /// Fire-and-forget JSON datagram.
    Udp,
}

impl Default for ReportKind {
    fn default() -> Self {
        ReportKind::None
    }
}
