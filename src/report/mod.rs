// src/report/mod.rs

//! Best-effort delivery of lifecycle records to a log collector.
//!
//! The supervisor talks to a [`Reporter`]; [`build_reporter`] picks the
//! backend from [`ReportKind`]. Delivery problems are logged and swallowed
//! inside each backend, so `record()` has no error to return and can never
//! change the outcome of a run.

pub mod null;
pub mod record;
pub mod redis;
pub mod udp;

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{RedisSettings, ReportSettings};
use crate::errors::{CronguardError, Result};
use crate::types::{BoxFuture, ReportKind};

pub use null::NullReporter;
pub use record::{Action, RECORD_TYPE, Record, Status};
pub use redis::RedisReporter;
pub use udp::UdpReporter;

/// Upper bound on a single delivery attempt.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sink for lifecycle records.
pub trait Reporter: Send + Sync {
    fn record<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, ()>;
}

/// Build the reporter selected in `settings`.
pub fn build_reporter(
    settings: &ReportSettings,
    redis: &RedisSettings,
) -> Result<Box<dyn Reporter>> {
    let reporter: Box<dyn Reporter> = match settings.kind {
        ReportKind::None => Box::new(NullReporter),
        ReportKind::Redis => Box::new(RedisReporter::new(redis, settings.key.clone())?),
        ReportKind::Udp => {
            let host = settings.udp_host.clone().ok_or_else(|| {
                CronguardError::ConfigError("--report udp requires --udp-host".to_string())
            })?;
            Box::new(UdpReporter::new(host, settings.udp_port))
        }
    };
    Ok(reporter)
}

/// Run one delivery attempt with [`DELIVERY_TIMEOUT`], logging any failure.
pub(crate) async fn deliver_best_effort<F>(backend: &str, record: &Record, attempt: F)
where
    F: Future<Output = Result<()>>,
{
    match timeout(DELIVERY_TIMEOUT, attempt).await {
        Ok(Ok(())) => {
            debug!(backend, action = ?record.action, task = %record.name, "record delivered")
        }
        Ok(Err(e)) => warn!(
            backend,
            action = ?record.action,
            task = %record.name,
            error = %e,
            "failed to deliver record"
        ),
        Err(_) => warn!(
            backend,
            action = ?record.action,
            task = %record.name,
            "timed out delivering record"
        ),
    }
}
