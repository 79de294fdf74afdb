// src/report/null.rs

use tracing::debug;

use crate::report::{Record, Reporter};
use crate::types::BoxFuture;

/// Discards every record. Used with `--report none`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn record<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            debug!(action = ?record.action, status = ?record.status, "reporting disabled; dropping record");
        })
    }
}
