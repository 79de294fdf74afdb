// src/lock/noop.rs

use std::fmt;

use crate::errors::{CronguardError, Result};
use crate::lock::Lock;
use crate::types::BoxFuture;

/// Lock that is always available. Used with `--lock-type none`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLock;

impl Lock for NoOpLock {
    fn acquire(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async { Ok::<_, CronguardError>(true) })
    }

    fn release(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

impl fmt::Display for NoOpLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no-op lock")
    }
}
