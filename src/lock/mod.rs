// src/lock/mod.rs

//! Mutual exclusion between runs of the same job.
//!
//! Every backend implements [`Lock`]; [`build_lock`] picks one from
//! [`LockKind`]. Callers should go through [`with_lock`], which guarantees
//! `release()` runs on every exit path of the guarded future.
//!
//! - [`noop`]: always succeeds.
//! - [`file`]: `flock(2)` on a node-local file named after the job.
//! - [`redis`]: `SET NX` key shared by every host talking to the same redis.

pub mod file;
pub mod noop;
pub mod redis;

use std::fmt;
use std::future::Future;

use tracing::{debug, info};

use crate::config::{LockSettings, RedisSettings};
use crate::errors::Result;
use crate::types::{BoxFuture, LockKind};

pub use file::{FileLock, FileLockFactory};
pub use noop::NoOpLock;
pub use redis::{RedisLock, RedisLockFactory};

/// A named mutual-exclusion handle.
///
/// Contract shared by all backends:
/// - `acquire()` resolves to `Ok(false)` on contention in non-blocking mode;
///   errors are reserved for broken backends (unreachable redis, IO).
/// - `release()` never fails and is safe after a failed or skipped
///   `acquire()`.
pub trait Lock: Send + fmt::Display {
    fn acquire(&mut self) -> BoxFuture<'_, Result<bool>>;

    fn release(&mut self) -> BoxFuture<'_, ()>;
}

/// Result of running a future under a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome<T> {
    /// The lock was acquired and the body ran to completion.
    Ran(T),
    /// The lock is held elsewhere and the body was not started.
    WouldBlock,
}

/// Acquire `lock`, drive `body` if acquired, then always release.
///
/// `body` is only polled after a successful acquisition. Release runs after
/// success, after a body error and after an acquisition error alike.
pub async fn with_lock<T, F>(lock: &mut dyn Lock, body: F) -> Result<LockOutcome<T>>
where
    F: Future<Output = Result<T>>,
{
    let outcome = match lock.acquire().await {
        Ok(true) => {
            debug!(lock = %lock, "lock acquired");
            body.await.map(LockOutcome::Ran)
        }
        Ok(false) => {
            info!(lock = %lock, "lock is held elsewhere; skipping run");
            Ok(LockOutcome::WouldBlock)
        }
        Err(e) => Err(e),
    };

    lock.release().await;
    debug!(lock = %lock, "lock released");
    outcome
}

/// Build the lock for job `name` from resolved settings.
pub fn build_lock(
    settings: &LockSettings,
    redis: &RedisSettings,
    name: &str,
) -> Result<Box<dyn Lock>> {
    let lock: Box<dyn Lock> = match settings.kind {
        LockKind::None => Box::new(NoOpLock),
        LockKind::File => {
            let factory = FileLockFactory::new(settings.directory.clone(), settings.blocking)?;
            Box::new(factory.build(name)?)
        }
        LockKind::Redis => {
            let client = ::redis::Client::open(redis.url())?;
            let factory = RedisLockFactory::new(
                client,
                settings.prefix.clone(),
                settings.lease,
                settings.sleep,
                settings.blocking,
            );
            Box::new(factory.build(name))
        }
    };

    debug!(lock = %lock, blocking = settings.blocking, "lock built");
    Ok(lock)
}
