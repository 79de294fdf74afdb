// src/lock/file.rs

//! Node-local advisory locks.
//!
//! The lock is an exclusive `flock(2)` on `<directory>/<job name>`. It is
//! tied to the open file description, so two handles on the same path
//! exclude each other even inside one process, and the kernel drops the
//! lock if the supervisor dies.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use nix::unistd::{AccessFlags, access};
use tracing::{debug, warn};

use crate::errors::{CronguardError, Result};
use crate::lock::Lock;
use crate::types::BoxFuture;

/// Directories tried in order when none is configured.
pub const CANDIDATE_DIRS: &[&str] = &["/var/run/lock", "/var/run", "/tmp", "."];

/// Builds [`FileLock`]s inside one directory.
#[derive(Debug, Clone)]
pub struct FileLockFactory {
    directory: PathBuf,
    blocking: bool,
}

impl FileLockFactory {
    /// Use `directory`, or the first usable entry of [`CANDIDATE_DIRS`].
    ///
    /// Fails with [`CronguardError::NoLockDirectory`] if no candidate is a
    /// readable and writable directory.
    pub fn new(directory: Option<PathBuf>, blocking: bool) -> Result<Self> {
        let directory = match directory {
            Some(dir) => dir,
            None => CANDIDATE_DIRS
                .iter()
                .map(PathBuf::from)
                .find(|dir| is_usable_dir(dir))
                .ok_or(CronguardError::NoLockDirectory)?,
        };
        debug!(directory = %directory.display(), "file lock directory");
        Ok(Self {
            directory,
            blocking,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn build(&self, name: &str) -> Result<FileLock> {
        FileLock::open(self.directory.join(name), self.blocking)
    }
}

fn is_usable_dir(dir: &Path) -> bool {
    dir.is_dir() && access(dir, AccessFlags::R_OK | AccessFlags::W_OK).is_ok()
}

/// Exclusive lock on a single file.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    file: File,
    blocking: bool,
    held: bool,
}

impl FileLock {
    pub fn open(path: impl Into<PathBuf>, blocking: bool) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            blocking,
            held: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    async fn acquire_inner(&mut self) -> Result<bool> {
        if self.blocking {
            // flock blocks the calling thread; keep it off the runtime.
            let file = self.file.try_clone()?;
            tokio::task::spawn_blocking(move || file.lock_exclusive())
                .await
                .map_err(anyhow::Error::from)??;
        } else {
            match self.file.try_lock_exclusive() {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
        self.held = true;
        Ok(true)
    }
}

impl Lock for FileLock {
    fn acquire(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(self.acquire_inner())
    }

    fn release(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if !self.held {
                debug!(lock = %self, "release without a held lock; nothing to do");
                return;
            }
            if let Err(e) = FileExt::unlock(&self.file) {
                warn!(lock = %self, error = %e, "failed to unlock");
            }
            self.held = false;
        })
    }
}

impl fmt::Display for FileLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file lock {}", self.path.display())
    }
}
