// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::supervise::{TaskState, Transition};

#[derive(Error, Debug)]
pub enum CronguardError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("failed to spawn '{cmd}': {source}")]
    SpawnError {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task '{0}' has not been started")]
    NotStarted(String),

    #[error("task '{0}' was already started")]
    AlreadyStarted(String),

    #[error("invalid transition {event:?} from state {from}")]
    InvalidTransition { from: TaskState, event: Transition },

    #[error("unable to find a writable lock directory; pass --lock-dir")]
    NoLockDirectory,

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("signal delivery failed: {0}")]
    SignalError(#[from] nix::errno::Errno),

    #[error("JSON encoding error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CronguardError>;
