// src/config/mod.rs

//! Configuration for cronguard.
//!
//! Responsibilities:
//! - Define the optional TOML defaults file (`model.rs`).
//! - Merge it with CLI flags into one [`Settings`] value (`settings.rs`).
//! - Load the file from disk (`loader.rs`).
//! - Validate the merged result (`validate.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{load_from_path, load_settings};
pub use model::{FileConfig, LockSection, RedisSection, ReportSection, TaskSection};
pub use settings::{
    DEFAULT_POLL_INTERVAL, LockSettings, RedisSettings, ReportSettings, Settings, TaskSettings,
    TraceMode,
};
pub use validate::validate_settings;
