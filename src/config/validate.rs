// src/config/validate.rs

use std::time::Duration;

use crate::config::settings::Settings;
use crate::errors::{CronguardError, Result};
use crate::types::{LockKind, ReportKind};

/// Reject settings that would only fail later, mid-run.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_name(&settings.name)?;
    validate_task(settings)?;
    validate_lock(settings)?;
    validate_report(settings)?;
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CronguardError::ConfigError(
            "--name must not be empty".to_string(),
        ));
    }
    // The name doubles as a lock file name.
    if name.contains('/') || name == "." || name == ".." {
        return Err(CronguardError::ConfigError(format!(
            "job name '{}' must not contain '/' or be '.' / '..'",
            name
        )));
    }
    Ok(())
}

fn validate_task(settings: &Settings) -> Result<()> {
    if settings.cmd.trim().is_empty() {
        return Err(CronguardError::ConfigError(
            "command must not be empty".to_string(),
        ));
    }
    if settings.task.poll_interval == Duration::ZERO {
        return Err(CronguardError::ConfigError(
            "[task].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_lock(settings: &Settings) -> Result<()> {
    if settings.lock.kind != LockKind::Redis {
        return Ok(());
    }
    if settings.lock.sleep == Duration::ZERO {
        return Err(CronguardError::ConfigError(
            "redis lock sleep must be >= 1ms (got 0)".to_string(),
        ));
    }
    if settings.lock.lease == Some(Duration::ZERO) {
        return Err(CronguardError::ConfigError(
            "redis lock lease must be >= 1s (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_report(settings: &Settings) -> Result<()> {
    if settings.report.kind == ReportKind::Udp {
        let has_host = settings
            .report
            .udp_host
            .as_deref()
            .is_some_and(|h| !h.trim().is_empty());
        if !has_host {
            return Err(CronguardError::ConfigError(
                "--report udp requires --udp-host".to_string(),
            ));
        }
    }
    if settings.report.kind == ReportKind::Redis && settings.report.key.trim().is_empty() {
        return Err(CronguardError::ConfigError(
            "--redis-key must not be empty".to_string(),
        ));
    }
    Ok(())
}
