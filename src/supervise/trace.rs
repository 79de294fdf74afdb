// src/supervise/trace.rs

//! Separation of shell execution-trace lines from genuine stderr output.
//!
//! With `set -x` a shell prints every command it runs to stderr, prefixed
//! with `$PS4` (`+ ` by default). Nested subshells repeat the first
//! character of the prompt (`++ `, `+++ `), so the pattern accepts one or
//! more copies of it followed by the rest of the prompt, anchored at the
//! start of the line.

use std::process::Command;

use regex::bytes::Regex;
use tracing::debug;

use crate::errors::{CronguardError, Result};

/// Compiled line-prefix matcher for trace output.
#[derive(Debug, Clone)]
pub struct TracePattern {
    regex: Regex,
}

impl TracePattern {
    /// Build the pattern for a given trace prompt.
    ///
    /// Returns `Ok(None)` for an empty prompt: nothing can be classified as
    /// trace output in that case.
    pub fn from_prompt(prompt: &str) -> Result<Option<Self>> {
        let mut chars = prompt.chars();
        let Some(first) = chars.next() else {
            return Ok(None);
        };
        let remainder = chars.as_str();

        let pattern = format!(
            "^(?:{})+{}",
            regex::escape(&first.to_string()),
            regex::escape(remainder)
        );
        debug!(%pattern, "trace pattern");

        let regex = Regex::new(&pattern)
            .map_err(|e| CronguardError::ConfigError(format!("invalid trace prompt: {e}")))?;
        Ok(Some(Self { regex }))
    }

    /// Discover the trace prompt of the environment the command will run in.
    ///
    /// `$PS4` wins when exported (even if empty). Otherwise the default
    /// prompt of `/bin/sh` is used. Any failure means "no pattern".
    pub fn discover() -> Option<Self> {
        let prompt = match std::env::var("PS4") {
            Ok(ps4) => ps4,
            Err(_) => match Command::new("sh").arg("-c").arg("printf %s \"$PS4\"").output() {
                Ok(out) if out.status.success() => {
                    String::from_utf8_lossy(&out.stdout).into_owned()
                }
                Ok(out) => {
                    debug!(status = %out.status, "shell refused to report PS4");
                    return None;
                }
                Err(e) => {
                    debug!(error = %e, "unable to ask the shell for PS4");
                    return None;
                }
            },
        };

        match Self::from_prompt(&prompt) {
            Ok(pattern) => pattern,
            Err(e) => {
                debug!(error = %e, "ignoring unusable PS4");
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// True if `line` starts with the trace prompt.
    pub fn is_trace(&self, line: &[u8]) -> bool {
        self.regex.is_match(line)
    }
}

/// Captured stderr, optionally split into its trace portion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitStderr {
    pub stderr: Vec<u8>,
    /// `None` when no trace pattern was configured.
    pub trace: Option<Vec<u8>>,
}

/// Split `raw` line by line. Line terminators stay with their line, so the
/// two halves together hold exactly the bytes of `raw`.
pub fn split_stream(pattern: Option<&TracePattern>, raw: &[u8]) -> SplitStderr {
    let Some(pattern) = pattern else {
        return SplitStderr {
            stderr: raw.to_vec(),
            trace: None,
        };
    };

    let mut stderr = Vec::with_capacity(raw.len());
    let mut trace = Vec::new();

    for line in raw.split_inclusive(|b| *b == b'\n') {
        if pattern.is_trace(line) {
            trace.extend_from_slice(line);
        } else {
            stderr.extend_from_slice(line);
        }
    }

    SplitStderr {
        stderr,
        trace: Some(trace),
    }
}
