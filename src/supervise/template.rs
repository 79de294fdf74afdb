// src/supervise/template.rs

//! Minimal `$name` / `${name}` text templates for failure reports.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{CronguardError, Result};

/// Built-in report layout.
pub const DEFAULT_TEMPLATE: &str = include_str!("error-template.txt");

/// Every placeholder a template may reference.
pub const FIELDS: &[&str] = &[
    "name",
    "cmd",
    "args",
    "return_code",
    "start_time",
    "stop_time",
    "run_time",
    "timeout",
    "stdout",
    "stderr",
    "trace",
    "timeline",
];

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))",
        )
        .expect("placeholder regex is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed template. Placeholders are checked against [`FIELDS`] up front,
/// so rendering cannot fail.
#[derive(Debug, Clone)]
pub struct ErrorTemplate {
    segments: Vec<Segment>,
}

impl ErrorTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(source) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            literal.push_str(&source[last..whole.start]);
            last = whole.end;

            if caps.name("escaped").is_some() {
                literal.push('$');
                continue;
            }

            let name = caps.name("named").or_else(|| caps.name("braced"));
            let Some(name) = name else {
                let (line, col) = line_col(source, whole.start);
                return Err(CronguardError::TemplateError(format!(
                    "invalid placeholder in line {line}, col {col}"
                )));
            };

            if !FIELDS.contains(&name.as_str()) {
                return Err(CronguardError::TemplateError(format!(
                    "unknown placeholder '${}' (known: {})",
                    name.as_str(),
                    FIELDS.join(", ")
                )));
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field(name.as_str().to_string()));
        }

        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        Self::parse(&source)
    }

    /// Substitute `values`; fields without a value render as empty text.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    if let Some(value) = values.get(name.as_str()) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

impl Default for ErrorTemplate {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE).expect("built-in template is valid")
    }
}

fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let col = before.rfind('\n').map(|i| offset - i).unwrap_or(offset + 1);
    (line, col)
}
