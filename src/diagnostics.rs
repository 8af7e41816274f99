//! Non-fatal findings collected during a run.
//!
//! Everything recorded here is also logged through `tracing`; the collector
//! exists so callers can inspect and report the outcome programmatically.

use crate::error::SchemaGenError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub type_id: Option<String>,
    pub path: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(type_id) = &self.type_id {
            write!(f, " [{type_id}]")?;
        }
        if let Some(path) = &self.path {
            write!(f, " at {path}")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn info<S: Into<String>>(&mut self, type_id: Option<&str>, message: S) {
        let message = message.into();
        tracing::info!("{}", message);
        self.push(Diagnostic {
            severity: Severity::Info,
            type_id: type_id.map(str::to_string),
            path: None,
            message,
        });
    }

    pub fn warning<S: Into<String>>(&mut self, type_id: Option<&str>, message: S) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.push(Diagnostic {
            severity: Severity::Warning,
            type_id: type_id.map(str::to_string),
            path: None,
            message,
        });
    }

    /// Record an error that was recovered from.
    pub fn error(&mut self, type_id: Option<&str>, error: &SchemaGenError) {
        tracing::error!("{}", error);
        self.push(Diagnostic {
            severity: Severity::Error,
            type_id: type_id.map(str::to_string),
            path: error.path().map(str::to_string),
            message: error.to_string(),
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn for_type<'a>(&'a self, type_id: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries
            .iter()
            .filter(move |d| d.type_id.as_deref() == Some(type_id))
    }
}
