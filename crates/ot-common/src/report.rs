//! Error records and the reporting channel for validation advisories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::{error, warn};

/// Severity attached to a reported settings error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// An advisory validation error scoped to a single field.
///
/// Advisory: the offending value has already been coerced to a safe
/// fallback by the time the record exists; it only feeds the reporting
/// channel and never blocks persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable machine-readable code, e.g. `invalid_hex`.
    pub code: String,
    /// Field id the error is scoped to.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    pub fn new(
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Destination for reported settings errors.
pub trait ErrorSink: Send + Sync {
    fn report(&self, scope: &str, code: &str, message: &str, severity: Severity);
}

/// Sink that forwards reports to the active `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, scope: &str, code: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(scope, code, "{message}"),
            Severity::Warning => warn!(scope, code, "{message}"),
        }
    }
}

/// A report captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub scope: String,
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

/// Sink that records reports for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().expect("sink lock").clone()
    }

    /// Drain and return everything reported so far.
    pub fn take(&self) -> Vec<Report> {
        std::mem::take(&mut *self.reports.lock().expect("sink lock"))
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().expect("sink lock").is_empty()
    }
}

impl ErrorSink for MemorySink {
    fn report(&self, scope: &str, code: &str, message: &str, severity: Severity) {
        self.reports.lock().expect("sink lock").push(Report {
            scope: scope.to_string(),
            code: code.to_string(),
            message: message.to_string(),
            severity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn test_memory_sink_records() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.report("option-tree", "invalid_hex", "bad color", Severity::Error);
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].scope, "option-tree");
        assert_eq!(reports[0].code, "invalid_hex");
        assert_eq!(reports[0].severity, Severity::Error);
    }

    #[test]
    fn test_memory_sink_take_drains() {
        let sink = MemorySink::new();
        sink.report("s", "c", "m", Severity::Warning);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }
}
