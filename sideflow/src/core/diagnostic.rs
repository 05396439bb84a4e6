//! Diagnostic entries recorded while a task runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, shown on success.
    Info,
    /// Error detail attached when a stage fails.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Message text; may span several lines.
    pub text: String,
    /// Message severity.
    pub severity: Severity,
    /// When the message was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Diagnostic {
    /// Creates a diagnostic stamped with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
            recorded_at: Utc::now(),
        }
    }

    /// Creates an informational diagnostic.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Info)
    }

    /// Creates an error diagnostic.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Error)
    }

    /// Returns true for error entries.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_constructors() {
        let info = Diagnostic::info("Patched 12 files");
        assert_eq!(info.severity, Severity::Info);
        assert!(!info.is_error());

        let error = Diagnostic::error("Patching failed!");
        assert!(error.is_error());
    }

    #[test]
    fn test_severity_serialize() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), r#""error""#);
    }
}
