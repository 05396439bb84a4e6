//! Per-task diagnostics log.

use crate::core::{Diagnostic, Severity};
use parking_lot::RwLock;

/// Append-only, ordered list of diagnostics for one task.
///
/// Entries are appended by the thread running the task and drained by the
/// caller once the task is terminal.
#[derive(Debug, Default)]
pub struct DiagnosticsSink {
    entries: RwLock<Vec<Diagnostic>>,
}

impl DiagnosticsSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.write().push(diagnostic);
    }

    /// Appends several entries, keeping their order.
    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries.write().extend(diagnostics);
    }

    /// Returns a copy of every entry in arrival order.
    #[must_use]
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.read().clone()
    }

    /// Returns the texts of entries with the given severity.
    #[must_use]
    pub fn texts(&self, severity: Severity) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.severity == severity)
            .map(|entry| entry.text.clone())
            .collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns true if any error entry has been recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.read().iter().any(Diagnostic::is_error)
    }

    /// Removes and returns every entry.
    ///
    /// Callers go through [`StagedTask::drain_diagnostics`], which refuses to
    /// drain a task that is still running.
    ///
    /// [`StagedTask::drain_diagnostics`]: crate::task::StagedTask::drain_diagnostics
    pub(crate) fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_keeps_arrival_order() {
        let sink = DiagnosticsSink::new();
        sink.push(Diagnostic::info("first"));
        sink.push(Diagnostic::error("second"));
        sink.extend([Diagnostic::info("third")]);

        let texts: Vec<_> = sink.entries().into_iter().map(|d| d.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert!(sink.has_errors());
    }

    #[test]
    fn test_sink_filters_by_severity() {
        let sink = DiagnosticsSink::new();
        sink.push(Diagnostic::info("patched"));
        sink.push(Diagnostic::error("failed"));

        assert_eq!(sink.texts(Severity::Info), vec!["patched".to_string()]);
        assert_eq!(sink.texts(Severity::Error), vec!["failed".to_string()]);
    }

    #[test]
    fn test_take_all_clears() {
        let sink = DiagnosticsSink::new();
        sink.push(Diagnostic::info("one"));
        assert_eq!(sink.take_all().len(), 1);
        assert!(sink.is_empty());
    }
}
