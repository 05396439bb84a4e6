//! The context a stage action runs with.

use super::ProgressTracker;
use crate::core::{Diagnostic, SideId};
use crate::events::{DiagnosticsSink, EventSink};
use crate::task::StagedTask;

/// Receiver of 0..=100 progress values from a nested task.
pub trait ProgressSink {
    /// Reports the nested task's combined progress.
    fn report_progress(&self, percent: u8);
}

/// Context available to a stage action while it runs.
///
/// Lets the action push sub-progress for its own stage, record diagnostics,
/// emit events and run whole child tasks whose progress is folded into the
/// current stage.
pub struct StageContext<'a> {
    tracker: &'a ProgressTracker,
    diagnostics: &'a DiagnosticsSink,
    events: &'a dyn EventSink,
    index: usize,
    parent: Option<&'a dyn ProgressSink>,
}

impl<'a> StageContext<'a> {
    pub(crate) fn new(
        tracker: &'a ProgressTracker,
        diagnostics: &'a DiagnosticsSink,
        events: &'a dyn EventSink,
        index: usize,
        parent: Option<&'a dyn ProgressSink>,
    ) -> Self {
        Self {
            tracker,
            diagnostics,
            events,
            index,
            parent,
        }
    }

    /// Returns the name of the running task.
    #[must_use]
    pub fn task_name(&self) -> &str {
        self.tracker.task()
    }

    /// Returns the side the task is bound to.
    #[must_use]
    pub fn side(&self) -> Option<SideId> {
        self.tracker.side()
    }

    /// Returns the index of the running stage.
    #[must_use]
    pub fn stage_index(&self) -> usize {
        self.index
    }

    /// Returns the label of the running stage.
    #[must_use]
    pub fn stage_label(&self) -> &str {
        self.tracker.layout().label(self.index).unwrap_or_default()
    }

    /// Reports fine-grained progress (0..=100) within the running stage.
    ///
    /// Values lower than one already reported are ignored.
    pub fn set_progress(&self, percent: u8) {
        self.tracker.raise_sub_progress(percent);
        self.forward();
    }

    /// Returns the combined progress of the running task.
    #[must_use]
    pub fn task_progress(&self) -> u8 {
        self.tracker.progress()
    }

    /// Records an informational diagnostic.
    pub fn info(&self, text: impl Into<String>) {
        self.diagnostics.push(Diagnostic::info(text));
    }

    /// Records an error diagnostic.
    pub fn error(&self, text: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(text));
    }

    /// Returns the task's diagnostics sink.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticsSink {
        self.diagnostics
    }

    /// Emits an event through the task's event sink.
    pub fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.try_emit(event_type, data);
    }

    /// Runs a child task inline, folding its 0..=100 progress into this
    /// stage's sub-progress.
    ///
    /// Give the stage a sub-range to place the child's progress inside a
    /// specific window of the parent. The child's diagnostics are appended to
    /// this task's sink once it finishes, whether it succeeded or not.
    pub fn run_child(&self, mut child: StagedTask) -> anyhow::Result<()> {
        let result = child.run_nested(self);
        self.diagnostics.extend(child.diagnostics().take_all());
        result.map_err(anyhow::Error::from)
    }

    fn forward(&self) {
        if let Some(parent) = self.parent {
            parent.report_progress(self.tracker.progress());
        }
    }
}

impl ProgressSink for StageContext<'_> {
    fn report_progress(&self, percent: u8) {
        self.set_progress(percent);
    }
}

impl std::fmt::Debug for StageContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("task", &self.task_name())
            .field("side", &self.side())
            .field("index", &self.index)
            .field("label", &self.stage_label())
            .finish()
    }
}
