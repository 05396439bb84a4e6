//! Staged tasks: an ordered list of stages run to completion or first failure.

mod builder;

pub use builder::StagedTaskBuilder;

use crate::context::{ProgressSink, ProgressSnapshot, ProgressTracker, StageContext};
use crate::core::{Diagnostic, SideId, TaskPhase, TaskState};
use crate::errors::{StageError, TaskError};
use crate::events::{DiagnosticsSink, EventSink};
use crate::observability::{SpanTimer, StageSpanAttributes};
use crate::stages::{Stage, StageLayout};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A single-use runner for a fixed sequence of stages.
///
/// `run()` executes the stages in order on the calling thread and stops at the
/// first failure. Progress is published through a shared [`ProgressTracker`]
/// so other threads can observe it without touching the task itself. A task
/// that reached a terminal state refuses to run again; build a fresh one to
/// retry.
pub struct StagedTask {
    name: String,
    stages: Vec<Stage>,
    tracker: Arc<ProgressTracker>,
    diagnostics: DiagnosticsSink,
    events: Arc<dyn EventSink>,
    failure: Option<(usize, String)>,
}

impl StagedTask {
    /// Starts building a task.
    pub fn builder(name: impl Into<String>) -> StagedTaskBuilder {
        StagedTaskBuilder::new(name)
    }

    /// Creates a task from stages, resolving their progress floors.
    pub fn new(
        name: impl Into<String>,
        side: Option<SideId>,
        stages: Vec<Stage>,
    ) -> Result<Self, TaskError> {
        let mut builder = StagedTaskBuilder::new(name).stages(stages);
        if let Some(side) = side {
            builder = builder.side(side);
        }
        builder.build()
    }

    pub(crate) fn from_parts(
        name: String,
        side: Option<SideId>,
        stages: Vec<Stage>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, TaskError> {
        let layout = StageLayout::resolve(&stages)?;
        let tracker = Arc::new(ProgressTracker::new(name.clone(), side, layout));
        Ok(Self {
            name,
            stages,
            tracker,
            diagnostics: DiagnosticsSink::new(),
            events,
            failure: None,
        })
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the side this task is bound to.
    #[must_use]
    pub fn side(&self) -> Option<SideId> {
        self.tracker.side()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.tracker.layout().len()
    }

    /// Returns the resolved stage layout.
    #[must_use]
    pub fn layout(&self) -> &StageLayout {
        self.tracker.layout()
    }

    /// Returns a handle to the shared progress tracker.
    #[must_use]
    pub fn tracker(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.tracker)
    }

    /// Returns the combined 0..=100 progress.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.tracker.progress()
    }

    /// Returns the current stage index (see [`ProgressTracker::current_index`]).
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.tracker.current_index()
    }

    /// Returns a progress snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tracker.snapshot()
    }

    /// Returns the task state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        match self.tracker.phase() {
            TaskPhase::NotStarted => TaskState::NotStarted,
            TaskPhase::Running => TaskState::Running {
                index: self.current_index().unwrap_or_default(),
            },
            TaskPhase::Completed => TaskState::Completed,
            TaskPhase::Failed => {
                let (index, message) = self.failure.clone().unwrap_or_default();
                TaskState::Failed { index, message }
            }
        }
    }

    /// Returns the diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticsSink {
        &self.diagnostics
    }

    /// Reads and clears the diagnostics of a finished run.
    ///
    /// Fails while the task is running so a live run never loses messages.
    pub fn drain_diagnostics(&self) -> Result<Vec<Diagnostic>, TaskError> {
        if self.tracker.phase() == TaskPhase::Running {
            return Err(TaskError::StillRunning {
                task: self.name.clone(),
            });
        }
        Ok(self.diagnostics.take_all())
    }

    /// Runs every stage in order, stopping at the first failure.
    pub fn run(&mut self) -> Result<(), TaskError> {
        self.execute(None)
    }

    pub(crate) fn run_nested(&mut self, parent: &dyn ProgressSink) -> Result<(), TaskError> {
        self.execute(Some(parent))
    }

    fn execute(&mut self, parent: Option<&dyn ProgressSink>) -> Result<(), TaskError> {
        if self.tracker.phase() != TaskPhase::NotStarted {
            return Err(TaskError::AlreadyRun {
                task: self.name.clone(),
            });
        }

        let stages = std::mem::take(&mut self.stages);
        let timer = SpanTimer::start(&self.name);
        self.tracker.set_phase(TaskPhase::Running);
        info!(task = %self.name, side = ?self.side(), stages = stages.len(), "Task started");
        self.events.try_emit(
            "task.started",
            Some(serde_json::json!({
                "task": self.name,
                "side": self.side(),
                "stages": stages.len(),
            })),
        );

        for (index, stage) in stages.into_iter().enumerate() {
            self.tracker.enter_stage(index);
            if let Some(parent) = parent {
                parent.report_progress(self.tracker.progress());
            }

            let label = stage.label().to_string();
            let stage_timer = SpanTimer::start(&label);
            debug!(task = %self.name, side = ?self.side(), index, stage = %label, "Stage started");
            self.events.try_emit(
                "stage.started",
                Some(self.stage_attributes(index, &label).to_event_data()),
            );

            let ctx = StageContext::new(
                &self.tracker,
                &self.diagnostics,
                self.events.as_ref(),
                index,
                parent,
            );
            let outcome = catch_unwind(AssertUnwindSafe(|| stage.execute(&ctx)))
                .unwrap_or_else(|payload| {
                    Err(anyhow::anyhow!("stage panicked: {}", panic_message(payload.as_ref())))
                });

            if let Err(source) = outcome {
                let error = StageError::new(index, label.as_str(), source);
                let message = error.message();
                self.diagnostics
                    .push(Diagnostic::error(format!("{label}: {message}")));
                self.tracker.set_phase(TaskPhase::Failed);
                warn!(
                    task = %self.name,
                    side = ?self.side(),
                    index,
                    stage = %label,
                    error = %message,
                    "Stage failed"
                );
                let attributes = self
                    .stage_attributes(index, &label)
                    .with_duration_ms(stage_timer.elapsed_ms())
                    .with_error(message.as_str());
                self.events
                    .try_emit("stage.failed", Some(attributes.to_event_data()));
                self.events.try_emit(
                    "task.failed",
                    Some(serde_json::json!({
                        "task": self.name,
                        "side": self.side(),
                        "index": index,
                        "error": message,
                        "duration_ms": timer.elapsed_ms(),
                    })),
                );
                self.failure = Some((index, message));
                return Err(error.into());
            }

            debug!(
                task = %self.name,
                index,
                stage = %label,
                duration_ms = stage_timer.elapsed_ms(),
                "Stage completed"
            );
            let attributes = self
                .stage_attributes(index, &label)
                .with_duration_ms(stage_timer.elapsed_ms());
            self.events
                .try_emit("stage.completed", Some(attributes.to_event_data()));
        }

        self.tracker.complete();
        if let Some(parent) = parent {
            parent.report_progress(100);
        }
        info!(
            task = %self.name,
            side = ?self.side(),
            duration_ms = timer.elapsed_ms(),
            "Task completed"
        );
        self.events.try_emit(
            "task.completed",
            Some(serde_json::json!({
                "task": self.name,
                "side": self.side(),
                "duration_ms": timer.elapsed_ms(),
            })),
        );
        Ok(())
    }

    fn stage_attributes(&self, index: usize, label: &str) -> StageSpanAttributes {
        StageSpanAttributes::new(self.name.as_str(), self.side(), index, label)
            .with_progress(self.tracker.progress())
    }
}

impl std::fmt::Debug for StagedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedTask")
            .field("name", &self.name)
            .field("side", &self.side())
            .field("stages", &self.stage_count())
            .field("state", &self.state())
            .field("progress", &self.progress())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
