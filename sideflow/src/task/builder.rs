//! Staged task builder with layout validation.

use super::StagedTask;
use crate::context::StageContext;
use crate::core::SideId;
use crate::errors::TaskError;
use crate::events::{EventSink, NoOpEventSink};
use crate::stages::{ProgressRange, Stage};
use std::sync::Arc;

/// Builder for creating validated staged tasks.
pub struct StagedTaskBuilder {
    name: String,
    side: Option<SideId>,
    stages: Vec<Stage>,
    events: Option<Arc<dyn EventSink>>,
}

impl StagedTaskBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            side: None,
            stages: Vec::new(),
            events: None,
        }
    }

    /// Binds the task to a side.
    #[must_use]
    pub fn side(mut self, side: SideId) -> Self {
        self.side = Some(side);
        self
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends a stage built from a label, optional floor and action.
    #[must_use]
    pub fn step<F>(self, label: impl Into<String>, base_progress: impl Into<Option<u8>>, action: F) -> Self
    where
        F: FnOnce(&StageContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        self.stage(crate::stages::stage(label, base_progress, action))
    }

    /// Appends a stage whose sub-progress is mapped into `from..=to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is reversed or exceeds 100.
    pub fn ranged_step<F>(self, label: impl Into<String>, from: u8, to: u8, action: F) -> Result<Self, TaskError>
    where
        F: FnOnce(&StageContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        let range = ProgressRange::new(from, to)?;
        Ok(self.stage(Stage::new(label, action).with_sub_range(range)))
    }

    /// Appends several stages.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Sets the sink receiving lifecycle events.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Builds the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a floor exceeds 100, floors decrease, or a
    /// sub-range falls outside its stage's floors.
    pub fn build(self) -> Result<StagedTask, TaskError> {
        let events = self.events.unwrap_or_else(|| Arc::new(NoOpEventSink));
        StagedTask::from_parts(self.name, self.side, self.stages, events)
    }
}

impl std::fmt::Debug for StagedTaskBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedTaskBuilder")
            .field("name", &self.name)
            .field("side", &self.side)
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_binds_side_and_stages() {
        let task = StagedTask::builder("decompile")
            .side(SideId::Client)
            .step("Preparing", 0, |_ctx| Ok(()))
            .step("Remapping JAR", 1, |_ctx| Ok(()))
            .build()
            .unwrap();

        assert_eq!(task.name(), "decompile");
        assert_eq!(task.side(), Some(SideId::Client));
        assert_eq!(task.stage_count(), 2);
    }

    #[test]
    fn test_builder_accepts_repeated_labels() {
        let mut task = StagedTask::builder("decompile")
            .step("Copying", None, |_ctx| Ok(()))
            .step("Copying", None, |_ctx| Ok(()))
            .build()
            .unwrap();
        assert_eq!(task.layout().floors(), vec![0, 50]);
        task.run().unwrap();
        assert_eq!(task.progress(), 100);
    }

    #[test]
    fn test_builder_rejects_decreasing_floors() {
        let result = StagedTask::builder("decompile")
            .step("Extracting sources", 84, |_ctx| Ok(()))
            .step("Applying patches", 10, |_ctx| Ok(()))
            .build();
        assert!(matches!(result, Err(TaskError::InvalidStages(_))));
    }

    #[test]
    fn test_ranged_step_rejects_bad_range() {
        let result = StagedTask::builder("decompile").ranged_step("Decompiling", 80, 3, |_ctx| Ok(()));
        assert!(result.is_err());
    }
}
