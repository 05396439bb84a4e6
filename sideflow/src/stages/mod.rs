//! Stage definitions.
//!
//! Stages are the fundamental units of work in a staged task: a label, an
//! optional progress floor and a fallible action.

mod layout;
mod range;

pub use layout::{resolve_floors, StageLayout};
pub use range::ProgressRange;

use crate::context::StageContext;
use std::fmt::Debug;

/// The boxed body of a stage.
///
/// Actions run once, synchronously, on the thread executing the task. They
/// may report sub-progress and diagnostics through the [`StageContext`].
pub type StageAction = Box<dyn FnOnce(&StageContext<'_>) -> anyhow::Result<()> + Send>;

/// One named step of a staged task.
///
/// A failing action must leave whatever it touched in a state that is safe to
/// retry from the first stage; the engine never rolls anything back.
pub struct Stage {
    label: String,
    base_progress: Option<u8>,
    sub_range: Option<ProgressRange>,
    action: StageAction,
}

impl Stage {
    /// Creates a stage whose floor is derived from its position.
    pub fn new<F>(label: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&StageContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            label: label.into(),
            base_progress: None,
            sub_range: None,
            action: Box::new(action),
        }
    }

    /// Sets the explicit progress floor.
    #[must_use]
    pub fn with_base_progress(mut self, percent: u8) -> Self {
        self.base_progress = Some(percent);
        self
    }

    /// Maps this stage's sub-progress into `range` instead of the gap up to
    /// the next stage's floor.
    #[must_use]
    pub fn with_sub_range(mut self, range: ProgressRange) -> Self {
        self.sub_range = Some(range);
        self
    }

    /// Returns the stage label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the explicit progress floor, if declared.
    #[must_use]
    pub fn base_progress(&self) -> Option<u8> {
        self.base_progress
    }

    /// Returns the sub-progress window, if declared.
    #[must_use]
    pub fn sub_range(&self) -> Option<ProgressRange> {
        self.sub_range
    }

    pub(crate) fn execute(self, ctx: &StageContext<'_>) -> anyhow::Result<()> {
        (self.action)(ctx)
    }
}

impl Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("label", &self.label)
            .field("base_progress", &self.base_progress)
            .field("sub_range", &self.sub_range)
            .finish_non_exhaustive()
    }
}

/// Shorthand for building a stage with an optional floor.
///
/// ```rust,ignore
/// let stages = vec![
///     stage("Preparing", 0, |_ctx| Ok(())),
///     stage("Decompiling", None, |ctx| { ctx.set_progress(50); Ok(()) }),
/// ];
/// ```
pub fn stage<F>(label: impl Into<String>, base_progress: impl Into<Option<u8>>, action: F) -> Stage
where
    F: FnOnce(&StageContext<'_>) -> anyhow::Result<()> + Send + 'static,
{
    let stage = Stage::new(label, action);
    match base_progress.into() {
        Some(percent) => stage.with_base_progress(percent),
        None => stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_shorthand() {
        let with_floor = stage("Preparing", 0, |_ctx| Ok(()));
        assert_eq!(with_floor.label(), "Preparing");
        assert_eq!(with_floor.base_progress(), Some(0));

        let without = stage("Decompiling", None, |_ctx| Ok(()));
        assert_eq!(without.base_progress(), None);
        assert!(without.sub_range().is_none());
    }

    #[test]
    fn test_stage_debug_hides_action() {
        let rendered = format!("{:?}", stage("Copying sources", 90, |_ctx| Ok(())));
        assert!(rendered.contains("Copying sources"));
        assert!(rendered.contains("90"));
    }
}
