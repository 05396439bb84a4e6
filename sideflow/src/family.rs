//! Task families: factories producing one staged task per side.

use crate::core::SideId;
use crate::errors::TaskError;
use crate::task::StagedTask;
use serde::{Deserialize, Serialize};

/// Human readable texts describing a task family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Shown in the run banner.
    pub title: String,
    /// Printed when every side succeeded; `None` prints nothing.
    #[serde(default)]
    pub success_message: Option<String>,
    /// Printed when any side failed.
    pub failure_message: String,
}

impl TaskInfo {
    /// Creates task info with a failure message and no success message.
    #[must_use]
    pub fn new(title: impl Into<String>, failure_message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            success_message: None,
            failure_message: failure_message.into(),
        }
    }

    /// Sets the success message.
    #[must_use]
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }
}

/// A kind of run (decompile, recompile, cleanup...) that can build fresh
/// staged tasks on demand.
pub trait TaskFamily: Send + Sync {
    /// Returns the family's display texts.
    fn info(&self) -> &TaskInfo;

    /// Returns true if the family runs once per side.
    fn is_multi_sided(&self) -> bool {
        true
    }

    /// Builds a fresh task for `side`; `None` for sideless families.
    ///
    /// # Errors
    ///
    /// Returns an error if the task's stage layout is invalid.
    fn new_task(&self, side: Option<SideId>) -> Result<StagedTask, TaskError>;
}

type TaskFactory = Box<dyn Fn(Option<SideId>) -> Result<StagedTask, TaskError> + Send + Sync>;

/// A [`TaskFamily`] backed by a closure.
pub struct FnTaskFamily {
    info: TaskInfo,
    multi_sided: bool,
    factory: TaskFactory,
}

impl FnTaskFamily {
    /// Creates a multi-sided family.
    pub fn new<F>(info: TaskInfo, factory: F) -> Self
    where
        F: Fn(Option<SideId>) -> Result<StagedTask, TaskError> + Send + Sync + 'static,
    {
        Self {
            info,
            multi_sided: true,
            factory: Box::new(factory),
        }
    }

    /// Creates a family that runs a single sideless task.
    pub fn sideless<F>(info: TaskInfo, factory: F) -> Self
    where
        F: Fn(Option<SideId>) -> Result<StagedTask, TaskError> + Send + Sync + 'static,
    {
        Self {
            multi_sided: false,
            ..Self::new(info, factory)
        }
    }
}

impl TaskFamily for FnTaskFamily {
    fn info(&self) -> &TaskInfo {
        &self.info
    }

    fn is_multi_sided(&self) -> bool {
        self.multi_sided
    }

    fn new_task(&self, side: Option<SideId>) -> Result<StagedTask, TaskError> {
        (self.factory)(side)
    }
}

impl std::fmt::Debug for FnTaskFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTaskFamily")
            .field("info", &self.info)
            .field("multi_sided", &self.multi_sided)
            .finish_non_exhaustive()
    }
}
