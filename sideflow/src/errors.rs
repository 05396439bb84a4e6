//! Error types for the sideflow engine.
//!
//! Stage actions fail with opaque [`anyhow::Error`] values; the engine wraps
//! them in a [`StageError`] carrying the failing stage's position and hands
//! them up unchanged through task, side unit and scheduler.

use thiserror::Error;

/// Boxed opaque error raised by a stage body.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for sideflow operations.
#[derive(Debug, Error)]
pub enum SideflowError {
    /// A task failed or was misused.
    #[error("{0}")]
    Task(#[from] TaskError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Errors produced by a staged task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A stage action failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// The task already reached a terminal state and cannot run again.
    #[error("Task '{task}' has already run; build a fresh task to retry")]
    AlreadyRun {
        /// The task name.
        task: String,
    },

    /// Diagnostics were drained before the task reached a terminal state.
    #[error("Task '{task}' is still running")]
    StillRunning {
        /// The task name.
        task: String,
    },

    /// The thread executing a side was lost before reporting back.
    #[error("Side {side} was aborted: {message}")]
    Aborted {
        /// The side label.
        side: String,
        /// Join failure detail.
        message: String,
    },

    /// The declared stage layout is not usable.
    #[error("Invalid stage layout: {0}")]
    InvalidStages(String),
}

impl TaskError {
    /// Creates an invalid layout error.
    #[must_use]
    pub fn invalid_stages(message: impl Into<String>) -> Self {
        Self::InvalidStages(message.into())
    }

    /// Returns the stage error if this failure came from a stage action.
    #[must_use]
    pub fn as_stage_error(&self) -> Option<&StageError> {
        match self {
            Self::Stage(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the human readable message without the stage prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Stage(err) => err.message(),
            other => other.to_string(),
        }
    }
}

/// Error raised when a stage action fails.
#[derive(Debug, Error)]
#[error("Stage {index} ({label}) failed: {source}")]
pub struct StageError {
    /// Position of the failing stage.
    pub index: usize,
    /// Label of the failing stage.
    pub label: String,
    /// The error raised by the stage body.
    #[source]
    pub source: BoxedSource,
}

impl StageError {
    /// Creates a new stage error.
    #[must_use]
    pub fn new(index: usize, label: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            index,
            label: label.into(),
            source: source.into(),
        }
    }

    /// Returns the message of the underlying error.
    #[must_use]
    pub fn message(&self) -> String {
        self.source.to_string()
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment variable held an unusable value.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue {
        /// The variable name.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A parsed value violates a constraint.
    #[error("Invalid configuration: {0}")]
    Constraint(String),
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Collects the messages of an error and all of its sources, outermost first.
#[must_use]
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        chain.push(source.to_string());
        current = source.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_stage_error_display() {
        let err = StageError::new(3, "Decompiling", anyhow::anyhow!("out of memory"));
        assert_eq!(err.to_string(), "Stage 3 (Decompiling) failed: out of memory");
        assert_eq!(err.message(), "out of memory");
    }

    #[test]
    fn test_task_error_message_strips_stage_prefix() {
        let err: TaskError = StageError::new(1, "Remapping JAR", anyhow::anyhow!("missing mappings")).into();
        assert_eq!(err.message(), "missing mappings");
        assert!(err.as_stage_error().is_some());

        let err = TaskError::AlreadyRun { task: "decompile".to_string() };
        assert!(err.message().contains("decompile"));
        assert!(err.as_stage_error().is_none());
    }

    #[test]
    fn test_error_chain_walks_sources() {
        let source = Err::<(), _>(std::io::Error::new(std::io::ErrorKind::NotFound, "minecraft.jar"))
            .context("copying original jar")
            .unwrap_err();
        let err = TaskError::from(StageError::new(0, "Preparing", source));

        let chain = error_chain(&err);
        assert_eq!(chain[0], "Stage 0 (Preparing) failed: copying original jar");
        assert!(chain.iter().any(|line| line == "minecraft.jar"));
    }

    #[test]
    fn test_sideflow_error_wraps_sources() {
        let err: SideflowError = TaskError::invalid_stages("floors decrease").into();
        assert_eq!(err.to_string(), "Invalid stage layout: floors decrease");
        assert!(matches!(err, SideflowError::Task(TaskError::InvalidStages(_))));

        let err: SideflowError = ConfigError::invalid_value("SIDEFLOW_RENDER", "fancy").into();
        assert!(matches!(err, SideflowError::Config(_)));
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::invalid_value("SIDEFLOW_RENDER", "fancy");
        assert_eq!(err.to_string(), "Invalid value for SIDEFLOW_RENDER: 'fancy'");
    }
}
