//! Task phase and state enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse lifecycle phase of a staged task.
///
/// Stored as a single byte so it can be shared through an atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TaskPhase {
    /// `run()` has not been called yet.
    #[default]
    NotStarted = 0,
    /// A stage is executing.
    Running = 1,
    /// Every stage completed.
    Completed = 2,
    /// A stage failed and the task stopped.
    Failed = 3,
}

impl TaskPhase {
    /// Decodes a phase from its stored byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Failed,
            _ => Self::NotStarted,
        }
    }

    /// Returns true if the phase represents a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Full state of a staged task, including where it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    /// `run()` has not been called yet.
    NotStarted,
    /// The stage at `index` is executing.
    Running {
        /// Current stage index.
        index: usize,
    },
    /// Every stage completed.
    Completed,
    /// The stage at `index` failed.
    Failed {
        /// Failing stage index.
        index: usize,
        /// Failure message.
        message: String,
    },
}

impl TaskState {
    /// Returns the coarse phase of this state.
    #[must_use]
    pub const fn phase(&self) -> TaskPhase {
        match self {
            Self::NotStarted => TaskPhase::NotStarted,
            Self::Running { .. } => TaskPhase::Running,
            Self::Completed => TaskPhase::Completed,
            Self::Failed { .. } => TaskPhase::Failed,
        }
    }

    /// Returns true if the state is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    /// Returns true if the task completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the task failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running { index } => write!(f, "running stage {index}"),
            Self::Completed => write!(f, "completed"),
            Self::Failed { index, message } => write!(f, "failed at stage {index}: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_roundtrip_through_byte() {
        for phase in [TaskPhase::NotStarted, TaskPhase::Running, TaskPhase::Completed, TaskPhase::Failed] {
            assert_eq!(TaskPhase::from_u8(phase as u8), phase);
        }
    }

    #[test]
    fn test_phase_is_terminal() {
        assert!(TaskPhase::Completed.is_terminal());
        assert!(TaskPhase::Failed.is_terminal());
        assert!(!TaskPhase::Running.is_terminal());
        assert!(!TaskPhase::NotStarted.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(TaskState::Running { index: 2 }.to_string(), "running stage 2");
        let failed = TaskState::Failed { index: 1, message: "boom".to_string() };
        assert_eq!(failed.to_string(), "failed at stage 1: boom");
        assert!(failed.is_failed());
        assert_eq!(failed.phase(), TaskPhase::Failed);
    }

    #[test]
    fn test_state_serialize() {
        let json = serde_json::to_string(&TaskState::Running { index: 4 }).unwrap();
        assert_eq!(json, r#"{"state":"running","index":4}"#);
    }
}
