//! Testing utilities for staged tasks and side runs.
//!
//! This module provides:
//! - Recording, failing and progress-reporting stages
//! - Task families with scripted per-side failures
//! - Assertions over task state and progress frames

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_monotonic, assert_task_completed, assert_task_failed_at};
pub use fixtures::{decompile_stages, TestFamily, DECOMPILE_LABELS};
pub use mocks::{failing_stage, panicking_stage, progress_stage, recording_stage, StageLog};
