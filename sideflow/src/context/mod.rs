//! Execution context handed to stage actions.
//!
//! This module provides:
//! - The lock-free progress tracker shared between a task and its observers
//! - Immutable progress snapshots for rendering
//! - The per-stage context used to report sub-progress and diagnostics

mod execution;
mod progress;

pub use execution::{ProgressSink, StageContext};
pub use progress::{ProgressSnapshot, ProgressTracker};
