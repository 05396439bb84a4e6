//! # Sideflow
//!
//! Staged task execution with concurrent per-side orchestration.
//!
//! Sideflow turns an ordered list of fallible steps into a progress-reporting
//! unit of work and runs one such unit per side in parallel:
//!
//! - **Stages**: labelled actions with optional progress floors and sub-ranges
//! - **Staged tasks**: run stages in order, stop at the first failure, and
//!   publish a monotonic 0..=100 progress value
//! - **Side units**: one task per side on its own blocking thread
//! - **Side scheduler**: polls every side, renders a combined progress view
//!   and surfaces the last failure once all sides are done
//! - **Diagnostics**: per-task message logs drained after the run
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sideflow::prelude::*;
//!
//! let family = FnTaskFamily::new(TaskInfo::new("Decompiling", "Decompilation failed!"), |side| {
//!     let mut builder = StagedTask::builder("decompile")
//!         .step("Preparing", 0, |_ctx| Ok(()))
//!         .step("Decompiling", None, |ctx| {
//!             ctx.set_progress(50);
//!             Ok(())
//!         });
//!     if let Some(side) = side {
//!         builder = builder.side(side);
//!     }
//!     builder.build()
//! });
//!
//! let mut scheduler = SideScheduler::new(SchedulerConfig::default());
//! let report = scheduler.run(RunRequest::new(Arc::new(family))).await?;
//! report.log_summary();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod family;
pub mod observability;
pub mod report;
pub mod scheduler;
pub mod side;
pub mod stages;
pub mod task;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{RenderMode, SchedulerConfig};
    pub use crate::context::{ProgressSink, ProgressSnapshot, ProgressTracker, StageContext};
    pub use crate::core::{Diagnostic, Severity, SideFilter, SideId, TaskPhase, TaskState};
    pub use crate::errors::{ConfigError, SideflowError, StageError, TaskError};
    pub use crate::events::{DiagnosticsSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::family::{FnTaskFamily, TaskFamily, TaskInfo};
    pub use crate::observability::init_tracing;
    pub use crate::report::RunReport;
    pub use crate::scheduler::{ProgressRenderer, RunRequest, SideScheduler};
    pub use crate::side::{SideOutcome, SideUnit};
    pub use crate::stages::{stage, ProgressRange, Stage};
    pub use crate::task::{StagedTask, StagedTaskBuilder};
    pub use std::sync::Arc;
}
