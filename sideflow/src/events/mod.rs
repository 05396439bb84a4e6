//! Event and diagnostics sinks.
//!
//! Event sinks receive lifecycle events (`task.started`, `stage.failed`,
//! `run.completed`, ...) for logging and monitoring. The diagnostics sink is
//! the per-task message log the caller drains after a run.

mod diagnostics;
mod sink;

pub use diagnostics::DiagnosticsSink;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
