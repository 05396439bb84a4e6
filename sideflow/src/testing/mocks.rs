//! Stage doubles for tests.

use crate::stages::{stage, Stage};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared log of the stages that ran, in order.
#[derive(Debug, Clone, Default)]
pub struct StageLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl StageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns the recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing ran.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// A stage that records its label when it runs.
pub fn recording_stage(label: &str, base_progress: impl Into<Option<u8>>, log: &StageLog) -> Stage {
    let log = log.clone();
    let entry = label.to_string();
    stage(label, base_progress, move |_ctx| {
        log.record(entry);
        Ok(())
    })
}

/// A stage that fails with `message`.
pub fn failing_stage(label: &str, base_progress: impl Into<Option<u8>>, message: &str) -> Stage {
    let message = message.to_string();
    stage(label, base_progress, move |_ctx| Err(anyhow::anyhow!(message)))
}

/// A stage that panics with `message`.
pub fn panicking_stage(label: &str, message: &'static str) -> Stage {
    stage(label, None, move |_ctx| panic!("{message}"))
}

/// A stage that walks its sub-progress through `steps`, recording the
/// task progress after each step.
pub fn progress_stage(
    label: &str,
    base_progress: impl Into<Option<u8>>,
    steps: Vec<u8>,
    observed: Arc<Mutex<Vec<u8>>>,
) -> Stage {
    stage(label, base_progress, move |ctx| {
        for step in steps {
            ctx.set_progress(step);
            observed.lock().push(ctx.task_progress());
        }
        Ok(())
    })
}
