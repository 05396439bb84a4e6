//! Test fixtures for side runs.

use super::mocks::{failing_stage, recording_stage, StageLog};
use crate::core::SideId;
use crate::errors::TaskError;
use crate::family::{TaskFamily, TaskInfo};
use crate::stages::{ProgressRange, Stage};
use crate::task::StagedTask;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Stage labels of the decompile-shaped layout, in order.
pub const DECOMPILE_LABELS: [&str; 9] = [
    "Preparing",
    "Remapping JAR",
    "Applying MCInjector",
    "Decompiling",
    "Extracting sources",
    "Replacing constants",
    "Applying patches",
    "Copying sources",
    "Recompiling",
];

const DECOMPILE_FLOORS: [Option<u8>; 9] = [
    Some(0),
    Some(1),
    Some(2),
    None,
    Some(84),
    Some(86),
    Some(88),
    Some(90),
    None,
];

/// Builds the nine decompile-shaped stages.
///
/// "Decompiling" maps its sub-progress into `3..83` and "Recompiling" into
/// `96..100`. With `fail_at`, the stage at that index fails with the given
/// message instead of recording.
pub fn decompile_stages(log: &StageLog, fail_at: Option<(usize, &str)>) -> Vec<Stage> {
    DECOMPILE_LABELS
        .iter()
        .zip(DECOMPILE_FLOORS)
        .enumerate()
        .map(|(index, (label, floor))| {
            let stage = match fail_at {
                Some((failing, message)) if failing == index => failing_stage(label, floor, message),
                _ => recording_stage(label, floor, log),
            };
            match *label {
                "Decompiling" => stage.with_sub_range(ProgressRange::unchecked(3, 83)),
                "Recompiling" => stage.with_sub_range(ProgressRange::unchecked(96, 100)),
                _ => stage,
            }
        })
        .collect()
}

/// A task family with scripted per-side behaviour.
///
/// Every created task uses the decompile-shaped layout and records into a
/// per-side [`StageLog`].
#[derive(Debug, Clone)]
pub struct TestFamily {
    info: TaskInfo,
    multi_sided: bool,
    failures: HashMap<Option<SideId>, (usize, String)>,
    notes: HashMap<Option<SideId>, String>,
    logs: Arc<parking_lot::Mutex<HashMap<Option<SideId>, StageLog>>>,
    created: Arc<AtomicUsize>,
}

impl TestFamily {
    /// Creates a multi-sided family that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            info: TaskInfo::new("Decompiling", "Decompilation failed!")
                .with_success_message("Decompilation finished!"),
            multi_sided: true,
            failures: HashMap::new(),
            notes: HashMap::new(),
            logs: Arc::default(),
            created: Arc::default(),
        }
    }

    /// Makes the family run a single sideless task.
    #[must_use]
    pub fn sideless(mut self) -> Self {
        self.multi_sided = false;
        self
    }

    /// Makes `side`'s task fail at stage `index`.
    #[must_use]
    pub fn fail(mut self, side: Option<SideId>, index: usize, message: impl Into<String>) -> Self {
        self.failures.insert(side, (index, message.into()));
        self
    }

    /// Adds an informational diagnostic recorded by `side`'s "Preparing" stage.
    #[must_use]
    pub fn note(mut self, side: Option<SideId>, text: impl Into<String>) -> Self {
        self.notes.insert(side, text.into());
        self
    }

    /// Returns how many tasks were created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Returns the stages `side` ran.
    #[must_use]
    pub fn ran(&self, side: Option<SideId>) -> Vec<String> {
        self.logs
            .lock()
            .get(&side)
            .map(StageLog::entries)
            .unwrap_or_default()
    }
}

impl Default for TestFamily {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskFamily for TestFamily {
    fn info(&self) -> &TaskInfo {
        &self.info
    }

    fn is_multi_sided(&self) -> bool {
        self.multi_sided
    }

    fn new_task(&self, side: Option<SideId>) -> Result<StagedTask, TaskError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let log = self.logs.lock().entry(side).or_default().clone();
        let failure = self
            .failures
            .get(&side)
            .map(|(index, message)| (*index, message.as_str()));
        let mut stages = decompile_stages(&log, failure);

        let preparing_fails = failure.is_some_and(|(index, _)| index == 0);
        if let (Some(note), false) = (self.notes.get(&side).cloned(), preparing_fails) {
            let log = log.clone();
            stages[0] = Stage::new(DECOMPILE_LABELS[0], move |ctx| {
                log.record(DECOMPILE_LABELS[0]);
                ctx.info(note);
                Ok(())
            })
            .with_base_progress(0);
        }

        let mut builder = StagedTask::builder("decompile").stages(stages);
        if let Some(side) = side {
            builder = builder.side(side);
        }
        builder.build()
    }
}
