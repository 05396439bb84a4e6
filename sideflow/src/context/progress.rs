//! Lock-free progress state shared between a running task and its observers.

use crate::core::{SideId, TaskPhase};
use crate::stages::StageLayout;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

const SUB_BITS: u32 = 8;
const SUB_MASK: u64 = 0xFF;

/// Progress counters of one staged task.
///
/// The current stage and its sub-progress are packed into a single atomic
/// word so observers never see a new stage paired with the previous stage's
/// sub-progress. Only the thread running the task writes; any thread reads.
#[derive(Debug)]
pub struct ProgressTracker {
    task: String,
    side: Option<SideId>,
    layout: StageLayout,
    /// `(stage index + 1) << 8 | sub-progress`; zero before the first stage.
    position: AtomicU64,
    phase: AtomicU8,
}

impl ProgressTracker {
    /// Creates a tracker for a task that has not started.
    #[must_use]
    pub fn new(task: impl Into<String>, side: Option<SideId>, layout: StageLayout) -> Self {
        Self {
            task: task.into(),
            side,
            layout,
            position: AtomicU64::new(0),
            phase: AtomicU8::new(TaskPhase::NotStarted as u8),
        }
    }

    /// Returns the task name.
    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Returns the side the task is bound to.
    #[must_use]
    pub fn side(&self) -> Option<SideId> {
        self.side
    }

    /// Returns the stage layout.
    #[must_use]
    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> TaskPhase {
        TaskPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: TaskPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Returns the current stage index; `None` before the first stage and
    /// `Some(len)` once every stage completed.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        decode(self.position.load(Ordering::Acquire)).0
    }

    /// Returns the sub-progress of the current stage.
    #[must_use]
    pub fn sub_progress(&self) -> u8 {
        decode(self.position.load(Ordering::Acquire)).1
    }

    /// Moves to the stage at `index` with sub-progress reset to zero.
    pub(crate) fn enter_stage(&self, index: usize) {
        self.position.store(encode(index, 0), Ordering::Release);
    }

    /// Marks every stage as passed.
    pub(crate) fn complete(&self) {
        self.position
            .store(encode(self.layout.len(), 0), Ordering::Release);
        self.set_phase(TaskPhase::Completed);
    }

    /// Raises the current stage's sub-progress; lower values are ignored so
    /// progress never moves backwards.
    pub(crate) fn raise_sub_progress(&self, percent: u8) {
        let percent = u64::from(percent.min(100));
        let _ = self
            .position
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                if word == 0 || word & SUB_MASK >= percent {
                    None
                } else {
                    Some((word & !SUB_MASK) | percent)
                }
            });
    }

    /// Returns the combined 0..=100 progress.
    #[must_use]
    pub fn progress(&self) -> u8 {
        let (phase, index, sub) = self.read();
        self.combined(phase, index, sub)
    }

    /// Reads phase and position together. A position past the last stage
    /// only exists once the task completed, so it wins over a phase that has
    /// not caught up yet.
    fn read(&self) -> (TaskPhase, Option<usize>, u8) {
        let phase = self.phase();
        let (index, sub) = decode(self.position.load(Ordering::Acquire));
        if index == Some(self.layout.len()) {
            return (TaskPhase::Completed, index, sub);
        }
        (phase, index, sub)
    }

    fn combined(&self, phase: TaskPhase, index: Option<usize>, sub: u8) -> u8 {
        match (phase, index) {
            (TaskPhase::Completed, _) => 100,
            (_, None) => 0,
            (_, Some(index)) => self.layout.progress_at(index, sub),
        }
    }

    /// Takes a consistent snapshot for display.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let (phase, index, sub) = self.read();
        let progress = self.combined(phase, index, sub);
        ProgressSnapshot {
            task: self.task.clone(),
            side: self.side,
            phase,
            stage_index: index,
            stage_label: index
                .and_then(|index| self.layout.label(index))
                .map(str::to_string),
            progress,
        }
    }
}

/// Immutable view of a task's progress at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Task name.
    pub task: String,
    /// Side the task is bound to.
    pub side: Option<SideId>,
    /// Task phase.
    pub phase: TaskPhase,
    /// Current stage index.
    pub stage_index: Option<usize>,
    /// Current stage label; `None` before the first stage and after the last.
    pub stage_label: Option<String>,
    /// Combined 0..=100 progress.
    pub progress: u8,
}

impl ProgressSnapshot {
    /// Returns the label shown for this side in combined views.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.side {
            Some(side) => side.label(),
            None => self.task.as_str(),
        }
    }

    /// Returns the status text shown next to the percentage.
    #[must_use]
    pub fn status_text(&self) -> String {
        match (self.phase, &self.stage_label) {
            (TaskPhase::Completed, _) => "Done".to_string(),
            (TaskPhase::Failed, Some(label)) => format!("Failed: {label}"),
            (TaskPhase::Failed, None) => "Failed".to_string(),
            (_, Some(label)) => label.clone(),
            (_, None) => "Waiting".to_string(),
        }
    }
}

fn encode(index: usize, sub: u8) -> u64 {
    ((index as u64 + 1) << SUB_BITS) | u64::from(sub)
}

fn decode(word: u64) -> (Option<usize>, u8) {
    let stage = word >> SUB_BITS;
    let sub = (word & SUB_MASK) as u8;
    if stage == 0 {
        (None, sub)
    } else {
        (Some((stage - 1) as usize), sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Stage;

    fn tracker(floors: &[u8]) -> ProgressTracker {
        let stages: Vec<Stage> = floors
            .iter()
            .enumerate()
            .map(|(i, floor)| Stage::new(format!("stage-{i}"), |_ctx| Ok(())).with_base_progress(*floor))
            .collect();
        ProgressTracker::new("test", Some(SideId::Client), StageLayout::resolve(&stages).unwrap())
    }

    #[test]
    fn test_encode_decode() {
        assert_eq!(decode(0), (None, 0));
        assert_eq!(decode(encode(0, 0)), (Some(0), 0));
        assert_eq!(decode(encode(6, 42)), (Some(6), 42));
    }

    #[test]
    fn test_not_started_reports_zero() {
        let tracker = tracker(&[10, 20]);
        assert_eq!(tracker.progress(), 0);
        assert_eq!(tracker.current_index(), None);
        assert_eq!(tracker.phase(), TaskPhase::NotStarted);
    }

    #[test]
    fn test_sub_progress_only_rises() {
        let tracker = tracker(&[0, 1, 2, 84, 86, 88, 90]);
        tracker.set_phase(TaskPhase::Running);
        tracker.enter_stage(2);
        tracker.raise_sub_progress(50);
        assert_eq!(tracker.progress(), 43);

        tracker.raise_sub_progress(20);
        assert_eq!(tracker.sub_progress(), 50);
        assert_eq!(tracker.progress(), 43);
    }

    #[test]
    fn test_sub_progress_ignored_before_first_stage() {
        let tracker = tracker(&[0, 50]);
        tracker.raise_sub_progress(80);
        assert_eq!(tracker.current_index(), None);
        assert_eq!(tracker.progress(), 0);
    }

    #[test]
    fn test_entering_stage_resets_sub_progress() {
        let tracker = tracker(&[0, 50]);
        tracker.set_phase(TaskPhase::Running);
        tracker.enter_stage(0);
        tracker.raise_sub_progress(90);
        tracker.enter_stage(1);
        assert_eq!(tracker.sub_progress(), 0);
        assert_eq!(tracker.progress(), 50);
    }

    #[test]
    fn test_complete_reports_hundred() {
        let tracker = tracker(&[0, 50]);
        tracker.complete();
        assert_eq!(tracker.progress(), 100);
        assert_eq!(tracker.current_index(), Some(2));

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.stage_label, None);
        assert_eq!(snapshot.status_text(), "Done");
        assert_eq!(snapshot.display_name(), "Client");
    }

    #[test]
    fn test_snapshot_during_completion_reports_done() {
        let tracker = tracker(&[0, 50]);
        tracker.set_phase(TaskPhase::Running);
        tracker.enter_stage(1);
        // position already moved past the last stage, phase not yet stored
        tracker.position.store(encode(2, 0), Ordering::Release);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.phase, TaskPhase::Completed);
        assert_eq!(snapshot.progress, 100);
        assert_eq!(snapshot.status_text(), "Done");
        assert_eq!(tracker.progress(), 100);
    }

    #[test]
    fn test_display_name_falls_back_to_task() {
        let tracker = ProgressTracker::new("cleanup", None, StageLayout::default());
        assert_eq!(tracker.snapshot().display_name(), "cleanup");
    }

    #[test]
    fn test_snapshot_labels_current_stage() {
        let tracker = tracker(&[0, 50]);
        tracker.set_phase(TaskPhase::Running);
        tracker.enter_stage(1);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.stage_index, Some(1));
        assert_eq!(snapshot.status_text(), "stage-1");
        assert_eq!(snapshot.progress, 50);
    }
}
