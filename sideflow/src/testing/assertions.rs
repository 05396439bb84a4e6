//! Test assertions for tasks and progress.

use crate::core::TaskState;
use crate::task::StagedTask;

/// Asserts that the task completed at 100%.
pub fn assert_task_completed(task: &StagedTask) {
    assert_eq!(
        task.state(),
        TaskState::Completed,
        "Expected task '{}' to complete",
        task.name()
    );
    assert_eq!(task.progress(), 100, "Completed task '{}' not at 100%", task.name());
}

/// Asserts that the task failed at stage `index`.
pub fn assert_task_failed_at(task: &StagedTask, index: usize) {
    match task.state() {
        TaskState::Failed { index: failed, .. } => assert_eq!(
            failed, index,
            "Expected task '{}' to fail at stage {index}, failed at {failed}",
            task.name()
        ),
        other => panic!("Expected task '{}' to fail, got {other}", task.name()),
    }
    assert_eq!(task.current_index(), Some(index));
}

/// Asserts that the values never decrease.
pub fn assert_monotonic(values: &[u8]) {
    assert!(
        values.windows(2).all(|pair| pair[0] <= pair[1]),
        "Expected non-decreasing progress, got {values:?}"
    );
}
