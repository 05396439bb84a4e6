//! Side units: one staged task running on its own blocking thread.

use crate::context::{ProgressSnapshot, ProgressTracker};
use crate::core::SideId;
use crate::errors::TaskError;
use crate::task::StagedTask;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info_span};

type SideJoin = JoinHandle<(StagedTask, Result<(), TaskError>)>;

/// A staged task bound to one side, executing on a dedicated thread.
///
/// The unit is created once per run. Its progress is observable through the
/// shared tracker while the thread runs; `join` hands the task back together
/// with its outcome once the thread has finished.
pub struct SideUnit {
    id: Option<SideId>,
    tracker: Arc<ProgressTracker>,
    handle: SideJoin,
}

impl SideUnit {
    /// Spawns the task's `run()` on a blocking worker and returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(mut task: StagedTask) -> Self {
        let id = task.side();
        let tracker = task.tracker();
        let span = info_span!("side", side = ?id, task = %task.name());
        let handle = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let result = task.run();
            debug!(ok = result.is_ok(), "Side thread finished");
            (task, result)
        });
        Self { id, tracker, handle }
    }

    /// Returns the side this unit runs, `None` for a sideless task.
    #[must_use]
    pub fn id(&self) -> Option<SideId> {
        self.id
    }

    /// Returns true while the thread is still executing the task.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Returns the current progress snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tracker.snapshot()
    }

    /// Waits for the thread and returns the task with its outcome.
    pub async fn join(self) -> SideOutcome {
        match self.handle.await {
            Ok((task, result)) => SideOutcome {
                side: self.id,
                task: Some(task),
                result,
            },
            Err(join_error) => SideOutcome {
                side: self.id,
                task: None,
                result: Err(TaskError::Aborted {
                    side: self.id.map_or("none", SideId::label).to_string(),
                    message: join_error.to_string(),
                }),
            },
        }
    }
}

impl std::fmt::Debug for SideUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideUnit")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .field("progress", &self.tracker.progress())
            .finish()
    }
}

/// Terminal result of one side unit.
#[derive(Debug)]
pub struct SideOutcome {
    /// The side, `None` for a sideless task.
    pub side: Option<SideId>,
    /// The finished task; missing only if its thread was lost.
    pub task: Option<StagedTask>,
    /// `Ok(())` or the captured failure.
    pub result: Result<(), TaskError>,
}

impl SideOutcome {
    /// Returns true if the side succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the captured failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&TaskError> {
        self.result.as_ref().err()
    }

    /// Returns the final progress of the side's task.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.task.as_ref().map_or(0, StagedTask::progress)
    }
}
