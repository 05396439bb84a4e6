//! Outcome of a scheduler run and its human readable summary.

use crate::core::{Diagnostic, Severity, SideId};
use crate::errors::{error_chain, TaskError};
use crate::family::TaskInfo;
use crate::side::SideOutcome;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// Hint appended to failure summaries when debug reporting is off.
pub const DEBUG_HINT: &str = "Use -debug for more info";

/// Result of one [`SideScheduler::run`](crate::scheduler::SideScheduler::run).
#[derive(Debug)]
pub struct RunReport {
    run_id: Uuid,
    info: TaskInfo,
    outcomes: Vec<SideOutcome>,
    started_at: DateTime<Utc>,
    duration_ms: f64,
    debug: bool,
}

impl RunReport {
    pub(crate) fn new(
        run_id: Uuid,
        info: TaskInfo,
        outcomes: Vec<SideOutcome>,
        started_at: DateTime<Utc>,
        duration_ms: f64,
        debug: bool,
    ) -> Self {
        Self {
            run_id,
            info,
            outcomes,
            started_at,
            duration_ms,
            debug,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the family's display texts.
    #[must_use]
    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// Returns when the run started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the wall-clock duration of the run.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Returns true if the summary lists full error chains.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Returns every side's outcome in launch order.
    #[must_use]
    pub fn outcomes(&self) -> &[SideOutcome] {
        &self.outcomes
    }

    /// Returns the outcome of one side.
    #[must_use]
    pub fn outcome(&self, side: Option<SideId>) -> Option<&SideOutcome> {
        self.outcomes.iter().find(|outcome| outcome.side == side)
    }

    /// Returns true if every side succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(SideOutcome::is_success)
    }

    /// Returns the surfaced failure: the last one in side order.
    #[must_use]
    pub fn error(&self) -> Option<&TaskError> {
        self.outcomes.iter().rev().find_map(SideOutcome::error)
    }

    /// Converts the report into the outcomes or the surfaced failure.
    ///
    /// # Errors
    ///
    /// Returns the last captured failure if any side failed.
    pub fn into_result(self) -> Result<Vec<SideOutcome>, TaskError> {
        let mut outcomes = self.outcomes;
        let failed = outcomes.iter().rposition(|outcome| outcome.result.is_err());
        match failed {
            Some(position) => match outcomes.swap_remove(position).result {
                Err(err) => Err(err),
                Ok(()) => Ok(outcomes),
            },
            None => Ok(outcomes),
        }
    }

    /// Reads and clears every side's diagnostics, in side order.
    pub fn drain_diagnostics(&self) -> Vec<(Option<SideId>, Vec<Diagnostic>)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| {
                let task = outcome.task.as_ref()?;
                let entries = task.drain_diagnostics().unwrap_or_default();
                Some((outcome.side, entries))
            })
            .collect()
    }

    /// Builds the summary printed after a run.
    ///
    /// Diagnostics are indented by one space, continuation lines included.
    /// With `debug` the whole error chain is listed, otherwise only the
    /// top-level message followed by [`DEBUG_HINT`].
    #[must_use]
    pub fn summary_lines(&self, debug: bool) -> Vec<String> {
        let mut lines = vec![format!("====== {} ======", self.info.title)];

        match self.error() {
            None => {
                if let Some(message) = &self.info.success_message {
                    lines.push(String::new());
                    lines.push(message.clone());
                    self.push_diagnostics(&mut lines, Some(Severity::Info));
                }
            }
            Some(err) => {
                lines.push(String::new());
                lines.push(self.info.failure_message.clone());
                self.push_diagnostics(&mut lines, None);
                if debug {
                    lines.extend(error_chain(err));
                } else {
                    lines.push(err.message());
                    lines.push(DEBUG_HINT.to_string());
                }
            }
        }
        lines
    }

    /// Builds the summary using the debug flag the run was configured with.
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        self.summary_lines(self.debug)
    }

    /// Writes the summary to the log.
    pub fn log_summary(&self) {
        let failed = !self.is_success();
        for line in self.summary() {
            if failed {
                warn!("{line}");
            } else {
                info!("{line}");
            }
        }
    }

    fn push_diagnostics(&self, lines: &mut Vec<String>, severity: Option<Severity>) {
        let tasks = self.outcomes.iter().filter_map(|outcome| outcome.task.as_ref());
        for task in tasks {
            for entry in task.diagnostics().entries() {
                if severity.is_some_and(|severity| entry.severity != severity) {
                    continue;
                }
                lines.extend(entry.text.lines().map(|line| format!(" {line}")));
            }
        }
    }
}
