//! Concurrent execution of one task per side.
//!
//! The scheduler launches a [`SideUnit`] for every selected side, polls
//! their progress on a fixed interval while rendering a combined view, and
//! reconciles their outcomes once all of them terminated. A failing side
//! never stops its siblings.

mod render;

pub use render::{
    renderer_for, CollectingRenderer, IndicatifRenderer, LogRenderer, NoOpRenderer,
    ProgressRenderer,
};

use crate::config::SchedulerConfig;
use crate::context::ProgressSnapshot;
use crate::core::{SideFilter, SideId};
use crate::errors::SideflowError;
use crate::events::{EventSink, NoOpEventSink};
use crate::family::TaskFamily;
use crate::observability::SpanTimer;
use crate::report::RunReport;
use crate::side::SideUnit;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What to run: a task family and the sides to run it for.
#[derive(Clone)]
pub struct RunRequest {
    family: Arc<dyn TaskFamily>,
    filter: SideFilter,
}

impl RunRequest {
    /// Creates a request covering every side.
    pub fn new(family: Arc<dyn TaskFamily>) -> Self {
        Self {
            family,
            filter: SideFilter::All,
        }
    }

    /// Restricts the run to the sides selected by `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: SideFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Restricts the run to a single side.
    #[must_use]
    pub fn only(self, side: SideId) -> Self {
        self.with_filter(SideFilter::Only(side))
    }

    /// Returns the task family.
    #[must_use]
    pub fn family(&self) -> &dyn TaskFamily {
        self.family.as_ref()
    }

    /// Returns the side filter.
    #[must_use]
    pub fn filter(&self) -> SideFilter {
        self.filter
    }

    /// Returns the sides a task is built for, in launch order.
    ///
    /// Sideless families yield a single `None`.
    #[must_use]
    pub fn sides(&self) -> Vec<Option<SideId>> {
        if self.family.is_multi_sided() {
            self.filter.selected_sides().into_iter().map(Some).collect()
        } else {
            vec![None]
        }
    }
}

impl std::fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRequest")
            .field("family", &self.family.info().title)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Runs task families across sides and reports their combined outcome.
pub struct SideScheduler {
    config: SchedulerConfig,
    renderer: Box<dyn ProgressRenderer>,
    events: Arc<dyn EventSink>,
}

impl SideScheduler {
    /// Creates a scheduler rendering in the configured mode.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        let renderer = renderer_for(config.render);
        Self {
            config,
            renderer,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Creates a scheduler configured from `SIDEFLOW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, SideflowError> {
        Ok(Self::new(SchedulerConfig::from_env()?))
    }

    /// Replaces the progress renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn ProgressRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Sets the sink receiving run and task events.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs the request to completion.
    ///
    /// Every task is built before any side starts, so an invalid layout
    /// aborts the run without launching anything. Once launched, all sides
    /// run to their own terminal state and the report surfaces the last
    /// failure in side order.
    ///
    /// # Errors
    ///
    /// Returns an error if the family cannot build a task.
    pub async fn run(&mut self, request: RunRequest) -> Result<RunReport, SideflowError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = SpanTimer::start(run_id.to_string());
        let info = request.family().info().clone();
        let sides = request.sides();

        let tasks = sides
            .iter()
            .map(|side| request.family().new_task(*side))
            .collect::<Result<Vec<_>, _>>()?;

        info!(run_id = %run_id, title = %info.title, sides = ?sides, "Run started");
        self.events
            .emit(
                "run.started",
                Some(serde_json::json!({
                    "run_id": run_id,
                    "title": info.title,
                    "sides": sides,
                })),
            )
            .await;

        let units: Vec<SideUnit> = tasks.into_iter().map(SideUnit::start).collect();
        let final_frame = self.poll(&units).await;
        self.renderer.finish(&final_frame);

        let outcomes = join_all(units.into_iter().map(SideUnit::join)).await;
        for outcome in &outcomes {
            match outcome.error() {
                Some(err) => warn!(run_id = %run_id, side = ?outcome.side, error = %err, "Side failed"),
                None => debug!(run_id = %run_id, side = ?outcome.side, "Side completed"),
            }
        }

        let report = RunReport::new(
            run_id,
            info,
            outcomes,
            started_at,
            timer.elapsed_ms(),
            self.config.debug,
        );
        let error = report.error().map(ToString::to_string);
        info!(
            run_id = %run_id,
            success = report.is_success(),
            duration_ms = report.duration_ms(),
            "Run completed"
        );
        self.events
            .emit(
                "run.completed",
                Some(serde_json::json!({
                    "run_id": run_id,
                    "success": report.is_success(),
                    "error": error,
                    "duration_ms": report.duration_ms(),
                })),
            )
            .await;

        Ok(report)
    }

    /// Renders on every tick until no side is alive; returns the last frame.
    async fn poll(&mut self, units: &[SideUnit]) -> Vec<ProgressSnapshot> {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let alive = units.iter().any(SideUnit::is_alive);
            let frame: Vec<ProgressSnapshot> = units.iter().map(SideUnit::snapshot).collect();
            if !alive {
                return frame;
            }
            self.renderer.render(&frame);
        }
    }
}

impl std::fmt::Debug for SideScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
