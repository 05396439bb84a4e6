//! Tracing subscriber setup and span helpers.

use crate::core::SideId;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber.
///
/// `filter` follows `EnvFilter` syntax; when absent, `RUST_LOG` is used and
/// falls back to `info`. With `json` set, events are written as JSON lines.
pub fn try_init_tracing(filter: Option<&str>, json: bool) -> Result<(), String> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).map_err(|e| e.to_string())?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| e.to_string())
}

/// Installs a global `tracing` subscriber, ignoring the error raised when one
/// is already installed.
pub fn init_tracing(filter: Option<&str>, json: bool) {
    if let Err(e) = try_init_tracing(filter, json) {
        tracing::debug!(error = %e, "Tracing subscriber not installed");
    }
}

/// Attributes describing one stage execution, attached to stage events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Task name.
    pub task: String,
    /// Side the task is bound to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<SideId>,
    /// Stage index.
    pub index: usize,
    /// Stage label.
    pub label: String,
    /// Combined task progress when the event was recorded.
    pub progress: u8,
    /// Duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Error message if the stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageSpanAttributes {
    /// Creates attributes for the stage at `index`.
    #[must_use]
    pub fn new(task: impl Into<String>, side: Option<SideId>, index: usize, label: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            side,
            index,
            label: label.into(),
            ..Default::default()
        }
    }

    /// Sets the progress.
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Converts to an event payload.
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_span_attributes_payload() {
        let attrs = StageSpanAttributes::new("decompile", Some(SideId::Server), 3, "Decompiling")
            .with_progress(43)
            .with_duration_ms(12.5);

        let data = attrs.to_event_data();
        assert_eq!(data["task"], "decompile");
        assert_eq!(data["side"], "server");
        assert_eq!(data["index"], 3);
        assert_eq!(data["progress"], 43);
        assert_eq!(data["duration_ms"], 12.5);
        assert!(data.get("error").is_none());
    }

    #[test]
    fn test_sideless_payload_omits_side() {
        let data = StageSpanAttributes::new("cleanup", None, 0, "Deleting")
            .with_error("locked")
            .to_event_data();
        assert!(data.get("side").is_none());
        assert_eq!(data["error"], "locked");
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("stage");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10.0);
        assert_eq!(timer.name(), "stage");
    }

    #[test]
    fn test_init_tracing_rejects_bad_filter() {
        assert!(try_init_tracing(Some("sideflow=loud"), false).is_err());
    }
}
