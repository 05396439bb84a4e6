//! Combined progress display for running sides.

use crate::config::RenderMode;
use crate::context::ProgressSnapshot;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const BAR_TEMPLATE: &str = "{prefix:>8} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

/// Receives the snapshots taken on every scheduler poll.
pub trait ProgressRenderer: Send {
    /// Draws one frame; `sides` is in launch order.
    fn render(&mut self, sides: &[ProgressSnapshot]);

    /// Draws the final frame after every side terminated.
    fn finish(&mut self, sides: &[ProgressSnapshot]) {
        self.render(sides);
    }
}

/// Creates the renderer for a configured mode.
#[must_use]
pub fn renderer_for(mode: RenderMode) -> Box<dyn ProgressRenderer> {
    match mode {
        RenderMode::Bars => Box::new(IndicatifRenderer::new()),
        RenderMode::Log => Box::new(LogRenderer::new()),
        RenderMode::Off => Box::new(NoOpRenderer),
    }
}

/// One terminal progress bar per side.
pub struct IndicatifRenderer {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
}

impl IndicatifRenderer {
    /// Creates a renderer drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Creates a renderer that tracks bars without drawing them.
    #[must_use]
    pub fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            bars: HashMap::new(),
        }
    }

    fn bar(&mut self, name: &str) -> &ProgressBar {
        let multi = &self.multi;
        self.bars.entry(name.to_string()).or_insert_with(|| {
            let bar = multi.add(ProgressBar::new(100));
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar.set_prefix(name.to_string());
            bar
        })
    }

    /// Returns the current position of a side's bar.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<u64> {
        self.bars.get(name).map(ProgressBar::position)
    }
}

impl Default for IndicatifRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressRenderer for IndicatifRenderer {
    fn render(&mut self, sides: &[ProgressSnapshot]) {
        for side in sides {
            let bar = self.bar(side.display_name());
            bar.set_position(u64::from(side.progress));
            bar.set_message(side.status_text());
        }
    }

    fn finish(&mut self, sides: &[ProgressSnapshot]) {
        self.render(sides);
        for bar in self.bars.values() {
            bar.finish();
        }
    }
}

impl std::fmt::Debug for IndicatifRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatifRenderer")
            .field("bars", &self.bars.len())
            .finish()
    }
}

/// Writes a log line whenever a side's stage or percentage changes.
#[derive(Debug, Default)]
pub struct LogRenderer {
    last: HashMap<String, (u8, String)>,
}

impl LogRenderer {
    /// Creates a log renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressRenderer for LogRenderer {
    fn render(&mut self, sides: &[ProgressSnapshot]) {
        for side in sides {
            let current = (side.progress, side.status_text());
            let name = side.display_name();
            if self.last.get(name) == Some(&current) {
                continue;
            }
            info!(side = %name, progress = current.0, status = %current.1, "Progress");
            self.last.insert(name.to_string(), current);
        }
    }
}

/// Renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRenderer;

impl ProgressRenderer for NoOpRenderer {
    fn render(&mut self, _sides: &[ProgressSnapshot]) {}
}

/// Keeps every frame; clones share the recorded frames.
#[derive(Debug, Clone, Default)]
pub struct CollectingRenderer {
    frames: Arc<Mutex<Vec<Vec<ProgressSnapshot>>>>,
    finished: Arc<Mutex<Option<Vec<ProgressSnapshot>>>>,
}

impl CollectingRenderer {
    /// Creates a collecting renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every frame rendered so far.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<ProgressSnapshot>> {
        self.frames.lock().clone()
    }

    /// Returns the final frame, once rendered.
    #[must_use]
    pub fn final_frame(&self) -> Option<Vec<ProgressSnapshot>> {
        self.finished.lock().clone()
    }
}

impl ProgressRenderer for CollectingRenderer {
    fn render(&mut self, sides: &[ProgressSnapshot]) {
        self.frames.lock().push(sides.to_vec());
    }

    fn finish(&mut self, sides: &[ProgressSnapshot]) {
        self.render(sides);
        *self.finished.lock() = Some(sides.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SideId, TaskPhase};

    fn snapshot(side: SideId, progress: u8, label: Option<&str>, phase: TaskPhase) -> ProgressSnapshot {
        ProgressSnapshot {
            task: "decompile".to_string(),
            side: Some(side),
            phase,
            stage_index: Some(0),
            stage_label: label.map(str::to_string),
            progress,
        }
    }

    #[test]
    fn test_indicatif_renderer_tracks_positions() {
        let mut renderer = IndicatifRenderer::hidden();
        renderer.render(&[
            snapshot(SideId::Client, 43, Some("Applying MCInjector"), TaskPhase::Running),
            snapshot(SideId::Server, 2, Some("Remapping JAR"), TaskPhase::Running),
        ]);
        assert_eq!(renderer.position("Client"), Some(43));
        assert_eq!(renderer.position("Server"), Some(2));

        renderer.finish(&[snapshot(SideId::Client, 100, None, TaskPhase::Completed)]);
        assert_eq!(renderer.position("Client"), Some(100));
    }

    #[test]
    fn test_log_renderer_skips_unchanged() {
        let mut renderer = LogRenderer::new();
        let frame = [snapshot(SideId::Client, 10, Some("Decompiling"), TaskPhase::Running)];
        renderer.render(&frame);
        renderer.render(&frame);
        assert_eq!(renderer.last.len(), 1);
    }

    #[test]
    fn test_collecting_renderer_shares_frames() {
        let collector = CollectingRenderer::new();
        let mut boxed: Box<dyn ProgressRenderer> = Box::new(collector.clone());
        boxed.render(&[snapshot(SideId::Client, 1, None, TaskPhase::NotStarted)]);
        boxed.finish(&[snapshot(SideId::Client, 100, None, TaskPhase::Completed)]);

        assert_eq!(collector.frames().len(), 2);
        assert_eq!(collector.final_frame().unwrap()[0].progress, 100);
    }

    #[test]
    fn test_renderer_for_mode() {
        let mut renderer = renderer_for(RenderMode::Off);
        renderer.render(&[]);
    }
}
