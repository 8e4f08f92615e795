//! Platform abstraction traits so `pointmorph-core` stays transport- and
//! renderer-agnostic.

use pointmorph_core::{FrameView, Vec3};
use tracing::debug;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Connection state of a gesture source, for status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Idle,
    Connecting { attempt: u32 },
    Connected { peer: String },
    /// Waiting `retry_in_ms` before the next attempt.
    Disconnected { reason: String, retry_in_ms: u64 },
    Stopped,
}

impl SourceStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, SourceStatus::Connected { .. })
    }
}

/// Producer of gesture messages. Absence of a source is a normal mode: the
/// scene keeps its last targets.
pub trait GestureSource: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn status(&self) -> SourceStatus;
}

/// Presentation adapter: draws one frame of points.
pub trait PointRenderer {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
    fn draw(&mut self, frame: &FrameView<'_>) -> Result<()>;
}

/// Summary numbers for a frame, used by headless rendering and status lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub points: usize,
    pub centroid: Vec3,
    pub max_radius: f32,
}

impl FrameStats {
    pub fn of(frame: &FrameView<'_>) -> Self {
        let mut sum = Vec3::ZERO;
        let mut max_radius = 0.0f32;
        for p in frame.positions.chunks_exact(3) {
            let v = Vec3::new(p[0], p[1], p[2]);
            sum += v;
            max_radius = max_radius.max(v.length());
        }
        let points = frame.len();
        let centroid = if points > 0 { sum / points as f32 } else { Vec3::ZERO };
        Self { points, centroid, max_radius }
    }
}

/// Renderer without a display: logs frame stats every `every` frames.
pub struct LogRenderer {
    every: u64,
    frames: u64,
    last: Option<FrameStats>,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1), frames: 0, last: None }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_stats(&self) -> Option<FrameStats> {
        self.last
    }
}

impl PointRenderer for LogRenderer {
    fn draw(&mut self, frame: &FrameView<'_>) -> Result<()> {
        let stats = FrameStats::of(frame);
        if self.frames % self.every == 0 {
            debug!(
                frame = self.frames,
                points = stats.points,
                max_radius = stats.max_radius,
                shape = %frame.active_shape,
                frozen = frame.frozen,
                angle = frame.rotation_angle,
                "headless frame"
            );
        }
        self.frames += 1;
        self.last = Some(stats);
        Ok(())
    }
}
