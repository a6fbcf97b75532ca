//! Synchronized playback: sessions, workers and their coordination.

mod host;
mod pacer;
mod player;
mod rendezvous;
mod session;
mod settings;
mod shape;

use std::time::Duration;

pub use host::{
    CompleteCallback, HostCallbacks, HostExecutor, HostTask, InlineExecutor, LabelCallback,
    PositionCallback, QueuedExecutor,
};
pub use pacer::Pacer;
pub use player::MediaPlayer;
pub use rendezvous::{Crossing, Rendezvous};
pub use session::{PlaybackSession, SessionEnv, SessionTimeline};
pub use settings::PlaybackSettings;
pub use shape::SessionShape;

/// Lifecycle of a playback session. No state is entered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Playing,
    Stopping,
    Terminated,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Playing => "playing",
            Self::Stopping => "stopping",
            Self::Terminated => "terminated",
        }
    }

    /// Starting, playing or winding down after a stop request.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Playing | Self::Stopping)
    }
}

/// Per-frame position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub fps: f64,
    pub index: u64,
    /// Presentation time of this frame relative to the first one.
    pub elapsed: Duration,
    /// Whether this tick published new pixel data. Ticks past the last
    /// decoded frame (audio still playing) are not fresh.
    pub fresh: bool,
}

impl FrameTick {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}
