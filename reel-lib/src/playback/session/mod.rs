//! Playback session: one play-through of one media item.
//!
//! A session resolves its resources synchronously in `start()`, picks a
//! [`SessionShape`](crate::playback::SessionShape) and then hands everything
//! to its worker threads. The handle only flips flags and reads counters.

mod controls;
mod runtime;

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::audio::{AudioOutput, RodioOutput};
use crate::frame::FrameSink;
use crate::playback::host::{HostCallbacks, HostExecutor, InlineExecutor};
use crate::playback::{PlaybackSettings, SessionState};
use crate::resource::ResourceProvider;
use crate::video::{RvfCodec, VideoCodec};

use runtime::SessionShared;

/// Collaborators a session is built from.
#[derive(Clone)]
pub struct SessionEnv {
    pub provider: Arc<dyn ResourceProvider>,
    pub output: Arc<dyn AudioOutput>,
    pub codec: Arc<dyn VideoCodec>,
    pub executor: Arc<dyn HostExecutor>,
    pub settings: PlaybackSettings,
}

impl SessionEnv {
    /// RVF video, rodio output and inline callbacks.
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        let settings = PlaybackSettings::default();
        Self {
            provider,
            output: Arc::new(RodioOutput::from_settings(&settings)),
            codec: Arc::new(RvfCodec),
            executor: Arc::new(InlineExecutor),
            settings,
        }
    }

    pub fn with_output(mut self, output: Arc<dyn AudioOutput>) -> Self {
        self.output = output;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn VideoCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn HostExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = settings.sanitized();
        self
    }
}

/// When the interesting moments of a session happened.
///
/// Useful for checking ordering from the outside, e.g. that pacing never
/// started before the soundtrack reported its length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTimeline {
    pub started_at: Option<Instant>,
    pub audio_reported_at: Option<Instant>,
    pub first_frame_at: Option<Instant>,
    pub pacing_started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

/// Handle to a single playback of one media item.
///
/// Sessions are one-shot: once `Terminated`, build a new one.
pub struct PlaybackSession {
    shared: Arc<SessionShared>,
    env: SessionEnv,
    sink: Arc<dyn FrameSink>,
    callbacks: Mutex<Option<HostCallbacks>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PlaybackSession {
    pub fn new(
        media: &str,
        env: SessionEnv,
        sink: Arc<dyn FrameSink>,
        callbacks: HostCallbacks,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared::new(media)),
            env,
            sink,
            callbacks: Mutex::new(Some(callbacks)),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn media(&self) -> &str {
        &self.shared.media
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.env.settings
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        // A session dropped mid-play must not call back into the host later.
        if matches!(
            self.shared.state(),
            SessionState::Starting | SessionState::Playing
        ) {
            self.terminate();
        }
    }
}
