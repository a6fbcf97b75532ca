//! State shared between a session handle and its worker threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::audio::AudioSpan;
use crate::frame::FrameBuffer;
use crate::playback::session::SessionTimeline;
use crate::playback::SessionState;

pub(in crate::playback::session) struct SessionShared {
    pub(in crate::playback::session) media: String,
    pub(in crate::playback::session) frames: Arc<FrameBuffer>,
    state: Mutex<SessionState>,
    state_changed: Condvar,
    stop: AtomicBool,
    terminated: AtomicBool,
    forced: AtomicBool,
    audio_span: Mutex<Option<AudioSpan>>,
    ticks: AtomicU64,
    fresh_frames: AtomicU64,
    timeline: Mutex<SessionTimeline>,
}

impl SessionShared {
    pub(in crate::playback::session) fn new(media: &str) -> Self {
        Self {
            media: media.to_string(),
            frames: Arc::new(FrameBuffer::new()),
            state: Mutex::new(SessionState::Idle),
            state_changed: Condvar::new(),
            stop: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            forced: AtomicBool::new(false),
            audio_span: Mutex::new(None),
            ticks: AtomicU64::new(0),
            fresh_frames: AtomicU64::new(0),
            timeline: Mutex::new(SessionTimeline::default()),
        }
    }

    pub(in crate::playback::session) fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Move to `to` if the current state is one of `from`.
    pub(in crate::playback::session) fn transition(
        &self,
        from: &[SessionState],
        to: SessionState,
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        if !from.contains(&state) {
            return false;
        }
        debug!("session '{}': {:?} -> {:?}", self.media, *state, to);
        *state = to;
        self.state_changed.notify_all();
        true
    }

    /// Run `f` with the state locked, so checks and updates are atomic.
    pub(in crate::playback::session) fn with_state<T>(
        &self,
        f: impl FnOnce(&mut SessionState) -> T,
    ) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub(in crate::playback::session) fn stop_flag(&self) -> &AtomicBool {
        &self.stop
    }

    pub(in crate::playback::session) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(in crate::playback::session) fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub(in crate::playback::session) fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    pub(in crate::playback::session) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// The completion barrier gave up on a straggling worker.
    pub(in crate::playback::session) fn mark_forced(&self) {
        self.forced.store(true, Ordering::SeqCst);
    }

    pub(in crate::playback::session) fn was_forced(&self) -> bool {
        self.forced.load(Ordering::SeqCst)
    }

    /// Called by the audio worker once its line is open.
    pub(in crate::playback::session) fn report_audio(&self, span: AudioSpan) {
        *self.audio_span.lock().unwrap() = Some(span);
        self.timeline.lock().unwrap().audio_reported_at = Some(Instant::now());
        debug!(
            "session '{}': soundtrack ready, {:?} ({} bytes)",
            self.media,
            span.duration(),
            span.bytes
        );
    }

    pub(in crate::playback::session) fn audio_span(&self) -> Option<AudioSpan> {
        *self.audio_span.lock().unwrap()
    }

    pub(in crate::playback::session) fn record_tick(&self, fresh: bool) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        if fresh {
            self.fresh_frames.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(in crate::playback::session) fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub(in crate::playback::session) fn fresh_frames(&self) -> u64 {
        self.fresh_frames.load(Ordering::SeqCst)
    }

    pub(in crate::playback::session) fn update_timeline(
        &self,
        update: impl FnOnce(&mut SessionTimeline),
    ) {
        update(&mut self.timeline.lock().unwrap());
    }

    pub(in crate::playback::session) fn timeline(&self) -> SessionTimeline {
        *self.timeline.lock().unwrap()
    }

    /// Final transition once the completion barrier has released.
    pub(in crate::playback::session) fn mark_finished(&self) {
        self.with_state(|state| {
            info!(
                "session '{}' finished ({:?} -> {:?})",
                self.media,
                *state,
                SessionState::Terminated
            );
            *state = SessionState::Terminated;
        });
        self.update_timeline(|timeline| timeline.finished_at = Some(Instant::now()));
        self.state_changed.notify_all();
    }

    /// Block until the session reaches `Terminated`, or `timeout` passes.
    /// Returns whether it finished.
    pub(in crate::playback::session) fn wait_finished(&self, timeout: Option<Duration>) -> bool {
        let state = self.state.lock().unwrap();
        let unfinished = |state: &mut SessionState| *state != SessionState::Terminated;
        match timeout {
            Some(timeout) => {
                let (state, _) = self
                    .state_changed
                    .wait_timeout_while(state, timeout, unfinished)
                    .unwrap();
                *state == SessionState::Terminated
            }
            None => {
                let _state = self.state_changed.wait_while(state, unfinished).unwrap();
                true
            }
        }
    }
}
