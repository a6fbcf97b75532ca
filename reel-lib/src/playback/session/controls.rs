//! Lifecycle operations for `PlaybackSession`.
//!
//! `start()` does all fallible work (resource resolution, container header
//! parsing) before a single thread exists; afterwards nothing the workers
//! encounter is reported back as an error, only logged.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::runtime::{spawn_named, ArrivalGuard, AudioWorker, CompletionWaiter, VideoWorker};
use super::{PlaybackSession, SessionTimeline};
use crate::audio::AudioSpan;
use crate::error::{ReelError, Result};
use crate::frame::FrameBuffer;
use crate::playback::{SessionShape, SessionState};
use crate::resource::{MediaKind, MediaStream};
use crate::subtitle::SubtitleTrack;
use crate::video::FrameDecoder;

/// Everything `start()` resolved before spawning.
struct Resolved {
    decoder: Box<dyn FrameDecoder>,
    audio: Option<MediaStream>,
    subtitles: Option<SubtitleTrack>,
}

impl PlaybackSession {
    /// Resolve resources and launch the workers.
    ///
    /// Valid only from `Idle`. A missing or unreadable video resource fails
    /// here, before any thread is spawned, and leaves the session `Idle`.
    /// A missing audio or subtitle resource silently degrades the session.
    pub fn start(&self) -> Result<()> {
        self.expect_state("start", &[SessionState::Idle])?;

        let resolved = self.resolve()?;
        let grace = self.env.settings.rendezvous_grace();
        let shape = if resolved.audio.is_some() {
            SessionShape::video_plus_audio(grace)
        } else {
            SessionShape::video_only(grace)
        };

        if !self
            .shared
            .transition(&[SessionState::Idle], SessionState::Starting)
        {
            return Err(self.invalid_state("start"));
        }
        self.shared
            .update_timeline(|timeline| timeline.started_at = Some(Instant::now()));
        info!(
            "starting '{}' ({}, subtitles: {})",
            self.shared.media,
            shape.label(),
            resolved.subtitles.is_some()
        );

        let callbacks = self.callbacks.lock().unwrap().take().unwrap_or_default();
        let media = self.shared.media.clone();

        // Every worker exists, holding its barrier guards, before any thread
        // is spawned: a worker that never gets a thread still arrives when it
        // is dropped.
        let waiter = CompletionWaiter {
            shared: self.shared.clone(),
            barrier: shape.completion().clone(),
            executor: self.env.executor.clone(),
            on_complete: callbacks.on_complete,
        };
        let audio = resolved.audio.map(|stream| AudioWorker {
            shared: self.shared.clone(),
            stream,
            output: self.env.output.clone(),
            settings: self.env.settings.clone(),
            start: ArrivalGuard::new(shape.start().clone()),
            completion: ArrivalGuard::new(shape.completion().clone()),
        });
        let video = VideoWorker {
            shared: self.shared.clone(),
            decoder: resolved.decoder,
            sink: self.sink.clone(),
            subtitles: resolved.subtitles,
            executor: self.env.executor.clone(),
            on_position: callbacks.on_position,
            on_label: callbacks.on_label,
            settings: self.env.settings.clone(),
            start: ArrivalGuard::anchor(shape.start().clone()),
            completion: ArrivalGuard::anchor(shape.completion().clone()),
        };

        let mut handles = self.handles.lock().unwrap();
        match spawn_named(format!("reel-complete:{}", media), move || waiter.run()) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                // Nobody would ever finish the session; do it here.
                self.abandon(&err);
                self.shared.mark_finished();
                return Err(err);
            }
        }
        if let Some(worker) = audio {
            match spawn_named(format!("reel-audio:{}", media), move || worker.run()) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    self.abandon(&err);
                    return Err(err);
                }
            }
        }
        match spawn_named(format!("reel-video:{}", media), move || video.run()) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                self.abandon(&err);
                return Err(err);
            }
        }

        Ok(())
    }

    /// Ask both workers to wind down.
    ///
    /// The audio line halts at its next drain poll and the video worker exits
    /// at its next frame boundary. Completion is still reported once both
    /// have exited. Stopping a session that is already winding down is a
    /// no-op.
    pub fn stop(&self) -> Result<()> {
        let state = self.shared.state();
        match state {
            SessionState::Idle => Err(self.invalid_state("stop")),
            SessionState::Starting | SessionState::Playing => {
                self.shared.request_stop();
                self.shared.transition(
                    &[SessionState::Starting, SessionState::Playing],
                    SessionState::Stopping,
                );
                info!("stopping '{}'", self.shared.media);
                Ok(())
            }
            SessionState::Stopping | SessionState::Terminated => Ok(()),
        }
    }

    /// Stop and suppress the completion callback.
    ///
    /// For hosts tearing down: no host callback is delivered after this
    /// returns, apart from ones already running. Never fails; an idle session
    /// goes straight to `Terminated`.
    pub fn terminate(&self) {
        self.shared.mark_terminated();
        self.shared.request_stop();
        if self
            .shared
            .transition(&[SessionState::Idle], SessionState::Terminated)
        {
            debug!("terminated idle session '{}'", self.shared.media);
            return;
        }
        if self.shared.transition(
            &[SessionState::Starting, SessionState::Playing],
            SessionState::Stopping,
        ) {
            info!("terminating '{}'", self.shared.media);
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// True once the completion barrier has released. Already true inside
    /// the `on_complete` callback.
    pub fn is_finished(&self) -> bool {
        self.shared.state() == SessionState::Terminated
    }

    /// Whether completion was forced after a worker failed to arrive within
    /// the rendezvous grace period.
    pub fn completion_forced(&self) -> bool {
        self.shared.was_forced()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.shared.is_stop_requested()
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.is_terminated()
    }

    /// Block until the session is finished and its threads have exited.
    /// Threads left behind by a forced completion are not waited for.
    ///
    /// Returns immediately for a session that was never started.
    pub fn wait(&self) {
        if self.shared.state() == SessionState::Idle {
            return;
        }
        self.shared.wait_finished(None);
        self.join_threads();
    }

    /// Like [`wait`](Self::wait) with an upper bound; returns whether the
    /// session finished in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.shared.state() == SessionState::Idle {
            return false;
        }
        let finished = self.shared.wait_finished(Some(timeout));
        if finished {
            self.join_threads();
        }
        finished
    }

    /// The session's double buffer, shared with the frame sink.
    pub fn frames(&self) -> Arc<FrameBuffer> {
        self.shared.frames.clone()
    }

    /// Soundtrack length as reported by the audio worker, if any.
    pub fn audio_span(&self) -> Option<AudioSpan> {
        self.shared.audio_span()
    }

    /// Position ticks emitted so far.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks()
    }

    /// Ticks that carried new pixel data.
    pub fn fresh_frames(&self) -> u64 {
        self.shared.fresh_frames()
    }

    pub fn timeline(&self) -> SessionTimeline {
        self.shared.timeline()
    }

    fn resolve(&self) -> Result<Resolved> {
        let media = self.shared.media.as_str();
        let provider = self.env.provider.as_ref();

        let video = provider
            .open(media, MediaKind::Video)?
            .ok_or_else(|| ReelError::MissingResource {
                media: media.to_string(),
                kind: MediaKind::Video,
            })?;
        let decoder = self.env.codec.open(video)?;
        // Codecs plugged in through `SessionEnv::with_codec` validate nothing.
        decoder.header().validate()?;

        let audio = match provider.open(media, MediaKind::Audio) {
            Ok(audio) => audio,
            Err(err) => {
                warn!("audio for '{}' unreadable, playing without sound: {}", media, err);
                None
            }
        };

        let subtitles = match provider.open(media, MediaKind::Subtitle) {
            Ok(Some(stream)) => match SubtitleTrack::from_reader(stream) {
                Ok(track) => Some(track),
                Err(err) => {
                    warn!("ignoring subtitles for '{}': {}", media, err);
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!("ignoring subtitles for '{}': {}", media, err);
                None
            }
        };

        Ok(Resolved {
            decoder,
            audio,
            subtitles,
        })
    }

    /// Thread creation failed part-way: stop whatever is already running.
    /// `start()` reports the failure, so no completion follows it.
    fn abandon(&self, err: &ReelError) {
        warn!(
            "could not spawn session threads for '{}': {}",
            self.shared.media, err
        );
        self.shared.mark_terminated();
        self.shared.request_stop();
        self.shared.transition(
            &[SessionState::Starting, SessionState::Playing],
            SessionState::Stopping,
        );
    }

    fn join_threads(&self) {
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        let forced = self.shared.was_forced();
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                // wait() from a callback running on the completion waiter.
                continue;
            }
            if forced && !handle.is_finished() {
                // A straggler the completion barrier gave up on; leave it be.
                debug!(
                    "detaching {} for '{}'",
                    handle.thread().name().unwrap_or("session thread"),
                    self.shared.media
                );
                continue;
            }
            if handle.join().is_err() {
                warn!("session thread for '{}' panicked during join", self.shared.media);
            }
        }
    }

    fn expect_state(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.shared.state()) {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> ReelError {
        ReelError::InvalidState {
            operation,
            state: self.shared.state().label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::audio::SilentOutput;
    use crate::frame::NullSink;
    use crate::playback::session::SessionEnv;
    use crate::playback::HostCallbacks;
    use crate::resource::MemoryProvider;
    use crate::video::RvfWriter;

    fn clip(frames: u32, fps: f64) -> Vec<u8> {
        let mut writer = RvfWriter::new(Vec::new(), 2, 2, fps).unwrap();
        for _ in 0..frames {
            writer.write_frame(&[0; 4]).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn abandoned_start_never_reports_completion() {
        let provider = MemoryProvider::new().with("clip", MediaKind::Video, clip(200, 50.0));
        let env = SessionEnv::new(Arc::new(provider)).with_output(Arc::new(SilentOutput::instant()));
        let completions = Arc::new(AtomicUsize::new(0));
        let counted = completions.clone();
        let session = PlaybackSession::new(
            "clip",
            env,
            Arc::new(NullSink),
            HostCallbacks::new().on_complete(move || {
                counted.fetch_add(1, Ordering::SeqCst);
            }),
        );

        session.start().unwrap();
        // As if the last worker thread could not be spawned.
        session.abandon(&ReelError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no threads left",
        )));

        assert!(session.wait_timeout(Duration::from_secs(5)));
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert!(session.ticks() < 200);
    }
}
