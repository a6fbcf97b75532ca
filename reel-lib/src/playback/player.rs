//! High-level player facade.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{info, warn};

use super::session::{PlaybackSession, SessionEnv};
use super::HostCallbacks;
use crate::error::Result;
use crate::frame::FrameSink;
use crate::playback::PlaybackSettings;
use crate::resource::ResourceProvider;

/// Owns the collaborators shared by every session and tracks the current one.
///
/// One session at a time is the caller's responsibility: `play()` while a
/// session is still active logs a warning and starts the new one anyway. The
/// player keeps only the newest handle, so a replaced session that nobody
/// else holds is terminated when it drops.
#[derive(Clone)]
pub struct MediaPlayer {
    env: SessionEnv,
    current: Arc<Mutex<Option<Arc<PlaybackSession>>>>,
}

impl MediaPlayer {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self::with_env(SessionEnv::new(provider))
    }

    pub fn with_env(env: SessionEnv) -> Self {
        Self {
            env,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn env(&self) -> &SessionEnv {
        &self.env
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.env.settings
    }

    /// Build and start a session for `media`.
    pub fn play(
        &self,
        media: &str,
        sink: Arc<dyn FrameSink>,
        callbacks: HostCallbacks,
    ) -> Result<Arc<PlaybackSession>> {
        if let Some(active) = self.current().filter(|session| session.state().is_active()) {
            warn!(
                "starting '{}' while '{}' is still {}",
                media,
                active.media(),
                active.state().label()
            );
        }

        let session = Arc::new(PlaybackSession::new(
            media,
            self.env.clone(),
            sink,
            callbacks,
        ));
        session.start()?;
        info!("playing '{}'", media);
        *self.current.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    /// Stop the current session, if any.
    pub fn stop(&self) -> Result<()> {
        match self.current() {
            Some(session) => session.stop(),
            None => Ok(()),
        }
    }

    /// Terminate the current session, if any.
    pub fn terminate(&self) {
        if let Some(session) = self.current() {
            session.terminate();
        }
    }

    pub fn current(&self) -> Option<Arc<PlaybackSession>> {
        self.current.lock().unwrap().clone()
    }

    /// Block until the current session has finished.
    pub fn wait(&self) {
        if let Some(session) = self.current() {
            session.wait();
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.current() {
            Some(session) => session.wait_timeout(timeout),
            None => true,
        }
    }
}
