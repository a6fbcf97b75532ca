//! Session shapes and their pre-sized barriers.
//!
//! The shape is decided once, when `start()` has resolved resources, and
//! never changes afterwards. Each variant carries barriers sized for exactly
//! the workers that will run, so no party count is ever adjusted at runtime.
//!
//! Only the completion barrier takes a grace period. The start barrier waits
//! for as long as audio preparation takes: video pacing must not begin before
//! the soundtrack has reported its length, and every worker exit path
//! arrives there through its guard anyway.

use std::sync::Arc;
use std::time::Duration;

use super::rendezvous::Rendezvous;

#[derive(Debug, Clone)]
pub enum SessionShape {
    /// Video worker alone: start barrier of 1, completion barrier of 2
    /// (video + completion waiter).
    VideoOnly {
        start: Arc<Rendezvous>,
        completion: Arc<Rendezvous>,
    },
    /// Video and audio workers: start barrier of 2, completion barrier of 3.
    VideoPlusAudio {
        start: Arc<Rendezvous>,
        completion: Arc<Rendezvous>,
    },
}

impl SessionShape {
    /// `completion_grace` bounds the completion wait once the video worker
    /// is in.
    pub fn video_only(completion_grace: Option<Duration>) -> Self {
        Self::VideoOnly {
            start: Arc::new(Rendezvous::new("start", 1, None)),
            completion: Arc::new(Rendezvous::new("completion", 2, completion_grace)),
        }
    }

    pub fn video_plus_audio(completion_grace: Option<Duration>) -> Self {
        Self::VideoPlusAudio {
            start: Arc::new(Rendezvous::new("start", 2, None)),
            completion: Arc::new(Rendezvous::new("completion", 3, completion_grace)),
        }
    }

    pub fn has_audio(&self) -> bool {
        matches!(self, Self::VideoPlusAudio { .. })
    }

    /// Number of decoder workers this shape runs.
    pub fn workers(&self) -> usize {
        match self {
            Self::VideoOnly { .. } => 1,
            Self::VideoPlusAudio { .. } => 2,
        }
    }

    pub fn start(&self) -> &Arc<Rendezvous> {
        match self {
            Self::VideoOnly { start, .. } | Self::VideoPlusAudio { start, .. } => start,
        }
    }

    pub fn completion(&self) -> &Arc<Rendezvous> {
        match self {
            Self::VideoOnly { completion, .. } | Self::VideoPlusAudio { completion, .. } => {
                completion
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VideoOnly { .. } => "video only",
            Self::VideoPlusAudio { .. } => "video + audio",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::rendezvous::Crossing;

    #[test]
    fn barrier_sizes_follow_worker_count() {
        let video = SessionShape::video_only(None);
        assert_eq!(video.workers(), 1);
        assert_eq!(video.start().parties(), 1);
        assert_eq!(video.completion().parties(), 2);

        let both = SessionShape::video_plus_audio(None);
        assert!(both.has_audio());
        assert_eq!(both.start().parties(), 2);
        assert_eq!(both.completion().parties(), both.workers() + 1);
    }

    #[test]
    fn start_barrier_never_gives_up() {
        let both = SessionShape::video_plus_audio(Some(Duration::from_millis(1)));
        let video = {
            let start = both.start().clone();
            std::thread::spawn(move || start.anchor_and_wait())
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(!both.start().is_released());

        both.start().arrive();
        assert_eq!(video.join().unwrap(), Crossing::Released);
    }
}
