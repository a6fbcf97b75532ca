//! # Reel Playback Library
//!
//! Synchronized audio/video playback for short clips: an audio worker and a
//! video worker meet at a start barrier, run independently, and meet again
//! at a completion barrier before the host hears that playback is done.
//! Frames reach the renderer through a double buffer; positions, subtitle
//! changes and completion reach the host through an executor port.

pub mod audio;
pub mod constants;
pub mod error;
pub mod frame;
pub mod playback;
pub mod probe;
pub mod resource;
pub mod subtitle;
pub mod video;

pub use error::{ReelError, Result};
pub use frame::{FrameBuffer, FrameSink, NullSink};
pub use playback::{
    FrameTick, HostCallbacks, HostExecutor, InlineExecutor, MediaPlayer, PlaybackSession,
    PlaybackSettings, QueuedExecutor, SessionEnv, SessionState,
};
pub use probe::{probe, MediaInfo};
pub use resource::{DirectoryProvider, MediaKind, MemoryProvider, ResourceProvider};
