//! Resource lookup: mapping a logical media name to byte streams.
//!
//! The engine only ever asks "give me the audio/video/subtitle stream for
//! `intro_1`"; where those bytes live is up to the provider.

mod directory;
mod memory;

use std::fmt::{Display, Formatter};
use std::io::Read;

use crate::error::Result;

pub use directory::DirectoryProvider;
pub use memory::MemoryProvider;

/// Kind of asset a media name can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
    Subtitle,
}

impl MediaKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Subtitle => "subtitle",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Readable asset stream handed to the engine.
pub type MediaStream = Box<dyn Read + Send>;

/// Source of media assets.
///
/// `Ok(None)` means the asset does not exist for this media, which is a
/// supported configuration for audio and subtitles. `Err` means the asset
/// exists but could not be opened.
pub trait ResourceProvider: Send + Sync {
    fn open(&self, media: &str, kind: MediaKind) -> Result<Option<MediaStream>>;
}

/// Read a whole stream into memory.
pub(crate) fn read_all(mut stream: MediaStream) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(bytes)
}
