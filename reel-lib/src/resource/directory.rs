//! Filesystem-backed provider.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;

use super::{MediaKind, MediaStream, ResourceProvider};
use crate::error::Result;

const AUDIO_EXTENSIONS: &[&str] = &["wav"];
const VIDEO_EXTENSIONS: &[&str] = &["rvf"];
const SUBTITLE_EXTENSIONS: &[&str] = &["sub", "txt"];

/// Resolves `<root>/<media>.<ext>`, trying each extension registered for the
/// requested kind in order.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
    audio_extensions: Vec<String>,
    video_extensions: Vec<String>,
    subtitle_extensions: Vec<String>,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            audio_extensions: to_owned(AUDIO_EXTENSIONS),
            video_extensions: to_owned(VIDEO_EXTENSIONS),
            subtitle_extensions: to_owned(SUBTITLE_EXTENSIONS),
        }
    }

    /// Replace the extension list used for `kind`.
    pub fn with_extensions(mut self, kind: MediaKind, extensions: &[&str]) -> Self {
        let list = to_owned(extensions);
        match kind {
            MediaKind::Audio => self.audio_extensions = list,
            MediaKind::Video => self.video_extensions = list,
            MediaKind::Subtitle => self.subtitle_extensions = list,
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path that `open` would read for this media and kind, if any exists.
    pub fn locate(&self, media: &str, kind: MediaKind) -> Option<PathBuf> {
        let extensions = match kind {
            MediaKind::Audio => &self.audio_extensions,
            MediaKind::Video => &self.video_extensions,
            MediaKind::Subtitle => &self.subtitle_extensions,
        };
        extensions
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", media, ext)))
            .find(|path| path.is_file())
    }
}

impl ResourceProvider for DirectoryProvider {
    fn open(&self, media: &str, kind: MediaKind) -> Result<Option<MediaStream>> {
        match self.locate(media, kind) {
            Some(path) => {
                debug!("resolved {} for '{}' to {}", kind, media, path.display());
                let file = File::open(&path)?;
                Ok(Some(Box::new(BufReader::new(file))))
            }
            None => Ok(None),
        }
    }
}

fn to_owned(extensions: &[&str]) -> Vec<String> {
    extensions.iter().map(|ext| ext.to_string()).collect()
}
