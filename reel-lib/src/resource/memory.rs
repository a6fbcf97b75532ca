//! In-memory provider for embedded assets and tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use super::{MediaKind, MediaStream, ResourceProvider};
use crate::error::Result;

/// Provider backed by a map of `(media, kind)` to bytes.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    assets: HashMap<(String, MediaKind), Arc<Vec<u8>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, media: &str, kind: MediaKind, bytes: Vec<u8>) {
        self.assets
            .insert((media.to_string(), kind), Arc::new(bytes));
    }

    pub fn with(mut self, media: &str, kind: MediaKind, bytes: Vec<u8>) -> Self {
        self.insert(media, kind, bytes);
        self
    }

    pub fn contains(&self, media: &str, kind: MediaKind) -> bool {
        self.assets.contains_key(&(media.to_string(), kind))
    }
}

impl ResourceProvider for MemoryProvider {
    fn open(&self, media: &str, kind: MediaKind) -> Result<Option<MediaStream>> {
        Ok(self
            .assets
            .get(&(media.to_string(), kind))
            .map(|bytes| Box::new(Cursor::new(SharedBytes(bytes.clone()))) as MediaStream))
    }
}

struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}
