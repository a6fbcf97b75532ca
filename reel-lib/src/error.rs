//! Error type shared by the synchronous parts of the engine.
//!
//! Worker threads never return these across the thread boundary; they log
//! them and fall back to contributing nothing further to the session.

use std::fmt::{Display, Formatter};

use crate::resource::MediaKind;

/// Error type for session start-up, resource parsing and device access.
#[derive(Debug)]
pub enum ReelError {
    Io(std::io::Error),
    MissingResource { media: String, kind: MediaKind },
    InvalidVideo(String),
    Decode(String),
    UnsupportedFormat(String),
    Device(String),
    Subtitle { line: usize, reason: String },
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    Settings(String),
}

impl Display for ReelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::MissingResource { media, kind } => {
                write!(f, "no {} resource for media '{}'", kind, media)
            }
            Self::InvalidVideo(err) => write!(f, "invalid video stream: {}", err),
            Self::Decode(err) => write!(f, "decode error: {}", err),
            Self::UnsupportedFormat(err) => write!(f, "unsupported format: {}", err),
            Self::Device(err) => write!(f, "audio device error: {}", err),
            Self::Subtitle { line, reason } => {
                write!(f, "subtitle parse error on line {}: {}", line, reason)
            }
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {} a session in state {}", operation, state)
            }
            Self::Settings(err) => write!(f, "invalid playback settings: {}", err),
        }
    }
}

impl std::error::Error for ReelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReelError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<symphonia::core::errors::Error> for ReelError {
    fn from(value: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error;

        match value {
            Error::IoError(err) => Self::Io(err),
            Error::Unsupported(what) => Self::UnsupportedFormat(what.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(value: serde_json::Error) -> Self {
        Self::Settings(value.to_string())
    }
}

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, ReelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_resource_names_kind_and_media() {
        let err = ReelError::MissingResource {
            media: "intro_1".to_string(),
            kind: MediaKind::Video,
        };
        assert_eq!(err.to_string(), "no video resource for media 'intro_1'");
    }

    #[test]
    fn symphonia_unsupported_maps_to_format_error() {
        let err: ReelError = symphonia::core::errors::Error::Unsupported("adpcm").into();
        assert!(matches!(err, ReelError::UnsupportedFormat(_)));
    }
}
