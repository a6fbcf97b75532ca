//! Soundtrack decode, transform and output.

pub mod decode;
pub mod output;
pub mod transform;

use std::time::Duration;

pub use decode::decode_pcm;
pub use output::{AudioLine, AudioOutput, LineRequest, RodioOutput, SilentOutput};

/// Fully decoded soundtrack: interleaved unsigned 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<u8>,
}

impl PcmClip {
    pub fn span(&self) -> AudioSpan {
        AudioSpan {
            bytes: self.samples.len() as u64,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Length of a prepared soundtrack, as reported by the audio worker to the
/// video worker before playback starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpan {
    pub bytes: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioSpan {
    /// Number of sample frames (one sample per channel).
    pub fn sample_frames(&self) -> u64 {
        self.bytes / self.channels.max(1) as u64
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.sample_frames() as f64 / self.sample_rate as f64)
    }

    /// Number of video frames at `fps` needed to cover this soundtrack.
    pub fn video_frames(&self, fps: f64) -> u64 {
        if self.sample_rate == 0 || fps <= 0.0 {
            return 0;
        }
        let exact = self.sample_frames() as f64 * fps / self.sample_rate as f64;
        // Absorb float noise so an exact multiple does not round up.
        (exact - 1e-9).ceil().max(0.0) as u64
    }
}
