//! Video frame sources.
//!
//! The bit-level decode of a frame is treated as an atomic step behind
//! [`FrameDecoder`]; the engine only cares about dimensions, frame rate and
//! "write the next frame into this raster".

mod raster;
mod rvf;

use std::time::Duration;

use crate::error::{ReelError, Result};
use crate::resource::MediaStream;

pub use raster::{pack_rgb, unpack_rgb, Raster};
pub use rvf::{RvfDecoder, RvfWriter, RVF_MAGIC};

/// Stream-level properties known before the first frame is decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoHeader {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoHeader {
    /// Non-zero dimensions and a finite, positive frame rate.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::InvalidVideo(format!(
                "zero frame dimensions {}x{}",
                self.width, self.height
            )));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ReelError::InvalidVideo(format!(
                "unusable frame rate {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Display interval of a single frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }

    /// Presentation time of frame `index` relative to the first frame.
    pub fn frame_time(&self, index: u64) -> Duration {
        Duration::from_nanos((index as f64 * 1e9 / self.fps).round() as u64)
    }
}

/// Sequential frame decoder.
pub trait FrameDecoder: Send {
    fn header(&self) -> VideoHeader;

    /// Decode the next frame into `target`.
    ///
    /// Returns `Ok(false)` at end of stream, in which case `target` must be
    /// left untouched.
    fn decode_next(&mut self, target: &mut Raster) -> Result<bool>;
}

/// Opens a [`FrameDecoder`] over a video resource stream.
pub trait VideoCodec: Send + Sync {
    fn open(&self, stream: MediaStream) -> Result<Box<dyn FrameDecoder>>;
}

/// Codec for the RVF raw-frame container.
#[derive(Debug, Default, Clone, Copy)]
pub struct RvfCodec;

impl VideoCodec for RvfCodec {
    fn open(&self, stream: MediaStream) -> Result<Box<dyn FrameDecoder>> {
        Ok(Box::new(RvfDecoder::new(stream)?))
    }
}
