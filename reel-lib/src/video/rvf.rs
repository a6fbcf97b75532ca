//! RVF: a minimal raw-frame container.
//!
//! Layout (little endian):
//!
//! ```text
//! "RVF1" | width: u16 | height: u16 | fps_milli: u32 | frame* (width * height * 3 RGB bytes)
//! ```
//!
//! Frames run until end of stream; there is no frame count in the header.

use std::io::{ErrorKind, Read, Write};

use log::warn;

use super::{pack_rgb, unpack_rgb, FrameDecoder, Raster, VideoHeader};
use crate::error::{ReelError, Result};

pub const RVF_MAGIC: &[u8; 4] = b"RVF1";
const HEADER_LEN: usize = 12;

/// Streaming RVF reader.
pub struct RvfDecoder<R: Read + Send> {
    reader: R,
    header: VideoHeader,
    frame_bytes: Vec<u8>,
    frames_read: u64,
    finished: bool,
}

impl<R: Read + Send> RvfDecoder<R> {
    /// Read and validate the header. Fails fast on anything malformed.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                ReelError::InvalidVideo("stream shorter than header".to_string())
            } else {
                ReelError::Io(err)
            }
        })?;

        if &header[0..4] != RVF_MAGIC {
            return Err(ReelError::InvalidVideo("bad magic".to_string()));
        }

        let width = u16::from_le_bytes([header[4], header[5]]) as u32;
        let height = u16::from_le_bytes([header[6], header[7]]) as u32;
        let fps_milli = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        if width == 0 || height == 0 {
            return Err(ReelError::InvalidVideo(format!(
                "zero frame dimensions {}x{}",
                width, height
            )));
        }
        if fps_milli == 0 {
            return Err(ReelError::InvalidVideo("zero frame rate".to_string()));
        }

        Ok(Self {
            reader,
            header: VideoHeader {
                width,
                height,
                fps: fps_milli as f64 / 1000.0,
            },
            frame_bytes: vec![0; width as usize * height as usize * 3],
            frames_read: 0,
            finished: false,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Fill `frame_bytes`; returns the number of bytes actually read.
    fn read_frame_bytes(&mut self) -> Result<usize> {
        let mut filled = 0;
        while filled < self.frame_bytes.len() {
            match self.reader.read(&mut self.frame_bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + Send> FrameDecoder for RvfDecoder<R> {
    fn header(&self) -> VideoHeader {
        self.header
    }

    fn decode_next(&mut self, target: &mut Raster) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }

        let filled = self.read_frame_bytes()?;
        if filled < self.frame_bytes.len() {
            if filled > 0 {
                warn!(
                    "rvf stream ends with a truncated frame ({} of {} bytes); ignoring it",
                    filled,
                    self.frame_bytes.len()
                );
            }
            self.finished = true;
            return Ok(false);
        }

        if target.width() != self.header.width || target.height() != self.header.height {
            *target = Raster::new(self.header.width, self.header.height);
        }
        for (pixel, rgb) in target
            .pixels_mut()
            .iter_mut()
            .zip(self.frame_bytes.chunks_exact(3))
        {
            *pixel = pack_rgb(rgb[0], rgb[1], rgb[2]);
        }
        target.set_stamp(self.frames_read);
        self.frames_read += 1;
        Ok(true)
    }
}

/// RVF stream writer.
pub struct RvfWriter<W: Write> {
    writer: W,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl<W: Write> RvfWriter<W> {
    pub fn new(mut writer: W, width: u16, height: u16, fps: f64) -> Result<Self> {
        let milli = (fps * 1000.0).round();
        if width == 0 || height == 0 || !(1.0..=u32::MAX as f64).contains(&milli) {
            return Err(ReelError::InvalidVideo(format!(
                "rvf needs non-zero dimensions and a frame rate between 0.001 and {}, got {}x{} @ {}",
                u32::MAX / 1000,
                width,
                height,
                fps
            )));
        }
        let fps_milli = milli as u32;
        writer.write_all(RVF_MAGIC)?;
        writer.write_all(&width.to_le_bytes())?;
        writer.write_all(&height.to_le_bytes())?;
        writer.write_all(&fps_milli.to_le_bytes())?;
        Ok(Self {
            writer,
            width: width as u32,
            height: height as u32,
            frames_written: 0,
        })
    }

    /// Append one frame of packed pixels.
    pub fn write_frame(&mut self, pixels: &[u32]) -> Result<()> {
        let expected = self.width as usize * self.height as usize;
        if pixels.len() != expected {
            return Err(ReelError::InvalidVideo(format!(
                "frame has {} pixels, expected {}",
                pixels.len(),
                expected
            )));
        }
        let mut bytes = Vec::with_capacity(expected * 3);
        for &pixel in pixels {
            let (r, g, b) = unpack_rgb(pixel);
            bytes.extend_from_slice(&[r, g, b]);
        }
        self.writer.write_all(&bytes)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
