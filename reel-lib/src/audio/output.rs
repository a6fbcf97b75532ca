//! Audio output lines.
//!
//! An [`AudioOutput`] is shared with the session and opens one
//! [`AudioLine`] per playback on the audio worker thread, so the line
//! itself never has to cross threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::AudioSpan;
use crate::error::{ReelError, Result};

/// Parameters for opening a line sized to a prepared soundtrack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineRequest {
    pub sample_rate: u32,
    pub channels: u16,
    pub volume: f32,
    /// How often a blocking write checks for drain completion and halt.
    pub poll_interval: Duration,
}

/// Factory for output lines.
pub trait AudioOutput: Send + Sync {
    fn open(&self, request: &LineRequest) -> Result<Box<dyn AudioLine>>;
}

/// An opened output line.
pub trait AudioLine {
    /// Queue `pcm` (interleaved unsigned 8-bit) and block until it has fully
    /// drained or `halt` becomes true.
    fn play_to_end(&mut self, pcm: &[u8], halt: &AtomicBool) -> Result<()>;
}

/// Convert unsigned 8-bit PCM to the float samples rodio consumes.
pub fn to_f32(pcm: &[u8]) -> Vec<f32> {
    pcm.iter()
        .map(|&sample| (sample as f32 - 128.0) / 128.0)
        .collect()
}

/// Default-device output through rodio.
#[derive(Debug, Clone)]
pub struct RodioOutput {
    open_retries: usize,
    open_retry_delay: Duration,
}

impl RodioOutput {
    pub fn new(open_retries: usize, open_retry_delay: Duration) -> Self {
        Self {
            open_retries: open_retries.max(1),
            open_retry_delay,
        }
    }

    /// Retry policy taken from playback settings.
    pub fn from_settings(settings: &crate::playback::PlaybackSettings) -> Self {
        Self::new(
            settings.output_open_retries,
            settings.output_open_retry_delay(),
        )
    }

    /// Open the default output stream with bounded retry behavior.
    fn open_stream(&self) -> Result<OutputStream> {
        let mut attempt = 1;
        loop {
            match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    if attempt >= self.open_retries {
                        error!(
                            "failed to open default output stream after {} attempts: {}",
                            self.open_retries, err
                        );
                        return Err(ReelError::Device(err.to_string()));
                    }
                    warn!(
                        "open_default_stream attempt {}/{} failed: {}",
                        attempt, self.open_retries, err
                    );
                    thread::sleep(self.open_retry_delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new(
            crate::constants::OUTPUT_STREAM_OPEN_RETRIES,
            Duration::from_millis(crate::constants::OUTPUT_STREAM_OPEN_RETRY_MS),
        )
    }
}

impl AudioOutput for RodioOutput {
    fn open(&self, request: &LineRequest) -> Result<Box<dyn AudioLine>> {
        let stream = self.open_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.set_volume(request.volume);
        Ok(Box::new(RodioLine {
            _stream: stream,
            sink,
            request: *request,
        }))
    }
}

struct RodioLine {
    // Dropping the stream closes the device, so it lives as long as the sink.
    _stream: OutputStream,
    sink: Sink,
    request: LineRequest,
}

impl AudioLine for RodioLine {
    fn play_to_end(&mut self, pcm: &[u8], halt: &AtomicBool) -> Result<()> {
        let source = SamplesBuffer::new(
            self.request.channels,
            self.request.sample_rate,
            to_f32(pcm),
        );
        self.sink.append(source);
        self.sink.play();

        loop {
            if halt.load(Ordering::SeqCst) {
                debug!("halting audio line");
                self.sink.stop();
                break;
            }
            if self.sink.empty() {
                break;
            }
            thread::sleep(self.request.poll_interval);
        }
        Ok(())
    }
}

/// Output that discards samples.
///
/// With `realtime` set, a write blocks for the soundtrack's duration, which
/// keeps completion timing identical to a real device.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentOutput {
    realtime: bool,
}

impl SilentOutput {
    pub fn instant() -> Self {
        Self { realtime: false }
    }

    pub fn realtime() -> Self {
        Self { realtime: true }
    }
}

impl AudioOutput for SilentOutput {
    fn open(&self, request: &LineRequest) -> Result<Box<dyn AudioLine>> {
        Ok(Box::new(SilentLine {
            realtime: self.realtime,
            request: *request,
        }))
    }
}

struct SilentLine {
    realtime: bool,
    request: LineRequest,
}

impl AudioLine for SilentLine {
    fn play_to_end(&mut self, pcm: &[u8], halt: &AtomicBool) -> Result<()> {
        if !self.realtime {
            return Ok(());
        }
        let span = AudioSpan {
            bytes: pcm.len() as u64,
            sample_rate: self.request.sample_rate,
            channels: self.request.channels,
        };
        let deadline = Instant::now() + span.duration();
        while !halt.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(self.request.poll_interval));
        }
        Ok(())
    }
}
