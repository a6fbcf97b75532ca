#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reel_lib::audio::{AudioLine, AudioOutput, LineRequest, SilentOutput};
use reel_lib::video::{pack_rgb, RvfWriter};
use reel_lib::{
    FrameBuffer, FrameSink, FrameTick, HostCallbacks, MemoryProvider, PlaybackSettings, ReelError,
    SessionEnv,
};

/// Unsigned 8-bit WAV bytes.
pub fn wav_u8(sample_rate: u32, channels: u16, samples: &[u8]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample((sample as i16 - 128) as i8).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Mono soundtrack of `seconds` at `sample_rate`.
pub fn tone(sample_rate: u32, seconds: f64) -> Vec<u8> {
    let count = (sample_rate as f64 * seconds).round() as usize;
    let samples: Vec<u8> = (0..count).map(|i| if i % 50 < 25 { 96 } else { 160 }).collect();
    wav_u8(sample_rate, 1, &samples)
}

/// RVF clip whose frame `n` is filled with grey level `n`.
pub fn clip(frames: usize, fps: f64) -> Vec<u8> {
    let mut writer = RvfWriter::new(Vec::new(), 4, 3, fps).unwrap();
    for index in 0..frames {
        let level = (index % 256) as u8;
        writer
            .write_frame(&[pack_rgb(level, level, level); 12])
            .unwrap();
    }
    writer.finish().unwrap()
}

pub fn quick_settings() -> PlaybackSettings {
    PlaybackSettings {
        rendezvous_grace_ms: Some(2_000),
        pacing_slice_ms: 5,
        drain_poll_ms: 5,
        ..PlaybackSettings::default()
    }
}

pub fn env(provider: MemoryProvider) -> SessionEnv {
    SessionEnv::new(Arc::new(provider))
        .with_output(Arc::new(SilentOutput::instant()))
        .with_settings(quick_settings())
}

/// Frame sink that remembers what it was shown.
#[derive(Default)]
pub struct RecordingSink {
    pub dimensions: Mutex<Option<(u32, u32)>>,
    pub frames: Mutex<Option<Arc<FrameBuffer>>>,
    pub swaps: Mutex<Vec<u64>>,
    /// Front-buffer stamp observed at each swap.
    pub stamps: Mutex<Vec<Option<u64>>>,
}

impl FrameSink for RecordingSink {
    fn on_init(&self, width: u32, height: u32, frames: Arc<FrameBuffer>) {
        *self.dimensions.lock().unwrap() = Some((width, height));
        *self.frames.lock().unwrap() = Some(frames);
    }

    fn on_swap(&self, frame_index: u64) {
        self.swaps.lock().unwrap().push(frame_index);
        if let Some(frames) = self.frames.lock().unwrap().as_ref() {
            let stamp = frames.with_front(|front| front.stamp());
            self.stamps.lock().unwrap().push(stamp);
        }
    }
}

/// Everything the host heard from a session.
#[derive(Default)]
pub struct Recorder {
    pub ticks: Mutex<Vec<FrameTick>>,
    pub labels: Mutex<Vec<Option<String>>>,
    pub completions: AtomicUsize,
}

impl Recorder {
    pub fn callbacks(self: &Arc<Self>) -> HostCallbacks {
        let ticks = self.clone();
        let labels = self.clone();
        let completions = self.clone();
        HostCallbacks::new()
            .on_position(move |tick| ticks.ticks.lock().unwrap().push(tick))
            .on_label(move |label| labels.labels.lock().unwrap().push(label))
            .on_complete(move || {
                completions.completions.fetch_add(1, Ordering::SeqCst);
            })
    }

    pub fn ticks(&self) -> Vec<FrameTick> {
        self.ticks.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<Option<String>> {
        self.labels.lock().unwrap().clone()
    }

    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

/// Output whose device can never be opened.
pub struct BrokenOutput;

impl AudioOutput for BrokenOutput {
    fn open(&self, _request: &LineRequest) -> reel_lib::Result<Box<dyn AudioLine>> {
        Err(ReelError::Device("no output device".to_string()))
    }
}

/// Output whose line ignores halt requests and blocks for `hold`.
pub struct StuckOutput {
    pub hold: Duration,
}

struct StuckLine {
    hold: Duration,
}

impl AudioOutput for StuckOutput {
    fn open(&self, _request: &LineRequest) -> reel_lib::Result<Box<dyn AudioLine>> {
        Ok(Box::new(StuckLine { hold: self.hold }))
    }
}

impl AudioLine for StuckLine {
    fn play_to_end(&mut self, _pcm: &[u8], _halt: &AtomicBool) -> reel_lib::Result<()> {
        thread::sleep(self.hold);
        Ok(())
    }
}

/// Output whose device takes `delay` to open; the line itself is silent.
pub struct SlowOutput {
    pub delay: Duration,
}

impl AudioOutput for SlowOutput {
    fn open(&self, request: &LineRequest) -> reel_lib::Result<Box<dyn AudioLine>> {
        thread::sleep(self.delay);
        SilentOutput::instant().open(request)
    }
}
