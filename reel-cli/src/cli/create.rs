//! `reel create`: default payloads and generated sample media.

use std::f32::consts::TAU;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use log::info;

use reel_lib::video::{pack_rgb, RvfWriter};
use reel_lib::{PlaybackSettings, ReelError, Result};

use super::args::media_dir;

const SAMPLE_RATE: u32 = 22_050;
const TONE_HZ: f32 = 440.0;
const FRAME_WIDTH: u16 = 64;
const FRAME_HEIGHT: u16 = 36;

pub fn run_create(args: &ArgMatches) -> Result<i32> {
    match args.subcommand() {
        Some(("settings-json", _)) => {
            println!("{}", PlaybackSettings::default().to_json_pretty()?);
            Ok(0)
        }
        Some(("sample", sample_args)) => run_sample(sample_args),
        _ => Ok(-1),
    }
}

fn run_sample(args: &ArgMatches) -> Result<i32> {
    let media = args
        .get_one::<String>("MEDIA")
        .map(String::as_str)
        .unwrap_or("sample");
    let dir = media_dir(args);
    let seconds = args.get_one::<f64>("seconds").copied().unwrap_or(5.0).max(0.0);
    let frames = args.get_one::<u32>("frames").copied().unwrap_or(40);
    let fps = args.get_one::<f64>("fps").copied().unwrap_or(10.0);
    if fps <= 0.0 {
        return Err(ReelError::InvalidVideo(format!("fps must be positive, got {}", fps)));
    }

    fs::create_dir_all(&dir)?;
    let audio = write_tone(&dir.join(format!("{}.wav", media)), seconds)?;
    let video = write_gradient(&dir.join(format!("{}.rvf", media)), frames, fps)?;
    let subtitles = write_subtitles(&dir.join(format!("{}.sub", media)), seconds)?;

    for path in [&audio, &video, &subtitles] {
        info!("wrote {}", path.display());
        println!("{}", path.display());
    }
    Ok(0)
}

/// Mono unsigned 8-bit sine tone.
fn write_tone(path: &Path, seconds: f64) -> Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
    let count = (SAMPLE_RATE as f64 * seconds).round() as usize;
    for index in 0..count {
        let phase = TAU * TONE_HZ * index as f32 / SAMPLE_RATE as f32;
        writer
            .write_sample((phase.sin() * 48.0) as i8)
            .map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(path.to_path_buf())
}

/// Gradient that shifts hue from the first frame to the last.
fn write_gradient(path: &Path, frames: u32, fps: f64) -> Result<PathBuf> {
    let file = BufWriter::new(File::create(path)?);
    let mut writer = RvfWriter::new(file, FRAME_WIDTH, FRAME_HEIGHT, fps)?;
    let (width, height) = (FRAME_WIDTH as u32, FRAME_HEIGHT as u32);
    let mut pixels = vec![0u32; (width * height) as usize];
    for frame in 0..frames {
        let blue = gradient_blue(frame, frames);
        for y in 0..height {
            for x in 0..width {
                let red = (x * 255 / width.max(1)) as u8;
                let green = (y * 255 / height.max(1)) as u8;
                pixels[(y * width + x) as usize] = pack_rgb(red, green, blue);
            }
        }
        writer.write_frame(&pixels)?;
    }
    writer.finish()?.flush()?;
    Ok(path.to_path_buf())
}

/// Blue level of `frame`, ramping from 0 towards 255 over the clip.
fn gradient_blue(frame: u32, frames: u32) -> u8 {
    (frame as u64 * 255 / frames.max(1) as u64) as u8
}

/// One numbered cue per second of soundtrack.
fn write_subtitles(path: &Path, seconds: f64) -> Result<PathBuf> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "# generated by reel create sample")?;
    let cues = seconds.ceil().max(1.0) as u64;
    for second in 0..cues {
        writeln!(file, "{} Scene {}", second * 1_000, second + 1)?;
    }
    file.flush()?;
    Ok(path.to_path_buf())
}

fn wav_error(err: hound::Error) -> ReelError {
    match err {
        hound::Error::IoError(err) => ReelError::Io(err),
        other => ReelError::Io(io::Error::new(io::ErrorKind::Other, other)),
    }
}
