//! Media inspection without playback.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use log::debug;

use crate::audio::{decode_pcm, AudioSpan};
use crate::error::{ReelError, Result};
use crate::resource::{read_all, MediaKind, ResourceProvider};
use crate::subtitle::SubtitleTrack;
use crate::video::{Raster, RvfCodec, VideoCodec, VideoHeader};

/// What a session for this media would play.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub media: String,
    pub video: VideoHeader,
    /// Frames actually present in the video stream.
    pub frame_count: u64,
    pub audio: Option<AudioSpan>,
    pub subtitle_cues: Option<usize>,
}

impl MediaInfo {
    pub fn video_duration(&self) -> Duration {
        self.video.frame_time(self.frame_count)
    }

    pub fn audio_duration(&self) -> Option<Duration> {
        self.audio.map(|span| span.duration())
    }

    /// Position ticks a full playback emits: the decoded frames, extended to
    /// cover the soundtrack when it runs longer.
    pub fn playback_frames(&self) -> u64 {
        let audio_frames = self
            .audio
            .map(|span| span.video_frames(self.video.fps))
            .unwrap_or(0);
        self.frame_count.max(audio_frames)
    }

    pub fn playback_duration(&self) -> Duration {
        self.video.frame_time(self.playback_frames())
    }
}

impl Display for MediaInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "media:     {}", self.media)?;
        writeln!(
            f,
            "video:     {}x{} @ {:.3} fps, {} frames ({:.3}s)",
            self.video.width,
            self.video.height,
            self.video.fps,
            self.frame_count,
            self.video_duration().as_secs_f64()
        )?;
        match &self.audio {
            Some(span) => writeln!(
                f,
                "audio:     {} Hz, {} ch, {:.3}s",
                span.sample_rate,
                span.channels,
                span.duration().as_secs_f64()
            )?,
            None => writeln!(f, "audio:     none")?,
        }
        match self.subtitle_cues {
            Some(cues) => writeln!(f, "subtitles: {} cues", cues)?,
            None => writeln!(f, "subtitles: none")?,
        }
        write!(
            f,
            "playback:  {} ticks ({:.3}s)",
            self.playback_frames(),
            self.playback_duration().as_secs_f64()
        )
    }
}

/// Inspect `media` using the RVF codec.
pub fn probe(provider: &dyn ResourceProvider, media: &str) -> Result<MediaInfo> {
    probe_with(provider, &RvfCodec, media)
}

/// Inspect `media`, decoding every resource it has.
///
/// Unlike a session, which shrugs off a broken soundtrack or caption file,
/// probing reports every unreadable resource as an error.
pub fn probe_with(
    provider: &dyn ResourceProvider,
    codec: &dyn VideoCodec,
    media: &str,
) -> Result<MediaInfo> {
    let stream = provider
        .open(media, MediaKind::Video)?
        .ok_or_else(|| ReelError::MissingResource {
            media: media.to_string(),
            kind: MediaKind::Video,
        })?;
    let mut decoder = codec.open(stream)?;
    let video = decoder.header();
    video.validate()?;

    let mut raster = Raster::new(video.width, video.height);
    let mut frame_count = 0;
    while decoder.decode_next(&mut raster)? {
        frame_count += 1;
    }

    let audio = match provider.open(media, MediaKind::Audio)? {
        Some(stream) => Some(decode_pcm(read_all(stream)?)?.span()),
        None => None,
    };

    let subtitle_cues = match provider.open(media, MediaKind::Subtitle)? {
        Some(stream) => Some(SubtitleTrack::from_reader(stream)?.len()),
        None => None,
    };

    debug!(
        "probed '{}': {} frames, audio {:?}, {:?} cues",
        media, frame_count, audio, subtitle_cues
    );

    Ok(MediaInfo {
        media: media.to_string(),
        video,
        frame_count,
        audio,
        subtitle_cues,
    })
}
