//! Audio decoder worker.
//!
//! Decodes the whole soundtrack, runs the 8-bit transform, opens a line,
//! reports the prepared length, meets the video worker at the start barrier
//! and then blocks writing the buffer until it drains or a stop arrives.

use std::sync::Arc;

use log::{debug, warn};

use super::guard::ArrivalGuard;
use super::shared::SessionShared;
use crate::audio::{decode_pcm, transform, AudioLine, AudioOutput, AudioSpan, LineRequest};
use crate::error::Result;
use crate::playback::PlaybackSettings;
use crate::resource::{read_all, MediaStream};

pub(in crate::playback::session) struct AudioWorker {
    pub(in crate::playback::session) shared: Arc<SessionShared>,
    pub(in crate::playback::session) stream: MediaStream,
    pub(in crate::playback::session) output: Arc<dyn AudioOutput>,
    pub(in crate::playback::session) settings: PlaybackSettings,
    pub(in crate::playback::session) start: ArrivalGuard,
    pub(in crate::playback::session) completion: ArrivalGuard,
}

struct PreparedAudio {
    pcm: Vec<u8>,
    span: AudioSpan,
    line: Box<dyn AudioLine>,
}

impl AudioWorker {
    pub(in crate::playback::session) fn run(self) {
        let AudioWorker {
            shared,
            stream,
            output,
            settings,
            start,
            completion: _completion,
        } = self;

        let prepared = match prepare(stream, output.as_ref(), &settings) {
            Ok(prepared) => prepared,
            Err(err) => {
                // Dropping `start` releases our slot at the start barrier, so
                // the video worker proceeds unaccompanied.
                warn!(
                    "audio for '{}' unavailable, continuing without sound: {}",
                    shared.media, err
                );
                return;
            }
        };

        shared.report_audio(prepared.span);

        start.wait();

        if shared.is_stop_requested() {
            debug!("audio for '{}' stopped before output", shared.media);
            return;
        }

        let PreparedAudio { pcm, mut line, .. } = prepared;
        if let Err(err) = line.play_to_end(&pcm, shared.stop_flag()) {
            warn!("audio output for '{}' failed: {}", shared.media, err);
        }

        #[cfg(feature = "debug")]
        log::info!("audio worker for '{}' drained", shared.media);
    }
}

fn prepare(
    stream: MediaStream,
    output: &dyn AudioOutput,
    settings: &PlaybackSettings,
) -> Result<PreparedAudio> {
    let clip = decode_pcm(read_all(stream)?)?;
    let pcm = transform::process(
        &clip.samples,
        clip.channels as usize,
        settings.smoothing_window,
    );
    let span = AudioSpan {
        bytes: pcm.len() as u64,
        sample_rate: clip.sample_rate,
        channels: clip.channels,
    };
    let line = output.open(&LineRequest {
        sample_rate: clip.sample_rate,
        channels: clip.channels,
        volume: settings.volume,
        poll_interval: settings.drain_poll(),
    })?;
    Ok(PreparedAudio { pcm, span, line })
}
