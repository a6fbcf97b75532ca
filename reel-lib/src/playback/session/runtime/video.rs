//! Video decoder worker.
//!
//! Produces the first frame before the start barrier so the renderer has
//! something to show the instant timing begins, then decodes, swaps and
//! paces against absolute deadlines. When the soundtrack outlasts the
//! decoded frames, ticks keep coming (without new pixels) until the audio
//! duration is covered.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};

use super::guard::ArrivalGuard;
use super::shared::SessionShared;
use crate::frame::{FrameBuffer, FrameSink};
use crate::playback::host::{HostExecutor, LabelCallback, PositionCallback};
use crate::playback::pacer::Pacer;
use crate::playback::{FrameTick, PlaybackSettings, SessionState};
use crate::subtitle::SubtitleTrack;
use crate::video::{FrameDecoder, VideoHeader};

pub(in crate::playback::session) struct VideoWorker {
    pub(in crate::playback::session) shared: Arc<SessionShared>,
    pub(in crate::playback::session) decoder: Box<dyn FrameDecoder>,
    pub(in crate::playback::session) sink: Arc<dyn FrameSink>,
    pub(in crate::playback::session) subtitles: Option<SubtitleTrack>,
    pub(in crate::playback::session) executor: Arc<dyn HostExecutor>,
    pub(in crate::playback::session) on_position: Option<PositionCallback>,
    pub(in crate::playback::session) on_label: Option<LabelCallback>,
    pub(in crate::playback::session) settings: PlaybackSettings,
    pub(in crate::playback::session) start: ArrivalGuard,
    pub(in crate::playback::session) completion: ArrivalGuard,
}

/// Delivers ticks and subtitle changes through the host executor.
struct TickPublisher {
    header: VideoHeader,
    subtitles: Option<SubtitleTrack>,
    executor: Arc<dyn HostExecutor>,
    on_position: Option<PositionCallback>,
    on_label: Option<LabelCallback>,
    current_label: Option<String>,
}

impl TickPublisher {
    fn publish(&mut self, index: u64, fresh: bool) {
        let tick = FrameTick {
            fps: self.header.fps,
            index,
            elapsed: self.header.frame_time(index),
            fresh,
        };

        #[cfg(feature = "debug")]
        log::info!("tick {} (fresh: {})", index, fresh);

        if let Some(on_position) = &self.on_position {
            let on_position = on_position.clone();
            self.executor.execute(Box::new(move || on_position(tick)));
        }

        let label = self
            .subtitles
            .as_ref()
            .and_then(|track| track.text_at(tick.elapsed_ms()))
            .map(str::to_string);
        if label != self.current_label {
            self.current_label = label.clone();
            if let Some(on_label) = &self.on_label {
                let on_label = on_label.clone();
                self.executor.execute(Box::new(move || on_label(label)));
            }
        }
    }
}

impl VideoWorker {
    pub(in crate::playback::session) fn run(self) {
        let VideoWorker {
            shared,
            mut decoder,
            sink,
            subtitles,
            executor,
            on_position,
            on_label,
            settings,
            start,
            completion: _completion,
        } = self;

        let header = decoder.header();
        let frames = shared.frames.clone();
        frames.init(header.width, header.height);
        sink.on_init(header.width, header.height, frames.clone());

        let mut publisher = TickPublisher {
            header,
            subtitles,
            executor,
            on_position,
            on_label,
            current_label: None,
        };

        // The first frame is on screen before anyone starts the clock.
        let mut decoding = true;
        let mut produced: u64 = 0;
        produce(&frames, decoder.as_mut(), sink.as_ref(), &mut decoding, &mut produced, 0);
        shared.update_timeline(|timeline| timeline.first_frame_at = Some(Instant::now()));

        start.wait();
        shared.transition(&[SessionState::Starting], SessionState::Playing);

        // The start barrier has no timeout, so audio has reported its length
        // (or given up) by the time it releases.
        let audio_frames = shared
            .audio_span()
            .map(|span| span.video_frames(header.fps))
            .unwrap_or(0);

        let mut pacer = Pacer::new(header.fps, settings.pacing_slice());
        let origin = pacer.start();
        shared.update_timeline(|timeline| timeline.pacing_started_at = Some(origin));

        let stop = shared.stop_flag();
        let mut index: u64 = 0;
        loop {
            if index > 0 {
                if !pacer.wait_for(index, stop) {
                    break;
                }
                produce(&frames, decoder.as_mut(), sink.as_ref(), &mut decoding, &mut produced, index);
            }
            if shared.is_stop_requested() {
                break;
            }

            let fresh = produced > index;
            if !fresh && index >= audio_frames {
                break;
            }
            publisher.publish(index, fresh);
            shared.record_tick(fresh);
            index += 1;
        }

        debug!(
            "video for '{}' done after {} ticks ({} decoded, {} needed for audio, stopped: {})",
            shared.media,
            index,
            produced,
            audio_frames,
            shared.is_stop_requested()
        );
        // `_completion` arrives at the completion barrier as it drops here.
    }
}

/// Decode frame `index` into the back buffer and publish it.
///
/// Once the decoder reports end of stream (or fails) no further decode is
/// attempted for this session.
fn produce(
    frames: &FrameBuffer,
    decoder: &mut dyn FrameDecoder,
    sink: &dyn FrameSink,
    decoding: &mut bool,
    produced: &mut u64,
    index: u64,
) {
    if !*decoding {
        return;
    }
    match frames.write_back_and_swap(|back| {
        let decoded = decoder.decode_next(back)?;
        if decoded {
            back.set_stamp(index);
        }
        Ok::<bool, crate::error::ReelError>(decoded)
    }) {
        Ok(true) => {
            *produced += 1;
            sink.on_swap(index);
        }
        Ok(false) => {
            debug!("video stream ended after {} frames", *produced);
            *decoding = false;
        }
        Err(err) => {
            warn!("video decode failed at frame {}: {}", index, err);
            *decoding = false;
        }
    }
}
