mod common;

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use common::{clip, env, tone, BrokenOutput, Recorder, RecordingSink, SlowOutput, StuckOutput};
use reel_lib::playback::QueuedExecutor;
use reel_lib::resource::MediaStream;
use reel_lib::video::{FrameDecoder, Raster, VideoCodec, VideoHeader};
use reel_lib::{
    HostCallbacks, MediaKind, MemoryProvider, NullSink, PlaybackSession, ReelError, SessionState,
};

fn session(media: &str, provider: MemoryProvider) -> (PlaybackSession, Arc<RecordingSink>, Arc<Recorder>) {
    session_with(media, env(provider))
}

fn session_with(
    media: &str,
    env: reel_lib::SessionEnv,
) -> (PlaybackSession, Arc<RecordingSink>, Arc<Recorder>) {
    let sink = Arc::new(RecordingSink::default());
    let recorder = Arc::new(Recorder::default());
    let session = PlaybackSession::new(media, env, sink.clone(), recorder.callbacks());
    (session, sink, recorder)
}

#[test]
fn intro_ticks_cover_the_whole_soundtrack() {
    let provider = MemoryProvider::new()
        .with("intro_1", MediaKind::Audio, tone(22_050, 5.0))
        .with("intro_1", MediaKind::Video, clip(40, 10.0));
    let (session, sink, recorder) = session("intro_1", provider);

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(15)));

    let ticks = recorder.ticks();
    assert_eq!(ticks.len(), 50);
    assert!(ticks.iter().enumerate().all(|(i, tick)| tick.index == i as u64));
    assert!(ticks[..40].iter().all(|tick| tick.fresh));
    assert!(ticks[40..].iter().all(|tick| !tick.fresh));
    assert_eq!(ticks[49].elapsed, Duration::from_millis(4_900));
    assert_eq!(recorder.completions(), 1);

    assert_eq!(session.ticks(), 50);
    assert_eq!(session.fresh_frames(), 40);
    assert_eq!(session.state(), SessionState::Terminated);
    assert_eq!(session.audio_span().unwrap().duration(), Duration::from_secs(5));

    let swaps = sink.swaps.lock().unwrap().clone();
    assert_eq!(swaps, (0..40).collect::<Vec<u64>>());
    let stamps = sink.stamps.lock().unwrap().clone();
    assert_eq!(stamps, swaps.iter().map(|&i| Some(i)).collect::<Vec<_>>());
}

#[test]
fn video_only_media_starts_without_waiting_for_audio() {
    let provider = MemoryProvider::new().with("silent", MediaKind::Video, clip(5, 50.0));
    let (session, sink, recorder) = session("silent", provider);

    let started = Instant::now();
    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));
    // A start barrier sized for an absent audio worker would never release.
    assert!(started.elapsed() < Duration::from_millis(1_500));

    assert_eq!(recorder.ticks().len(), 5);
    assert_eq!(recorder.completions(), 1);
    assert!(session.audio_span().is_none());
    assert_eq!(*sink.dimensions.lock().unwrap(), Some((4, 3)));

    let timeline = session.timeline();
    let first_frame = timeline.first_frame_at.unwrap();
    let pacing = timeline.pacing_started_at.unwrap();
    assert!(first_frame <= pacing);
    assert!(timeline.started_at.unwrap() <= first_frame);
}

#[test]
fn pacing_waits_for_the_soundtrack() {
    let provider = MemoryProvider::new()
        .with("clip", MediaKind::Audio, tone(8_000, 0.5))
        .with("clip", MediaKind::Video, clip(5, 10.0));
    let (session, _sink, _recorder) = session("clip", provider);

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));

    let timeline = session.timeline();
    assert!(timeline.audio_reported_at.unwrap() <= timeline.pacing_started_at.unwrap());
}

#[test]
fn slow_audio_device_outlasting_the_grace_still_leads_pacing() {
    let provider = MemoryProvider::new()
        .with("clip", MediaKind::Audio, tone(8_000, 1.0))
        .with("clip", MediaKind::Video, clip(5, 10.0));
    let mut settings = common::quick_settings();
    settings.rendezvous_grace_ms = Some(200);
    let env = env(provider)
        .with_output(Arc::new(SlowOutput {
            delay: Duration::from_millis(600),
        }))
        .with_settings(settings);
    let (session, _sink, recorder) = session_with("clip", env);

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));

    let timeline = session.timeline();
    assert!(timeline.audio_reported_at.unwrap() <= timeline.pacing_started_at.unwrap());
    assert_eq!(recorder.ticks().len(), 10);
    assert_eq!(session.fresh_frames(), 5);
    assert!(!session.completion_forced());
    assert_eq!(recorder.completions(), 1);
}

#[test]
fn completion_callback_sees_a_finished_session() {
    let provider = MemoryProvider::new().with("clip", MediaKind::Video, clip(3, 50.0));
    let slot: Arc<Mutex<Option<Arc<PlaybackSession>>>> = Arc::new(Mutex::new(None));
    let (report, observed) = mpsc::channel();

    let callbacks = {
        let slot = slot.clone();
        HostCallbacks::new().on_complete(move || {
            let session = slot.lock().unwrap().clone();
            if let Some(session) = session {
                let seen = (session.state(), session.is_finished());
                // Runs on the completion thread with the inline executor.
                session.wait();
                report.send(seen).unwrap();
            }
        })
    };
    let session = Arc::new(PlaybackSession::new(
        "clip",
        env(provider),
        Arc::new(NullSink),
        callbacks,
    ));
    *slot.lock().unwrap() = Some(session.clone());

    session.start().unwrap();
    let seen = observed.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(seen, (SessionState::Terminated, true));
    assert!(session.wait_timeout(Duration::from_secs(5)));
    slot.lock().unwrap().take();
}

#[test]
fn stop_still_reports_completion_once() {
    let provider = MemoryProvider::new()
        .with("long", MediaKind::Audio, tone(8_000, 5.0))
        .with("long", MediaKind::Video, clip(100, 20.0));
    let (session, _sink, recorder) = session("long", provider);

    session.start().unwrap();
    thread::sleep(Duration::from_millis(200));
    session.stop().unwrap();
    assert!(session.is_stop_requested());
    assert!(session.wait_timeout(Duration::from_secs(2)));

    assert_eq!(recorder.completions(), 1);
    assert!(recorder.ticks().len() < 100);
    assert_eq!(session.state(), SessionState::Terminated);
    // Stopping again is harmless.
    session.stop().unwrap();
    assert_eq!(recorder.completions(), 1);
}

#[test]
fn terminate_suppresses_completion() {
    let provider = MemoryProvider::new()
        .with("long", MediaKind::Audio, tone(8_000, 5.0))
        .with("long", MediaKind::Video, clip(100, 20.0));
    let (session, _sink, recorder) = session("long", provider);

    session.start().unwrap();
    thread::sleep(Duration::from_millis(200));
    session.terminate();
    assert!(session.wait_timeout(Duration::from_secs(2)));

    assert_eq!(recorder.completions(), 0);
    assert!(recorder.ticks().len() < 100);
    assert!(session.is_terminated());
}

#[test]
fn terminate_drops_a_completion_still_queued_for_the_host() {
    let provider = MemoryProvider::new().with("clip", MediaKind::Video, clip(3, 50.0));
    let executor = Arc::new(QueuedExecutor::new());
    let (session, _sink, recorder) =
        session_with("clip", env(provider).with_executor(executor.clone()));

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));
    // Everything is queued; nothing has reached the host yet.
    assert!(recorder.ticks().is_empty());

    session.terminate();
    assert!(executor.run_pending() >= 4);
    assert_eq!(recorder.ticks().len(), 3);
    assert_eq!(recorder.completions(), 0);
}

#[test]
fn queued_completion_is_delivered_on_drain() {
    let provider = MemoryProvider::new().with("clip", MediaKind::Video, clip(3, 50.0));
    let executor = Arc::new(QueuedExecutor::new());
    let (session, _sink, recorder) =
        session_with("clip", env(provider).with_executor(executor.clone()));

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));
    assert_eq!(recorder.completions(), 0);
    executor.run_pending();
    assert_eq!(recorder.completions(), 1);
}

#[test]
fn missing_video_fails_before_spawning_anything() {
    let provider = MemoryProvider::new().with("ghost", MediaKind::Audio, tone(8_000, 1.0));
    let (session, sink, recorder) = session("ghost", provider);

    let err = session.start().unwrap_err();
    assert!(matches!(
        err,
        ReelError::MissingResource {
            kind: MediaKind::Video,
            ..
        }
    ));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(sink.dimensions.lock().unwrap().is_none());
    thread::sleep(Duration::from_millis(50));
    assert_eq!(recorder.completions(), 0);
    assert_eq!(session.ticks(), 0);
}

#[test]
fn corrupt_video_fails_start() {
    let provider = MemoryProvider::new().with("bad", MediaKind::Video, b"MPEG".to_vec());
    let (session, _sink, _recorder) = session("bad", provider);
    assert!(matches!(session.start(), Err(ReelError::InvalidVideo(_))));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn broken_audio_device_leaves_video_running() {
    let provider = MemoryProvider::new()
        .with("clip", MediaKind::Audio, tone(8_000, 2.0))
        .with("clip", MediaKind::Video, clip(6, 50.0));
    let (session, _sink, recorder) =
        session_with("clip", env(provider).with_output(Arc::new(BrokenOutput)));

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));

    // The soundtrack never reported, so playback covers the frames only.
    assert!(session.audio_span().is_none());
    assert_eq!(recorder.ticks().len(), 6);
    assert_eq!(recorder.completions(), 1);
    assert!(!session.completion_forced());
}

#[test]
fn undecodable_audio_degrades_to_video_only() {
    let provider = MemoryProvider::new()
        .with("clip", MediaKind::Audio, vec![0u8; 128])
        .with("clip", MediaKind::Video, clip(4, 50.0));
    let (session, _sink, recorder) = session("clip", provider);

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));
    assert_eq!(recorder.ticks().len(), 4);
    assert_eq!(recorder.completions(), 1);
}

#[test]
fn stuck_audio_line_is_abandoned_after_the_grace_period() {
    let provider = MemoryProvider::new()
        .with("clip", MediaKind::Audio, tone(8_000, 0.1))
        .with("clip", MediaKind::Video, clip(3, 50.0));
    let mut settings = common::quick_settings();
    settings.rendezvous_grace_ms = Some(200);
    let env = env(provider)
        .with_output(Arc::new(StuckOutput {
            hold: Duration::from_secs(3),
        }))
        .with_settings(settings);
    let (session, _sink, recorder) = session_with("clip", env);

    let started = Instant::now();
    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(2)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(session.completion_forced());
    assert_eq!(recorder.completions(), 1);
}

#[test]
fn subtitle_changes_are_reported_once_each() {
    let provider = MemoryProvider::new()
        .with("clip", MediaKind::Video, clip(10, 10.0))
        .with(
            "clip",
            MediaKind::Subtitle,
            b"0-250 first\n450 second\n".to_vec(),
        );
    let (session, _sink, recorder) = session("clip", provider);

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));
    assert_eq!(
        recorder.labels(),
        vec![Some("first".to_string()), None, Some("second".to_string())]
    );
}

#[test]
fn broken_subtitles_are_ignored() {
    let provider = MemoryProvider::new()
        .with("clip", MediaKind::Video, clip(3, 50.0))
        .with("clip", MediaKind::Subtitle, b"soon hello\n".to_vec());
    let (session, _sink, recorder) = session("clip", provider);

    session.start().unwrap();
    assert!(session.wait_timeout(Duration::from_secs(5)));
    assert!(recorder.labels().is_empty());
    assert_eq!(recorder.completions(), 1);
}

#[test]
fn lifecycle_misuse_is_rejected() {
    let provider = MemoryProvider::new().with("clip", MediaKind::Video, clip(2, 50.0));
    let (session, _sink, _recorder) = session("clip", provider);

    assert!(matches!(
        session.stop(),
        Err(ReelError::InvalidState {
            operation: "stop",
            ..
        })
    ));
    session.start().unwrap();
    assert!(matches!(
        session.start(),
        Err(ReelError::InvalidState {
            operation: "start",
            ..
        })
    ));
    session.wait();
    assert!(session.is_finished());
}

#[test]
fn terminating_an_idle_session_finishes_it() {
    let provider = MemoryProvider::new().with("clip", MediaKind::Video, clip(2, 50.0));
    let (session, _sink, recorder) = session("clip", provider);

    session.terminate();
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(session.start().is_err());
    assert_eq!(recorder.completions(), 0);
}

/// Codec whose streams claim a frame rate the pacer cannot use.
struct FrozenCodec;

struct FrozenDecoder;

impl VideoCodec for FrozenCodec {
    fn open(&self, _stream: MediaStream) -> reel_lib::Result<Box<dyn FrameDecoder>> {
        Ok(Box::new(FrozenDecoder))
    }
}

impl FrameDecoder for FrozenDecoder {
    fn header(&self) -> VideoHeader {
        VideoHeader {
            width: 4,
            height: 3,
            fps: 0.0,
        }
    }

    fn decode_next(&mut self, _target: &mut Raster) -> reel_lib::Result<bool> {
        Ok(false)
    }
}

#[test]
fn custom_codec_with_a_zero_frame_rate_fails_start() {
    let provider = MemoryProvider::new().with("clip", MediaKind::Video, vec![0; 16]);
    let (session, sink, recorder) =
        session_with("clip", env(provider).with_codec(Arc::new(FrozenCodec)));

    assert!(matches!(session.start(), Err(ReelError::InvalidVideo(_))));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(sink.dimensions.lock().unwrap().is_none());
    assert_eq!(recorder.completions(), 0);
}
