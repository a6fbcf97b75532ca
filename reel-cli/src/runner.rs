use std::{
    io,
    sync::{Arc, Mutex},
    thread::sleep,
    time::Duration,
};

use clap::ArgMatches;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use reel_lib::audio::{AudioOutput, RodioOutput, SilentOutput};
use reel_lib::{
    probe, DirectoryProvider, FrameTick, HostCallbacks, MediaPlayer, PlaybackSession,
    QueuedExecutor, ResourceProvider, Result, SessionEnv,
};

use crate::cli::args::{media_dir, playback_settings};
use crate::controls::{self, KeyAction};
use crate::logging::{self, LogBuffer};
use crate::{cli, ui};

const FRAME_POLL: Duration = Duration::from_millis(30);
const EXIT_TERMINATED: i32 = 130;

pub fn run(args: &ArgMatches, log_buffer: LogBuffer) -> Result<i32> {
    info!("Starting reel CLI");
    match args.subcommand() {
        Some(("play", play_args)) => run_play(play_args, log_buffer),
        Some(("probe", probe_args)) => cli::probe::run_probe(probe_args),
        Some(("create", create_args)) => cli::create::run_create(create_args),
        _ => Ok(-1),
    }
}

/// What the host callbacks have told us so far.
#[derive(Default)]
struct HostView {
    tick: Option<FrameTick>,
    label: Option<String>,
    completed: bool,
}

struct Playback {
    media: String,
    session: Arc<PlaybackSession>,
    executor: Arc<QueuedExecutor>,
    sink: Arc<ui::TerminalSink>,
    view: Arc<Mutex<HostView>>,
    total_ticks: u64,
}

fn run_play(args: &ArgMatches, log_buffer: LogBuffer) -> Result<i32> {
    let media = args
        .get_one::<String>("MEDIA")
        .cloned()
        .unwrap_or_default();
    let settings = playback_settings(args)?;
    let provider: Arc<dyn ResourceProvider> = Arc::new(DirectoryProvider::new(media_dir(args)));

    let total_ticks = match probe(provider.as_ref(), &media) {
        Ok(info) => info.playback_frames(),
        Err(err) => {
            warn!("could not probe '{}': {}", media, err);
            0
        }
    };

    let output: Arc<dyn AudioOutput> = if args.get_flag("mute") {
        Arc::new(SilentOutput::realtime())
    } else {
        Arc::new(RodioOutput::from_settings(&settings))
    };
    let executor = Arc::new(QueuedExecutor::new());
    let env = SessionEnv::new(provider)
        .with_output(output)
        .with_executor(executor.clone())
        .with_settings(settings);
    let player = MediaPlayer::with_env(env);

    let view = Arc::new(Mutex::new(HostView::default()));
    let callbacks = {
        let ticks = view.clone();
        let labels = view.clone();
        let completed = view.clone();
        HostCallbacks::new()
            .on_position(move |tick| ticks.lock().unwrap().tick = Some(tick))
            .on_label(move |label| labels.lock().unwrap().label = label)
            .on_complete(move || completed.lock().unwrap().completed = true)
    };
    let sink = Arc::new(ui::TerminalSink::default());
    let session = player.play(&media, sink.clone(), callbacks)?;

    let playback = Playback {
        media,
        session,
        executor,
        sink,
        view,
        total_ticks,
    };

    if args.get_flag("quiet") {
        return Ok(run_headless(&playback, &log_buffer));
    }

    let terminal = {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
        Terminal::new(CrosstermBackend::new(stdout)).ok()
    };
    match terminal {
        Some(terminal) => Ok(run_tui(&playback, terminal, log_buffer)),
        None => {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
            Ok(run_headless(&playback, &log_buffer))
        }
    }
}

fn run_headless(playback: &Playback, log_buffer: &LogBuffer) -> i32 {
    while !playback.session.is_finished() {
        playback.executor.run_pending();
        sleep(FRAME_POLL);
    }
    playback.session.wait();
    playback.executor.run_pending();

    for line in log_buffer.problems() {
        eprintln!("{}", line);
    }
    println!("{}", summary(playback));
    0
}

fn run_tui(
    playback: &Playback,
    mut terminal: Terminal<CrosstermBackend<io::Stdout>>,
    log_buffer: LogBuffer,
) -> i32 {
    let raw_mode = RawModeGuard::enable().ok();
    let stderr_capture = match logging::capture_stderr(log_buffer.clone()) {
        Ok(capture) => Some(capture),
        Err(err) => {
            warn!("stderr stays on the terminal: {}", err);
            None
        }
    };
    let mut code = 0;

    // UI / input loop.
    loop {
        playback.executor.run_pending();

        let frame = playback.sink.snapshot();
        let (status, label) = {
            let view = playback.view.lock().unwrap();
            let status = controls::status_text(controls::StatusArgs {
                media: playback.media.clone(),
                state: playback.session.state(),
                tick: view.tick,
                total_ticks: playback.total_ticks,
                fresh_frames: playback.session.fresh_frames(),
                has_audio: playback.session.audio_span().is_some(),
                #[cfg(feature = "debug")]
                swaps: playback.sink.swaps(),
                #[cfg(feature = "debug")]
                start_to_pacing_ms: {
                    let timeline = playback.session.timeline();
                    timeline
                        .started_at
                        .zip(timeline.pacing_started_at)
                        .map(|(started, pacing)| pacing.duration_since(started).as_millis())
                },
            });
            (status, view.label.clone())
        };
        let log_lines = log_buffer.snapshot();
        ui::draw(
            &mut terminal,
            frame.as_ref(),
            label.as_deref(),
            &status,
            &log_lines,
        );

        if playback.session.is_finished() {
            break;
        }

        match controls::poll_key(FRAME_POLL) {
            KeyAction::Stop => {
                if let Err(err) = playback.session.stop() {
                    warn!("{}", err);
                }
            }
            KeyAction::Terminate => {
                playback.session.terminate();
                code = EXIT_TERMINATED;
                break;
            }
            KeyAction::None => {}
        }
    }

    // Restore the terminal state before exiting.
    let _ = terminal.show_cursor();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show);
    drop(stderr_capture);
    drop(raw_mode);

    if code == 0 {
        playback.session.wait();
        playback.executor.run_pending();
        println!("{}", summary(playback));
    }
    code
}

fn summary(playback: &Playback) -> String {
    let completed = playback.view.lock().unwrap().completed;
    format!(
        "{}: {} ticks, {} decoded frames, {}",
        playback.media,
        playback.session.ticks(),
        playback.session.fresh_frames(),
        if completed { "completed" } else { "not completed" }
    )
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
