use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use reel_lib::{FrameTick, SessionState};

pub struct StatusSnapshot {
    pub text: String,
}

pub struct StatusArgs {
    pub media: String,
    pub state: SessionState,
    pub tick: Option<FrameTick>,
    /// Ticks a full playback will emit.
    pub total_ticks: u64,
    pub fresh_frames: u64,
    pub has_audio: bool,
    #[cfg(feature = "debug")]
    pub swaps: u64,
    #[cfg(feature = "debug")]
    pub start_to_pacing_ms: Option<u128>,
}

pub fn status_text(args: StatusArgs) -> StatusSnapshot {
    let state = match args.state {
        SessionState::Idle | SessionState::Starting => "… Starting",
        SessionState::Playing => "▶ Playing",
        SessionState::Stopping => "■ Stopping",
        SessionState::Terminated => "✓ Finished",
    };
    let (index, elapsed_ms, fps) = match args.tick {
        Some(tick) => (tick.index + 1, tick.elapsed_ms(), tick.fps),
        None => (0, 0, 0.0),
    };
    let total_ms = if fps > 0.0 {
        (args.total_ticks as f64 * 1000.0 / fps) as u64
    } else {
        0
    };
    let percent = if args.total_ticks > 0 {
        (index as f64 / args.total_ticks as f64 * 100.0).min(100.0)
    } else {
        0.0
    };
    let audio = if args.has_audio { "on" } else { "none" };

    #[allow(unused_mut)]
    let mut text = format!(
        "{}  {}   {} / {}   ({:>5.1}%)\nFrame {}/{} @ {:.2} fps | decoded: {} | audio: {}",
        state,
        args.media,
        format_time(elapsed_ms),
        format_time(total_ms),
        percent,
        index,
        args.total_ticks,
        fps,
        args.fresh_frames,
        audio
    );

    #[cfg(feature = "debug")]
    {
        text.push_str(&format!(
            "\nswaps: {} | start→pacing: {}",
            args.swaps,
            args.start_to_pacing_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string())
        ));
    }

    StatusSnapshot { text }
}

/// What the user asked for this poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    /// q / Esc: stop and wait for completion.
    Stop,
    /// Ctrl-C: terminate and leave immediately.
    Terminate,
}

pub fn poll_key(timeout: Duration) -> KeyAction {
    if !event::poll(timeout).unwrap_or(false) {
        return KeyAction::None;
    }
    match event::read() {
        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyAction::Terminate
            }
            KeyCode::Char('q') | KeyCode::Esc => KeyAction::Stop,
            _ => KeyAction::None,
        },
        _ => KeyAction::None,
    }
}

fn format_time(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    format!("{:02}:{:02}.{:03}", minutes, seconds % 60, ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_shows_position_against_total() {
        let status = status_text(StatusArgs {
            media: "intro_1".to_string(),
            state: SessionState::Playing,
            tick: Some(FrameTick {
                fps: 10.0,
                index: 24,
                elapsed: Duration::from_millis(2_400),
                fresh: true,
            }),
            total_ticks: 50,
            fresh_frames: 25,
            has_audio: true,
            #[cfg(feature = "debug")]
            swaps: 25,
            #[cfg(feature = "debug")]
            start_to_pacing_ms: Some(12),
        });
        assert!(status.text.contains("▶ Playing"));
        assert!(status.text.contains("00:02.400 / 00:05.000"));
        assert!(status.text.contains("Frame 25/50"));
        assert!(status.text.contains("( 50.0%)"));
    }

    #[test]
    fn time_format_keeps_milliseconds() {
        assert_eq!(format_time(0), "00:00.000");
        assert_eq!(format_time(61_005), "01:01.005");
    }
}
