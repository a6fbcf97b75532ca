use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
    Terminal,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use reel_lib::video::{unpack_rgb, Raster};
use reel_lib::{FrameBuffer, FrameSink};

use crate::controls::StatusSnapshot;

/// Frame sink that just remembers the session buffer; the UI loop pulls
/// from it at its own pace.
#[derive(Default)]
pub struct TerminalSink {
    frames: Mutex<Option<Arc<FrameBuffer>>>,
    swaps: AtomicU64,
}

impl TerminalSink {
    /// Copy of the front buffer, if the session has produced a frame.
    pub fn snapshot(&self) -> Option<Raster> {
        let frames = self.frames.lock().unwrap().clone()?;
        Some(frames.snapshot())
    }

    pub fn swaps(&self) -> u64 {
        self.swaps.load(Ordering::Relaxed)
    }
}

impl FrameSink for TerminalSink {
    fn on_init(&self, _width: u32, _height: u32, frames: Arc<FrameBuffer>) {
        *self.frames.lock().unwrap() = Some(frames);
    }

    fn on_swap(&self, _frame_index: u64) {
        self.swaps.fetch_add(1, Ordering::Relaxed);
    }
}

/// Renders a raster with `▀`: the foreground colour is the upper pixel
/// row, the background the lower one. Nearest-neighbour scaled.
pub struct FrameView<'a> {
    raster: &'a Raster,
}

impl<'a> FrameView<'a> {
    pub fn new(raster: &'a Raster) -> Self {
        Self { raster }
    }
}

impl Widget for FrameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = (self.raster.width(), self.raster.height());
        if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
            return;
        }
        let rows = area.height as u32 * 2;
        let colour = |x: u32, y: u32| {
            let (r, g, b) = unpack_rgb(self.raster.pixel(x, y).unwrap_or(0));
            Color::Rgb(r, g, b)
        };
        for row in 0..area.height {
            let top = (row as u32 * 2) * height / rows;
            let bottom = (row as u32 * 2 + 1) * height / rows;
            for col in 0..area.width {
                let x = col as u32 * width / area.width as u32;
                buf.get_mut(area.x + col, area.y + row)
                    .set_char('▀')
                    .set_fg(colour(x, top))
                    .set_bg(colour(x, bottom));
            }
        }
    }
}

pub fn draw(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    frame: Option<&Raster>,
    subtitle: Option<&str>,
    status: &StatusSnapshot,
    log_lines: &[String],
) {
    let _ = terminal.draw(|f| {
        let status_height = {
            #[cfg(feature = "debug")]
            {
                5
            }
            #[cfg(not(feature = "debug"))]
            {
                4
            }
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(status_height),
                Constraint::Length(3),
                Constraint::Length(8),
            ])
            .split(f.size());

        let screen = Block::default().borders(Borders::ALL).title("Reel");
        let inner = screen.inner(chunks[0]);
        f.render_widget(screen, chunks[0]);
        match frame {
            Some(raster) => f.render_widget(FrameView::new(raster), inner),
            None => f.render_widget(
                Paragraph::new("waiting for the first frame…").alignment(Alignment::Center),
                inner,
            ),
        }

        let caption = Paragraph::new(subtitle.unwrap_or(""))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).title("Subtitles"));
        f.render_widget(caption, chunks[1]);

        let status_widget = Paragraph::new(status.text.as_str())
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title("Playback"));
        f.render_widget(status_widget, chunks[2]);

        let controls = Paragraph::new("q/esc=stop  ctrl-c=quit now")
            .style(Style::default().fg(Color::Blue))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
        f.render_widget(controls, chunks[3]);

        let log_height = chunks[4].height.saturating_sub(2) as usize;
        let start = log_lines.len().saturating_sub(log_height);
        let log_text = if log_lines.is_empty() {
            "No logs yet.".to_string()
        } else {
            log_lines[start..].join("\n")
        };

        let log_widget = Paragraph::new(log_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        f.render_widget(log_widget, chunks[4]);
    });
}
