//! Double-buffered frame handoff between the video worker and the renderer.

mod buffer;

use std::sync::Arc;

pub use buffer::FrameBuffer;

/// Host rendering surface.
///
/// Both methods are called from the video worker thread and must return
/// quickly; a typical implementation records the buffer and schedules a
/// repaint on its own UI thread.
pub trait FrameSink: Send + Sync {
    /// Called once, before the first swap, with the session's buffer.
    fn on_init(&self, width: u32, height: u32, frames: Arc<FrameBuffer>);

    /// Called after every swap that published new pixel data.
    fn on_swap(&self, frame_index: u64);
}

/// Sink for hosts that only want position and subtitle callbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn on_init(&self, _width: u32, _height: u32, _frames: Arc<FrameBuffer>) {}

    fn on_swap(&self, _frame_index: u64) {}
}
