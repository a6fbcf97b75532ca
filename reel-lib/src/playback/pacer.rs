//! Absolute-deadline frame pacing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Schedules frame `n` at `origin + n / fps`.
///
/// Deadlines are computed from the origin every time rather than by adding
/// a per-frame sleep, so a late frame does not push every later frame back.
#[derive(Debug, Clone)]
pub struct Pacer {
    fps: f64,
    slice: Duration,
    origin: Option<Instant>,
}

impl Pacer {
    pub fn new(fps: f64, slice: Duration) -> Self {
        Self {
            fps,
            slice: slice.max(Duration::from_millis(1)),
            origin: None,
        }
    }

    /// Start the clock now; frame 0 is due immediately.
    pub fn start(&mut self) -> Instant {
        let now = Instant::now();
        self.origin = Some(now);
        now
    }

    pub fn origin(&self) -> Option<Instant> {
        self.origin
    }

    pub fn deadline(&self, index: u64) -> Option<Instant> {
        self.origin
            .map(|origin| origin + Duration::from_secs_f64(index as f64 / self.fps))
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.origin.map(|origin| origin.elapsed()).unwrap_or_default()
    }

    /// Sleep until frame `index` is due.
    ///
    /// Sleeps in slices so `stop` is noticed promptly; returns `false` if it
    /// was set before the deadline. A deadline already in the past returns
    /// immediately.
    pub fn wait_for(&self, index: u64, stop: &AtomicBool) -> bool {
        let Some(deadline) = self.deadline(index) else {
            return !stop.load(Ordering::SeqCst);
        };
        loop {
            if stop.load(Ordering::SeqCst) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(self.slice));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadlines_are_absolute() {
        let mut pacer = Pacer::new(10.0, Duration::from_millis(5));
        let origin = pacer.start();
        assert_eq!(pacer.deadline(0), Some(origin));
        assert_eq!(pacer.deadline(25), Some(origin + Duration::from_millis(2_500)));
    }

    #[test]
    fn late_frames_do_not_accumulate_drift() {
        let mut pacer = Pacer::new(100.0, Duration::from_millis(5));
        let stop = AtomicBool::new(false);
        pacer.start();
        // Simulate a slow frame, then check the schedule still targets the origin.
        thread::sleep(Duration::from_millis(50));
        assert!(pacer.wait_for(3, &stop));
        assert!(pacer.wait_for(10, &stop));
        let elapsed = pacer.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(400));
    }

    #[test]
    fn stop_interrupts_a_long_wait() {
        let mut pacer = Pacer::new(0.1, Duration::from_millis(5));
        let stop = AtomicBool::new(false);
        pacer.start();
        let handle = {
            let pacer = pacer.clone();
            let stop = std::sync::Arc::new(stop);
            let flag = stop.clone();
            let waiter = thread::spawn(move || pacer.wait_for(1, &flag));
            thread::sleep(Duration::from_millis(20));
            stop.store(true, Ordering::SeqCst);
            waiter
        };
        assert!(!handle.join().unwrap());
    }
}
