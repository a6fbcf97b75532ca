//! Shared constants for playback defaults.

/// Default moving-average window applied to soundtracks (samples).
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;

/// Default output gain.
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Default grace period for completion-barrier stragglers once the video
/// worker has arrived (ms).
pub const DEFAULT_RENDEZVOUS_GRACE_MS: u64 = 5_000;

pub const OUTPUT_STREAM_OPEN_RETRIES: usize = 20;
pub const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;

/// Poll interval while an audio line drains (ms).
pub const DRAIN_POLL_MS: u64 = 10;

/// Longest single sleep inside the frame pacer (ms). Bounds stop latency at
/// low frame rates.
pub const PACING_SLICE_MS: u64 = 20;
