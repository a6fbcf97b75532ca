//! Plain-value playback configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_RENDEZVOUS_GRACE_MS, DEFAULT_SMOOTHING_WINDOW, DEFAULT_VOLUME, DRAIN_POLL_MS,
    OUTPUT_STREAM_OPEN_RETRIES, OUTPUT_STREAM_OPEN_RETRY_MS, PACING_SLICE_MS,
};
use crate::error::Result;

/// Settings passed to a session at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Moving-average window applied to the soundtrack (samples, >= 1).
    pub smoothing_window: usize,
    /// Output gain, 0.0..=1.0.
    pub volume: f32,
    /// How long completion-barrier stragglers are waited for once the video
    /// worker has arrived. `None` waits forever. The start barrier always
    /// waits for the soundtrack.
    pub rendezvous_grace_ms: Option<u64>,
    pub output_open_retries: usize,
    pub output_open_retry_ms: u64,
    pub drain_poll_ms: u64,
    pub pacing_slice_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            volume: DEFAULT_VOLUME,
            rendezvous_grace_ms: Some(DEFAULT_RENDEZVOUS_GRACE_MS),
            output_open_retries: OUTPUT_STREAM_OPEN_RETRIES,
            output_open_retry_ms: OUTPUT_STREAM_OPEN_RETRY_MS,
            drain_poll_ms: DRAIN_POLL_MS,
            pacing_slice_ms: PACING_SLICE_MS,
        }
    }
}

impl PlaybackSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp every field into its valid range.
    pub fn sanitized(mut self) -> Self {
        self.smoothing_window = self.smoothing_window.max(1);
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            DEFAULT_VOLUME
        };
        self.output_open_retries = self.output_open_retries.max(1);
        self.drain_poll_ms = self.drain_poll_ms.max(1);
        self.pacing_slice_ms = self.pacing_slice_ms.max(1);
        self
    }

    pub fn rendezvous_grace(&self) -> Option<Duration> {
        self.rendezvous_grace_ms.map(Duration::from_millis)
    }

    pub fn drain_poll(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms.max(1))
    }

    pub fn pacing_slice(&self) -> Duration {
        Duration::from_millis(self.pacing_slice_ms.max(1))
    }

    pub fn output_open_retry_delay(&self) -> Duration {
        Duration::from_millis(self.output_open_retry_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = PlaybackSettings::from_json(r#"{"smoothing_window": 5}"#).unwrap();
        assert_eq!(settings.smoothing_window, 5);
        assert_eq!(settings.volume, DEFAULT_VOLUME);
        assert_eq!(
            settings.rendezvous_grace(),
            Some(Duration::from_millis(DEFAULT_RENDEZVOUS_GRACE_MS))
        );
    }

    #[test]
    fn null_grace_means_unbounded() {
        let settings = PlaybackSettings::from_json(r#"{"rendezvous_grace_ms": null}"#).unwrap();
        assert_eq!(settings.rendezvous_grace(), None);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let settings =
            PlaybackSettings::from_json(r#"{"smoothing_window": 0, "volume": 3.5}"#).unwrap();
        assert_eq!(settings.smoothing_window, 1);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn malformed_json_is_a_settings_error() {
        let err = PlaybackSettings::from_json("{").unwrap_err();
        assert!(matches!(err, crate::error::ReelError::Settings(_)));
    }

    #[test]
    fn round_trips_through_pretty_json() {
        let json = PlaybackSettings::default().to_json_pretty().unwrap();
        assert!(json.contains("\"smoothing_window\": 3"));
        assert_eq!(
            PlaybackSettings::from_json(&json).unwrap(),
            PlaybackSettings::default()
        );
    }
}
