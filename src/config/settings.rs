//! Replay settings persisted with the app state
//!
//! # Main Types
//!
//! - [`ReplayConfig`] - All user-tunable settings
//! - [`PlaybackConfig`] - Tick period and starting rate
//! - [`DataConfig`] - Where session files are read from
//! - [`UiConfig`] - Viewer preferences

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReplayError, Result};
use crate::session::types::{MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};

/// Default base tick period in milliseconds (25 frames per second)
pub const DEFAULT_TICK_MS: u64 = 40;

/// Shortest accepted tick period
pub const MIN_TICK_MS: u64 = 5;

/// Longest accepted tick period
pub const MAX_TICK_MS: u64 = 1000;

/// Playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Wall-clock period between ticks
    #[serde(default = "default_tick_ms")]
    pub base_tick_ms: u64,

    /// Rate applied when a session is loaded
    #[serde(default = "default_rate")]
    pub default_rate: f64,
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_rate() -> f64 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_tick_ms: DEFAULT_TICK_MS,
            default_rate: 1.0,
        }
    }
}

impl PlaybackConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.base_tick_ms)
    }
}

/// Data source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root of the `<year>/<round>_<kind>.json` tree
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,
}

fn default_sessions_dir() -> PathBuf {
    super::app_data_dir()
        .map(|dir| dir.join("sessions"))
        .unwrap_or_else(|| PathBuf::from("sessions"))
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sessions_dir: default_sessions_dir(),
        }
    }
}

/// Viewer preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Samples kept by the telemetry chart
    #[serde(default = "default_telemetry_history")]
    pub telemetry_history: usize,

    /// Draw driver codes next to the markers on the track map
    #[serde(default = "default_true")]
    pub show_driver_labels: bool,

    /// Initial window size in logical pixels
    #[serde(default = "default_window_size")]
    pub window_size: [f32; 2],
}

fn default_true() -> bool {
    true
}

fn default_telemetry_history() -> usize {
    crate::sinks::telemetry_sink::DEFAULT_HISTORY
}

fn default_window_size() -> [f32; 2] {
    [1400.0, 900.0]
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            telemetry_history: default_telemetry_history(),
            show_driver_labels: true,
            window_size: default_window_size(),
        }
    }
}

/// All user-tunable settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl ReplayConfig {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let tick = self.playback.base_tick_ms;
        if !(MIN_TICK_MS..=MAX_TICK_MS).contains(&tick) {
            return Err(ReplayError::Config(format!(
                "base_tick_ms must be within {}..={} (got {})",
                MIN_TICK_MS, MAX_TICK_MS, tick
            )));
        }

        let rate = self.playback.default_rate;
        if !(MIN_PLAYBACK_RATE..=MAX_PLAYBACK_RATE).contains(&rate) {
            return Err(ReplayError::Config(format!(
                "default_rate must be within {}..={} (got {})",
                MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE, rate
            )));
        }

        if self.ui.telemetry_history == 0 {
            return Err(ReplayError::Config(
                "telemetry_history must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReplayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.playback.tick_period(), Duration::from_millis(40));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ReplayConfig::default();
        config.playback.base_tick_ms = 0;
        assert!(matches!(config.validate(), Err(ReplayError::Config(_))));

        let mut config = ReplayConfig::default();
        config.playback.default_rate = 20.0;
        assert!(config.validate().is_err());

        let mut config = ReplayConfig::default();
        config.ui.telemetry_history = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ReplayConfig =
            serde_json::from_str(r#"{ "playback": { "default_rate": 2.0 } }"#).unwrap();
        assert_eq!(config.playback.base_tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.playback.default_rate, 2.0);
        assert!(config.ui.dark_mode);
    }
}
