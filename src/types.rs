//! Core data types for Race Replay
//!
//! This module contains the fundamental records shared by the frame buffer,
//! the playback engine and every sink.
//!
//! # Main Types
//!
//! - [`Frame`] - One recorded instant of race state across all drivers
//! - [`DriverState`] - Position and car telemetry of one driver in a frame
//! - [`TyreCompound`] - Categorical tyre label
//! - [`WeatherSample`] - Optional track conditions attached to a frame
//! - [`SectorTimes`] - Sector split of one completed lap
//! - [`TrackGeometry`] - Ordered circuit outline in track-plane coordinates
//! - [`DriverInfo`] - Roster entry with team colour
//!
//! Frames are plain data. They are constructed by the session loader after
//! validation and are never mutated afterwards; sinks only ever see `&Frame`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Stable three-letter driver identifier (e.g. `VER`)
pub type DriverCode = String;

/// Tyre compound fitted at a given frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TyreCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    #[default]
    Unknown,
}

impl TyreCompound {
    /// Parse the provider's compound label. Unrecognised labels map to
    /// [`TyreCompound::Unknown`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "SOFT" | "S" => TyreCompound::Soft,
            "MEDIUM" | "M" => TyreCompound::Medium,
            "HARD" | "H" => TyreCompound::Hard,
            "INTERMEDIATE" | "I" => TyreCompound::Intermediate,
            "WET" | "W" => TyreCompound::Wet,
            _ => TyreCompound::Unknown,
        }
    }

    /// Single-letter label used in the leaderboard
    pub fn short_label(&self) -> &'static str {
        match self {
            TyreCompound::Soft => "S",
            TyreCompound::Medium => "M",
            TyreCompound::Hard => "H",
            TyreCompound::Intermediate => "I",
            TyreCompound::Wet => "W",
            TyreCompound::Unknown => "?",
        }
    }

    /// Conventional sidewall colour (RGB)
    pub fn color(&self) -> [u8; 3] {
        match self {
            TyreCompound::Soft => [218, 41, 28],
            TyreCompound::Medium => [255, 210, 0],
            TyreCompound::Hard => [235, 235, 235],
            TyreCompound::Intermediate => [67, 176, 42],
            TyreCompound::Wet => [0, 103, 173],
            TyreCompound::Unknown => [128, 128, 128],
        }
    }
}

impl fmt::Display for TyreCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TyreCompound::Soft => "Soft",
            TyreCompound::Medium => "Medium",
            TyreCompound::Hard => "Hard",
            TyreCompound::Intermediate => "Intermediate",
            TyreCompound::Wet => "Wet",
            TyreCompound::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

/// State of a single driver within a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    /// Track-plane X coordinate
    pub x: f64,
    /// Track-plane Y coordinate
    pub y: f64,
    /// Speed in km/h
    pub speed: f64,
    /// Selected gear (0 = neutral)
    pub gear: u8,
    /// Throttle application, 0-100
    pub throttle: f64,
    /// Brake application, 0-100 (on/off providers report 0 or 100)
    pub brake: f64,
    /// Whether DRS is open
    pub drs_active: bool,
    /// Fitted tyre compound
    pub tyre_compound: TyreCompound,
    /// Distance covered since session start, used for ranking
    pub race_distance: f64,
    /// Current lap number
    pub lap: u32,
}

/// Track conditions sampled alongside a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub track_temp: f64,
    pub air_temp: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub rainfall: bool,
}

/// Sector split of one completed lap, as timed by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorTimes {
    pub lap: u32,
    pub sector1: Duration,
    pub sector2: Duration,
    pub sector3: Duration,
}

impl SectorTimes {
    pub fn sectors(&self) -> [Duration; 3] {
        [self.sector1, self.sector2, self.sector3]
    }

    /// Lap time as the sum of its sectors
    pub fn total(&self) -> Duration {
        self.sector1 + self.sector2 + self.sector3
    }
}

/// One recorded instant of race state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Zero-based position in the session sequence
    pub index: usize,
    /// Time since session start
    pub timestamp: Duration,
    /// Driver code to state. At most one entry per driver.
    pub drivers: BTreeMap<DriverCode, DriverState>,
    /// Track conditions, if the provider had them
    #[serde(default)]
    pub weather: Option<WeatherSample>,
}

impl Frame {
    /// Create an empty frame
    pub fn new(index: usize, timestamp: Duration) -> Self {
        Self {
            index,
            timestamp,
            drivers: BTreeMap::new(),
            weather: None,
        }
    }

    /// Builder-style helper to add a driver
    pub fn with_driver(mut self, code: impl Into<DriverCode>, state: DriverState) -> Self {
        self.drivers.insert(code.into(), state);
        self
    }

    /// Look up one driver
    pub fn driver(&self, code: &str) -> Option<&DriverState> {
        self.drivers.get(code)
    }

    /// Timestamp in seconds
    pub fn time_secs(&self) -> f64 {
        self.timestamp.as_secs_f64()
    }
}

/// A point on the circuit outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

/// Ordered circuit outline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometry {
    pub points: Vec<TrackPoint>,
}

impl TrackGeometry {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounds as `([min_x, min_y], [max_x, max_y])`
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let first = self.points.first()?;
        let mut min = [first.x, first.y];
        let mut max = [first.x, first.y];
        for p in &self.points[1..] {
            min[0] = min[0].min(p.x);
            min[1] = min[1].min(p.y);
            max[0] = max[0].max(p.x);
            max[1] = max[1].max(p.y);
        }
        Some((min, max))
    }

    /// Points as plot-friendly pairs, closing the loop
    pub fn as_plot_points(&self) -> Vec<[f64; 2]> {
        let mut points: Vec<[f64; 2]> = self.points.iter().map(|p| [p.x, p.y]).collect();
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
        points
    }
}

/// Team colour of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverColor {
    pub rgb: [u8; 3],
}

impl DriverColor {
    /// Parse `#RRGGBB` or `RRGGBB`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            rgb: [channel(0)?, channel(2)?, channel(4)?],
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

impl Default for DriverColor {
    fn default() -> Self {
        Self {
            rgb: [255, 255, 255],
        }
    }
}

/// Roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub code: DriverCode,
    pub color: DriverColor,
}
