//! Session and playback data types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ReplayError;
use crate::types::{DriverCode, DriverInfo, SectorTimes};

/// Slowest accepted playback multiplier
pub const MIN_PLAYBACK_RATE: f64 = 0.5;

/// Fastest accepted playback multiplier
pub const MAX_PLAYBACK_RATE: f64 = 8.0;

/// State of the playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Initial state; also reached by `stop()` and at the end of a replay
    #[default]
    Stopped,
    /// A run is active and ticks advance the cursor
    Playing,
    /// Playback paused, cursor retained
    Paused,
}

impl PlaybackStatus {
    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackStatus::Playing)
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackStatus::Paused)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

/// Direction the cursor moves while playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// Sign applied to cursor movement
    pub fn sign(&self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Playback speed multiplier, always within
/// [`MIN_PLAYBACK_RATE`]..=[`MAX_PLAYBACK_RATE`]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct PlaybackRate(f64);

impl PlaybackRate {
    /// Clamp `rate` into the accepted domain. NaN falls back to real time.
    pub fn new(rate: f64) -> Self {
        if rate.is_nan() {
            return Self::default();
        }
        Self(rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whole frames to move on this base tick. The tick period never
    /// changes; `carry` keeps the fractional remainder between ticks, so
    /// 0.5x moves one frame every second tick and 2.5x alternates 2 and 3.
    pub fn frames_this_tick(&self, carry: &mut f64) -> usize {
        *carry += self.0;
        let whole = carry.floor();
        *carry -= whole;
        whole as usize
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self(1.0)
    }
}

impl From<f64> for PlaybackRate {
    fn from(rate: f64) -> Self {
        Self::new(rate)
    }
}

impl From<PlaybackRate> for f64 {
    fn from(rate: PlaybackRate) -> Self {
        rate.0
    }
}

/// Cancellation token identifying one continuous `Playing` run.
///
/// The engine hands out a new token on every transition into `Playing` and
/// retires it on pause, stop, load and end of replay. Ticks carrying a retired
/// token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken(pub(crate) u64);

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame at this index was emitted to every sink
    Emitted(usize),
    /// Below 1x: the frame on screen stays for this tick
    Held,
    /// The cursor reached the end; the engine is now `Stopped`
    Finished,
    /// The token no longer matches the active run; nothing happened
    Stale,
}

impl TickOutcome {
    /// Whether the scheduler should keep ticking
    pub fn keeps_running(&self) -> bool {
        matches!(self, TickOutcome::Emitted(_) | TickOutcome::Held)
    }
}

/// Kind of session within an event weekend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionKind {
    #[default]
    #[serde(rename = "R")]
    Race,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "S")]
    Sprint,
    #[serde(rename = "SQ")]
    SprintQualifying,
}

impl SessionKind {
    pub const ALL: [SessionKind; 4] = [
        SessionKind::Race,
        SessionKind::Qualifying,
        SessionKind::Sprint,
        SessionKind::SprintQualifying,
    ];

    /// Provider short code
    pub fn code(&self) -> &'static str {
        match self {
            SessionKind::Race => "R",
            SessionKind::Qualifying => "Q",
            SessionKind::Sprint => "S",
            SessionKind::SprintQualifying => "SQ",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionKind::Race => "Race",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::Sprint => "Sprint",
            SessionKind::SprintQualifying => "Sprint Qualifying",
        }
    }
}

impl FromStr for SessionKind {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R" | "RACE" => Ok(SessionKind::Race),
            "Q" | "QUALIFYING" => Ok(SessionKind::Qualifying),
            "S" | "SPRINT" => Ok(SessionKind::Sprint),
            "SQ" | "SPRINT_QUALIFYING" => Ok(SessionKind::SprintQualifying),
            other => Err(ReplayError::SessionLoad(format!(
                "Unknown session kind '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Identifies one session to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRequest {
    pub year: u16,
    pub round: u8,
    pub kind: SessionKind,
}

impl SessionRequest {
    pub fn new(year: u16, round: u8, kind: SessionKind) -> Self {
        Self { year, round, kind }
    }
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self::new(2024, 1, SessionKind::Race)
    }
}

impl fmt::Display for SessionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} round {} ({})", self.year, self.round, self.kind)
    }
}

/// Metadata for a loaded session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// What was requested
    pub request: SessionRequest,
    /// Event name reported by the provider
    pub event_name: String,
    /// Scheduled event date, if known
    pub event_date: Option<chrono::NaiveDate>,
    /// Highest lap number in the session
    pub total_laps: u32,
    /// Roster with team colours
    pub drivers: Vec<DriverInfo>,
    /// Per-lap sector splits, when the provider times them
    #[serde(default)]
    pub sectors: BTreeMap<DriverCode, Vec<SectorTimes>>,
    /// When this session was loaded
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

impl SessionInfo {
    /// Roster entry for a driver code
    pub fn driver(&self, code: &str) -> Option<&DriverInfo> {
        self.drivers.iter().find(|d| d.code == code)
    }

    /// Title used in window headers and status bars
    pub fn title(&self) -> String {
        format!(
            "{} {} - {}",
            self.request.year, self.event_name, self.request.kind
        )
    }
}
