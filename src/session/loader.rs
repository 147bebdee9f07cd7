//! Session loading - turns a provider response into a validated session.
//!
//! The provider side is abstracted by [`SessionSource`]. Its responses are
//! loosely typed: every field is optional on the wire so that a missing field
//! can be reported precisely instead of being defaulted. [`SessionLoader`]
//! validates the response and produces a [`LoadedSession`] whose
//! [`FrameBuffer`] already satisfies the buffer invariants.
//!
//! # Session files
//!
//! [`FileSessionSource`] reads pre-computed sessions from
//! `<root>/<year>/<round>_<kind>.json`, e.g. `2024/03_R.json`:
//!
//! ```json
//! {
//!   "event_name": "Australian Grand Prix",
//!   "event_date": "2024-03-24",
//!   "total_laps": 58,
//!   "driver_colors": { "VER": { "hex": "#3671C6" } },
//!   "track": { "x": [100.0, 101.5], "y": [400.0, 402.2] },
//!   "frames": [
//!     { "index": 0, "t": 0.0, "drivers": { "VER": {
//!         "x": 100.0, "y": 400.0, "dist": 0.0, "speed": 0.0, "gear": 1,
//!         "throttle": 0.0, "brake": false, "drs": 0, "lap": 1, "tyre": "MEDIUM"
//!     } } }
//!   ],
//!   "sectors": { "VER": [ { "lap": 1, "s1": 31.2, "s2": 27.9, "s3": 24.4 } ] }
//! }
//! ```
//!
//! `sectors` is optional; when present every listed lap needs all three
//! splits.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ReplayError, Result, ResultExt};
use crate::session::buffer::FrameBuffer;
use crate::session::types::{SessionInfo, SessionKind, SessionRequest};
use crate::types::{
    DriverCode, DriverColor, DriverInfo, DriverState, Frame, SectorTimes, TrackGeometry,
    TrackPoint, TyreCompound, WeatherSample,
};

/// Lowest DRS channel value that means the flap is open
const DRS_OPEN_THRESHOLD: u8 = 10;

// ==================== Wire types ====================

/// Brake channel: on/off or a 0-100 level depending on the provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBrake {
    Flag(bool),
    Level(f64),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDriverState {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub dist: Option<f64>,
    pub speed: Option<f64>,
    pub gear: Option<u8>,
    pub throttle: Option<f64>,
    pub brake: Option<RawBrake>,
    pub drs: Option<u8>,
    pub lap: Option<u32>,
    pub tyre: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWeather {
    pub track_temp: Option<f64>,
    pub air_temp: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub rainfall: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFrame {
    pub index: Option<usize>,
    /// Seconds since session start
    pub t: Option<f64>,
    pub drivers: Option<BTreeMap<String, RawDriverState>>,
    #[serde(default)]
    pub weather: Option<RawWeather>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDriverColor {
    pub hex: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrack {
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,
}

/// Sector splits of one lap, in seconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSectorLap {
    pub lap: Option<u32>,
    pub s1: Option<f64>,
    pub s2: Option<f64>,
    pub s3: Option<f64>,
}

/// A session as delivered by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSession {
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_date: Option<chrono::NaiveDate>,
    /// Scheduled race distance in laps; derived from the frames if absent
    pub total_laps: Option<u32>,
    pub driver_colors: Option<BTreeMap<String, RawDriverColor>>,
    pub track: Option<RawTrack>,
    pub frames: Option<Vec<RawFrame>>,
    #[serde(default)]
    pub sectors: Option<BTreeMap<String, Vec<RawSectorLap>>>,
}

// ==================== Source seam ====================

/// Provider of raw sessions (HTTP service, cache directory, ...)
#[cfg_attr(test, mockall::automock)]
pub trait SessionSource: Send {
    /// Fetch one session. Errors are opaque reasons from the provider.
    fn fetch(&self, request: &SessionRequest) -> std::result::Result<RawSession, String>;

    /// Sessions available for a season
    fn available(&self, _year: u16) -> std::result::Result<Vec<SessionRequest>, String> {
        Ok(Vec::new())
    }
}

/// Reads pre-computed session files from a directory tree
#[derive(Debug, Clone)]
pub struct FileSessionSource {
    root: PathBuf,
}

impl FileSessionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a request
    pub fn path_for(&self, request: &SessionRequest) -> PathBuf {
        self.root
            .join(request.year.to_string())
            .join(format!("{:02}_{}.json", request.round, request.kind.code()))
    }

    /// Write a raw session where [`FileSessionSource::fetch`] will find it
    pub fn store(&self, request: &SessionRequest, session: &RawSession) -> Result<PathBuf> {
        let path = self.path_for(request);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(session)
            .map_err(ReplayError::from)
            .context("Failed to encode session")?;
        std::fs::write(&path, content)
            .map_err(ReplayError::from)
            .with_context(|| format!("Failed to write session file {:?}", path))?;
        Ok(path)
    }
}

impl SessionSource for FileSessionSource {
    fn fetch(&self, request: &SessionRequest) -> std::result::Result<RawSession, String> {
        let path = self.path_for(request);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read session file {:?}: {}", path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse session file {:?}: {}", path, e))
    }

    fn available(&self, year: u16) -> std::result::Result<Vec<SessionRequest>, String> {
        let dir = self.root.join(year.to_string());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&dir)
            .map_err(|e| format!("Failed to list {:?}: {}", dir, e))?;

        let mut sessions: Vec<SessionRequest> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| parse_file_name(year, &entry.path()))
            .collect();
        sessions.sort_by_key(|r| (r.round, r.kind.code()));
        Ok(sessions)
    }
}

fn parse_file_name(year: u16, path: &Path) -> Option<SessionRequest> {
    if path.extension()?.to_str()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (round, kind) = stem.split_once('_')?;
    let round = round.parse().ok()?;
    let kind: SessionKind = kind.parse().ok()?;
    Some(SessionRequest::new(year, round, kind))
}

// ==================== Loader ====================

/// A validated session ready for playback
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub info: SessionInfo,
    pub track: TrackGeometry,
    pub buffer: FrameBuffer,
}

/// Bridges a [`SessionSource`] to the playback engine
pub struct SessionLoader {
    source: Box<dyn SessionSource>,
}

impl SessionLoader {
    pub fn new(source: Box<dyn SessionSource>) -> Self {
        Self { source }
    }

    /// Fetch and validate a session
    pub fn load_session(&self, request: SessionRequest) -> Result<LoadedSession> {
        tracing::info!("Loading session {}", request);

        let raw = self.source.fetch(&request).map_err(|reason| {
            tracing::warn!("Session source failed for {}: {}", request, reason);
            ReplayError::SessionLoad(reason)
        })?;

        let session = build_session(request, raw)?;
        tracing::info!(
            "Loaded {}: {} frames, {} drivers, {} track points",
            session.info.title(),
            session.buffer.len(),
            session.info.drivers.len(),
            session.track.points.len()
        );
        Ok(session)
    }

    /// Sessions the source offers for a season
    pub fn available(&self, year: u16) -> Result<Vec<SessionRequest>> {
        self.source.available(year).map_err(ReplayError::SessionLoad)
    }
}

fn invalid(message: impl Into<String>) -> ReplayError {
    ReplayError::InvalidFrameSequence(message.into())
}

fn require<T>(value: Option<T>, what: impl FnOnce() -> String) -> Result<T> {
    value.ok_or_else(|| invalid(format!("missing field: {}", what())))
}

fn finite(value: f64, what: impl FnOnce() -> String) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(format!("non-finite value for {}", what())))
    }
}

/// Validate a raw session and convert it into typed records
pub fn build_session(request: SessionRequest, raw: RawSession) -> Result<LoadedSession> {
    let event_name = require(raw.event_name, || "event_name".to_string())?;

    let colors = require(raw.driver_colors, || "driver_colors".to_string())?;
    let mut drivers = Vec::with_capacity(colors.len());
    for (code, color) in colors {
        let hex = require(color.hex, || format!("driver_colors.{}.hex", code))?;
        let color = DriverColor::from_hex(&hex)
            .ok_or_else(|| invalid(format!("invalid colour '{}' for driver {}", hex, code)))?;
        drivers.push(DriverInfo { code, color });
    }

    let track = build_track(require(raw.track, || "track".to_string())?)?;

    let raw_frames = require(raw.frames, || "frames".to_string())?;
    let frames = build_frames(raw_frames, &drivers)?;
    let buffer = FrameBuffer::from_frames(frames)?;

    let sectors = match raw.sectors {
        Some(sectors) => build_sectors(sectors, &drivers)?,
        None => BTreeMap::new(),
    };

    let total_laps = raw.total_laps.unwrap_or_else(|| {
        buffer
            .iter()
            .flat_map(|f| f.drivers.values().map(|d| d.lap))
            .max()
            .unwrap_or(0)
    });

    Ok(LoadedSession {
        info: SessionInfo {
            request,
            event_name,
            event_date: raw.event_date,
            total_laps,
            drivers,
            sectors,
            loaded_at: chrono::Utc::now(),
        },
        track,
        buffer,
    })
}

fn build_track(raw: RawTrack) -> Result<TrackGeometry> {
    let xs = require(raw.x, || "track.x".to_string())?;
    let ys = require(raw.y, || "track.y".to_string())?;
    if xs.len() != ys.len() {
        return Err(invalid(format!(
            "track outline has {} x values but {} y values",
            xs.len(),
            ys.len()
        )));
    }

    let points = xs
        .into_iter()
        .zip(ys)
        .enumerate()
        .map(|(i, (x, y))| {
            Ok(TrackPoint {
                x: finite(x, || format!("track.x[{}]", i))?,
                y: finite(y, || format!("track.y[{}]", i))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TrackGeometry::new(points))
}

fn build_frames(raw_frames: Vec<RawFrame>, roster: &[DriverInfo]) -> Result<Vec<Frame>> {
    let mut frames = Vec::with_capacity(raw_frames.len());
    let mut last_distance: HashMap<String, f64> = HashMap::new();
    let mut distance_regressions = 0usize;
    let mut last_timestamp = Duration::ZERO;

    for (position, raw) in raw_frames.into_iter().enumerate() {
        let index = require(raw.index, || format!("frames[{}].index", position))?;
        let t = finite(require(raw.t, || format!("frames[{}].t", position))?, || {
            format!("frames[{}].t", position)
        })?;
        let timestamp = Duration::try_from_secs_f64(t)
            .map_err(|_| invalid(format!("frames[{}].t is negative ({})", position, t)))?;
        if timestamp < last_timestamp {
            return Err(invalid(format!(
                "frames[{}] goes back in time ({:?} < {:?})",
                position, timestamp, last_timestamp
            )));
        }
        last_timestamp = timestamp;

        let mut frame = Frame::new(index, timestamp);

        let raw_drivers = require(raw.drivers, || format!("frames[{}].drivers", position))?;
        for (code, state) in raw_drivers {
            if !roster.iter().any(|d| d.code == code) {
                return Err(invalid(format!(
                    "frames[{}] has driver {} who is not in the roster",
                    position, code
                )));
            }
            let state = build_driver_state(position, &code, state)?;

            if let Some(previous) = last_distance.insert(code.clone(), state.race_distance) {
                if state.race_distance < previous {
                    distance_regressions += 1;
                }
            }
            frame.drivers.insert(code, state);
        }

        if let Some(weather) = raw.weather {
            frame.weather = Some(build_weather(position, weather)?);
        }

        frames.push(frame);
    }

    if distance_regressions > 0 {
        tracing::debug!(
            "Tolerated {} race-distance regressions (data gaps)",
            distance_regressions
        );
    }

    Ok(frames)
}

fn build_driver_state(position: usize, code: &str, raw: RawDriverState) -> Result<DriverState> {
    let field = |name: &str| format!("frames[{}].drivers.{}.{}", position, code, name);

    let throttle = finite(require(raw.throttle, || field("throttle"))?, || field("throttle"))?;
    let brake = match require(raw.brake, || field("brake"))? {
        RawBrake::Flag(true) => 100.0,
        RawBrake::Flag(false) => 0.0,
        RawBrake::Level(level) => finite(level, || field("brake"))?,
    };
    if !(0.0..=100.0).contains(&throttle) || !(0.0..=100.0).contains(&brake) {
        return Err(invalid(format!(
            "{} pedal value out of 0-100 (throttle {}, brake {})",
            field("pedals"),
            throttle,
            brake
        )));
    }

    Ok(DriverState {
        x: finite(require(raw.x, || field("x"))?, || field("x"))?,
        y: finite(require(raw.y, || field("y"))?, || field("y"))?,
        speed: finite(require(raw.speed, || field("speed"))?, || field("speed"))?,
        gear: require(raw.gear, || field("gear"))?,
        throttle,
        brake,
        drs_active: require(raw.drs, || field("drs"))? >= DRS_OPEN_THRESHOLD,
        tyre_compound: TyreCompound::from_label(&require(raw.tyre, || field("tyre"))?),
        race_distance: finite(require(raw.dist, || field("dist"))?, || field("dist"))?,
        lap: require(raw.lap, || field("lap"))?,
    })
}

fn build_weather(position: usize, raw: RawWeather) -> Result<WeatherSample> {
    let field = |name: &str| format!("frames[{}].weather.{}", position, name);
    Ok(WeatherSample {
        track_temp: finite(require(raw.track_temp, || field("track_temp"))?, || {
            field("track_temp")
        })?,
        air_temp: finite(require(raw.air_temp, || field("air_temp"))?, || field("air_temp"))?,
        humidity: finite(require(raw.humidity, || field("humidity"))?, || field("humidity"))?,
        wind_speed: finite(require(raw.wind_speed, || field("wind_speed"))?, || {
            field("wind_speed")
        })?,
        rainfall: require(raw.rainfall, || field("rainfall"))?,
    })
}

fn build_sectors(
    raw: BTreeMap<String, Vec<RawSectorLap>>,
    roster: &[DriverInfo],
) -> Result<BTreeMap<DriverCode, Vec<SectorTimes>>> {
    let mut sectors = BTreeMap::new();
    for (code, laps) in raw {
        if !roster.iter().any(|d| d.code == code) {
            return Err(invalid(format!(
                "sectors has driver {} who is not in the roster",
                code
            )));
        }

        let mut timed = laps
            .into_iter()
            .enumerate()
            .map(|(i, lap)| build_sector_lap(&code, i, lap))
            .collect::<Result<Vec<_>>>()?;
        timed.sort_by_key(|s| s.lap);
        sectors.insert(code, timed);
    }
    Ok(sectors)
}

fn build_sector_lap(code: &str, position: usize, raw: RawSectorLap) -> Result<SectorTimes> {
    let field = |name: &str| format!("sectors.{}[{}].{}", code, position, name);
    let split = |value: Option<f64>, name: &str| -> Result<Duration> {
        let secs = finite(require(value, || field(name))?, || field(name))?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| invalid(format!("{} is negative ({})", field(name), secs)))
    };

    Ok(SectorTimes {
        lap: require(raw.lap, || field("lap"))?,
        sector1: split(raw.s1, "s1")?,
        sector2: split(raw.s2, "s2")?,
        sector3: split(raw.s3, "s3")?,
    })
}
