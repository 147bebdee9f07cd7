//! Derived analyses over a loaded session
//!
//! These run over the whole [`FrameBuffer`] on demand (e.g. when the user
//! opens a side panel) and never touch playback state. Sector splits are not
//! derivable from frames and come from the provider via [`SessionInfo`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::session::buffer::FrameBuffer;
use crate::session::types::SessionInfo;
use crate::types::{DriverCode, SectorTimes, TyreCompound, WeatherSample};

/// A continuous run on one compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TyreStint {
    pub compound: TyreCompound,
    pub start_lap: u32,
    pub end_lap: u32,
}

impl TyreStint {
    /// Number of laps in the stint, inclusive
    pub fn laps(&self) -> u32 {
        self.end_lap.saturating_sub(self.start_lap) + 1
    }
}

/// Per-driver stints, derived from compound changes across frames
pub fn tyre_strategy(buffer: &FrameBuffer) -> BTreeMap<DriverCode, Vec<TyreStint>> {
    let mut strategy: BTreeMap<DriverCode, Vec<TyreStint>> = BTreeMap::new();

    for frame in buffer {
        for (code, state) in &frame.drivers {
            let stints = strategy.entry(code.clone()).or_default();
            match stints.last_mut() {
                Some(stint) if stint.compound == state.tyre_compound => {
                    stint.end_lap = stint.end_lap.max(state.lap);
                }
                _ => stints.push(TyreStint {
                    compound: state.tyre_compound,
                    start_lap: state.lap,
                    end_lap: state.lap,
                }),
            }
        }
    }

    strategy
}

/// Time taken for one completed lap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapTime {
    pub lap: u32,
    pub time: Duration,
}

/// Completed laps of one driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverLapSummary {
    pub laps: Vec<LapTime>,
}

impl DriverLapSummary {
    pub fn fastest(&self) -> Option<LapTime> {
        self.laps.iter().copied().min_by_key(|l| l.time)
    }

    pub fn average(&self) -> Option<Duration> {
        if self.laps.is_empty() {
            return None;
        }
        let total: Duration = self.laps.iter().map(|l| l.time).sum();
        Some(total / self.laps.len() as u32)
    }
}

/// Lap times from lap-counter transitions.
///
/// A lap counts only when both its start and its end were observed: the
/// frame where the counter moved onto it (or the driver's first frame, if
/// that is on lap 1) and the frame where it moved on to the next lap.
pub fn lap_times(buffer: &FrameBuffer) -> BTreeMap<DriverCode, DriverLapSummary> {
    // Driver -> (current lap, when it started if observed)
    let mut open: BTreeMap<&str, (u32, Option<Duration>)> = BTreeMap::new();
    let mut summaries: BTreeMap<DriverCode, DriverLapSummary> = BTreeMap::new();

    for frame in buffer {
        for (code, state) in &frame.drivers {
            let summary = summaries.entry(code.clone()).or_default();
            match open.get_mut(code.as_str()) {
                None => {
                    let start = (state.lap == 1).then_some(frame.timestamp);
                    open.insert(code, (state.lap, start));
                }
                Some((lap, start)) if state.lap != *lap => {
                    if state.lap == *lap + 1 {
                        if let Some(started) = *start {
                            summary.laps.push(LapTime {
                                lap: *lap,
                                time: frame.timestamp.saturating_sub(started),
                            });
                        }
                    }
                    *lap = state.lap;
                    *start = Some(frame.timestamp);
                }
                Some(_) => {}
            }
        }
    }

    summaries
}

/// One sample of a driver's telemetry within a lap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapTelemetryPoint {
    /// Time since the start of the lap
    pub time: Duration,
    /// Distance since the start of the lap
    pub distance: f64,
    pub speed: f64,
    pub throttle: f64,
    pub brake: f64,
    pub gear: u8,
    pub drs_active: bool,
}

/// Telemetry of `code` over `lap`, for lap-on-lap comparison. `None` picks
/// the driver's fastest completed lap. Empty if the driver never ran that
/// lap or has no completed lap.
pub fn driver_telemetry(
    buffer: &FrameBuffer,
    code: &str,
    lap: Option<u32>,
) -> Vec<LapTelemetryPoint> {
    let lap = match lap {
        Some(lap) => lap,
        None => match lap_times(buffer).get(code).and_then(|s| s.fastest()) {
            Some(fastest) => fastest.lap,
            None => return Vec::new(),
        },
    };

    let mut origin: Option<(Duration, f64)> = None;

    buffer
        .iter()
        .filter_map(|frame| {
            let state = frame.driver(code).filter(|s| s.lap == lap)?;
            let (t0, d0) = *origin.get_or_insert((frame.timestamp, state.race_distance));
            Some(LapTelemetryPoint {
                time: frame.timestamp.saturating_sub(t0),
                distance: state.race_distance - d0,
                speed: state.speed,
                throttle: state.throttle,
                brake: state.brake,
                gear: state.gear,
                drs_active: state.drs_active,
            })
        })
        .collect()
}

/// Sector splits of one driver with their personal best per sector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorAnalysis {
    pub laps: Vec<SectorTimes>,
    /// Best time in sectors 1, 2 and 3, each from any lap
    pub best: [Option<Duration>; 3],
}

impl SectorAnalysis {
    /// Sum of the best sectors, if every sector was timed at least once
    pub fn ideal_lap(&self) -> Option<Duration> {
        self.best.iter().copied().sum()
    }

    /// Whether `lap` holds the best time in `sector` (0-based)
    pub fn is_best(&self, lap: &SectorTimes, sector: usize) -> bool {
        self.best
            .get(sector)
            .copied()
            .flatten()
            .is_some_and(|best| lap.sectors()[sector] == best)
    }
}

/// Per-lap sector splits of `code`. Empty when the provider sent no sector
/// data for that driver.
pub fn sector_analysis(session: &SessionInfo, code: &str) -> SectorAnalysis {
    let laps = session.sectors.get(code).cloned().unwrap_or_default();

    let mut best = [None; 3];
    for lap in &laps {
        for (slot, time) in best.iter_mut().zip(lap.sectors()) {
            *slot = Some(slot.map_or(time, |b: Duration| b.min(time)));
        }
    }

    SectorAnalysis { laps, best }
}

/// Weather at a point in the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    pub time: Duration,
    pub sample: WeatherSample,
}

/// Weather changes over the session; consecutive identical samples collapse
/// into the first.
pub fn weather_timeline(buffer: &FrameBuffer) -> Vec<WeatherPoint> {
    let mut timeline: Vec<WeatherPoint> = Vec::new();
    for frame in buffer {
        let Some(sample) = frame.weather else {
            continue;
        };
        if timeline.last().is_some_and(|p| p.sample == sample) {
            continue;
        }
        timeline.push(WeatherPoint {
            time: frame.timestamp,
            sample,
        });
    }
    timeline
}
