//! Test data builders for creating test objects

use std::collections::BTreeMap;
use std::time::Duration;

use race_replay::session::loader::{
    RawBrake, RawDriverColor, RawDriverState, RawFrame, RawSession, RawTrack,
};
use race_replay::types::{DriverState, Frame, TyreCompound};
use race_replay::FrameBuffer;

/// Milliseconds between consecutive built frames
pub const FRAME_SPACING_MS: u64 = 40;

/// Builder for a single driver's state
#[derive(Debug, Clone)]
pub struct DriverBuilder {
    state: DriverState,
}

impl DriverBuilder {
    pub fn new() -> Self {
        Self {
            state: DriverState {
                x: 0.0,
                y: 0.0,
                speed: 200.0,
                gear: 6,
                throttle: 80.0,
                brake: 0.0,
                drs_active: false,
                tyre_compound: TyreCompound::Medium,
                race_distance: 0.0,
                lap: 1,
            },
        }
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.state.x = x;
        self.state.y = y;
        self
    }

    pub fn distance(mut self, race_distance: f64) -> Self {
        self.state.race_distance = race_distance;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.state.speed = speed;
        self
    }

    pub fn lap(mut self, lap: u32) -> Self {
        self.state.lap = lap;
        self
    }

    pub fn tyre(mut self, tyre: TyreCompound) -> Self {
        self.state.tyre_compound = tyre;
        self
    }

    pub fn build(self) -> DriverState {
        self.state
    }
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a frame sequence
pub struct BufferBuilder {
    drivers: Vec<String>,
    frames: usize,
}

impl BufferBuilder {
    pub fn new(frames: usize) -> Self {
        Self {
            drivers: vec!["VER".to_string()],
            frames,
        }
    }

    pub fn drivers(mut self, codes: &[&str]) -> Self {
        self.drivers = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Every driver advances 10 m per frame, later drivers start further back
    pub fn build_frames(&self) -> Vec<Frame> {
        (0..self.frames)
            .map(|i| {
                let mut frame = Frame::new(i, Duration::from_millis(i as u64 * FRAME_SPACING_MS));
                for (n, code) in self.drivers.iter().enumerate() {
                    let distance = i as f64 * 10.0 - n as f64 * 5.0;
                    frame = frame.with_driver(
                        code.as_str(),
                        DriverBuilder::new()
                            .position(i as f64, n as f64)
                            .distance(distance)
                            .build(),
                    );
                }
                frame
            })
            .collect()
    }

    pub fn build(self) -> FrameBuffer {
        FrameBuffer::from_frames(self.build_frames()).expect("builder frames are valid")
    }
}

/// Builder for provider responses
pub struct RawSessionBuilder {
    session: RawSession,
}

impl RawSessionBuilder {
    /// A well-formed session with `frames` frames over `laps` laps
    pub fn new(drivers: &[&str], frames: usize, laps: u32) -> Self {
        let colors: BTreeMap<String, RawDriverColor> = drivers
            .iter()
            .map(|code| {
                (
                    code.to_string(),
                    RawDriverColor {
                        hex: Some("#3671C6".to_string()),
                    },
                )
            })
            .collect();

        let per_lap = frames.max(1).div_ceil(laps.max(1) as usize);
        let raw_frames = (0..frames)
            .map(|i| RawFrame {
                index: Some(i),
                t: Some(i as f64 * FRAME_SPACING_MS as f64 / 1000.0),
                drivers: Some(
                    drivers
                        .iter()
                        .enumerate()
                        .map(|(n, code)| {
                            (
                                code.to_string(),
                                RawDriverState {
                                    x: Some(i as f64),
                                    y: Some(n as f64),
                                    dist: Some(i as f64 * 10.0 - n as f64),
                                    speed: Some(250.0),
                                    gear: Some(7),
                                    throttle: Some(100.0),
                                    brake: Some(RawBrake::Flag(false)),
                                    drs: Some(0),
                                    lap: Some((i / per_lap) as u32 + 1),
                                    tyre: Some("SOFT".to_string()),
                                },
                            )
                        })
                        .collect(),
                ),
                weather: None,
            })
            .collect();

        Self {
            session: RawSession {
                event_name: Some("Test Grand Prix".to_string()),
                event_date: None,
                total_laps: Some(laps),
                driver_colors: Some(colors),
                track: Some(RawTrack {
                    x: Some(vec![0.0, 100.0, 100.0, 0.0]),
                    y: Some(vec![0.0, 0.0, 50.0, 50.0]),
                }),
                frames: Some(raw_frames),
                sectors: None,
            },
        }
    }

    /// Apply an arbitrary edit to the response
    pub fn edit(mut self, f: impl FnOnce(&mut RawSession)) -> Self {
        f(&mut self.session);
        self
    }

    pub fn build(self) -> RawSession {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_builder() {
        let buffer = BufferBuilder::new(5).drivers(&["VER", "HAM"]).build();
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.get(4).unwrap().drivers.len(), 2);
    }
}
