//! TelemetryChart - rolling telemetry history for one focused driver

use std::collections::VecDeque;

use crate::error::SinkError;
use crate::session::types::SessionInfo;
use crate::sinks::FrameSink;
use crate::types::{DriverCode, Frame};

/// Default number of samples kept (20 s at 25 frames per second)
pub const DEFAULT_HISTORY: usize = 500;

/// Telemetry of the focused driver at one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    /// Index of the frame it came from
    pub frame: usize,
    /// Session time in seconds
    pub time: f64,
    pub speed: f64,
    pub throttle: f64,
    pub brake: f64,
    pub gear: u8,
    pub drs_active: bool,
}

/// Channel selectable for plotting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryChannel {
    Speed,
    Throttle,
    Brake,
    Gear,
}

impl TelemetryChannel {
    pub const ALL: [TelemetryChannel; 4] = [
        TelemetryChannel::Speed,
        TelemetryChannel::Throttle,
        TelemetryChannel::Brake,
        TelemetryChannel::Gear,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TelemetryChannel::Speed => "Speed (km/h)",
            TelemetryChannel::Throttle => "Throttle (%)",
            TelemetryChannel::Brake => "Brake (%)",
            TelemetryChannel::Gear => "Gear",
        }
    }

    fn value(&self, sample: &TelemetrySample) -> f64 {
        match self {
            TelemetryChannel::Speed => sample.speed,
            TelemetryChannel::Throttle => sample.throttle,
            TelemetryChannel::Brake => sample.brake,
            TelemetryChannel::Gear => sample.gear as f64,
        }
    }
}

/// Bounded history for the focused driver.
///
/// Samples are kept in frame order. A frame at or before the newest sample
/// (a backwards seek, playing in reverse, or the same frame shown twice)
/// drops every sample from that frame on before it is appended. Distinct
/// frames that share a timestamp are all kept.
#[derive(Debug)]
pub struct TelemetryChart {
    focus: Option<DriverCode>,
    capacity: usize,
    history: VecDeque<TelemetrySample>,
}

impl Default for TelemetryChart {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl TelemetryChart {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            focus: None,
            capacity,
            history: VecDeque::with_capacity(capacity),
        }
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Change the focused driver; history restarts
    pub fn set_focus(&mut self, code: Option<DriverCode>) {
        if self.focus != code {
            self.focus = code;
            self.history.clear();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> &VecDeque<TelemetrySample> {
        &self.history
    }

    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.history.back()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// `[time, value]` pairs for one channel
    pub fn series(&self, channel: TelemetryChannel) -> Vec<[f64; 2]> {
        self.history
            .iter()
            .map(|s| [s.time, channel.value(s)])
            .collect()
    }

    pub fn update(&mut self, frame: &Frame) {
        let Some(code) = self.focus.as_deref() else {
            return;
        };
        let Some(state) = frame.driver(code) else {
            return;
        };

        let sample = TelemetrySample {
            frame: frame.index,
            time: frame.time_secs(),
            speed: state.speed,
            throttle: state.throttle,
            brake: state.brake,
            gear: state.gear,
            drs_active: state.drs_active,
        };

        // Discontinuity: forget everything at or after the new position
        while self.history.back().is_some_and(|s| s.frame >= sample.frame) {
            self.history.pop_back();
        }

        self.history.push_back(sample);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }
}

impl FrameSink for TelemetryChart {
    fn name(&self) -> &str {
        "TelemetryChart"
    }

    fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.update(frame);
        Ok(())
    }

    fn on_session(&mut self, session: &SessionInfo) {
        self.history.clear();
        if let Some(code) = &self.focus {
            if session.driver(code).is_none() {
                self.focus = None;
            }
        }
    }
}
