//! Shared state types for the frontend
//!
//! Panels receive read-only views of the viewer state and return
//! `AppAction`s instead of touching the controller directly.

use std::collections::BTreeMap;

use crate::session::analysis::{self, DriverLapSummary, TyreStint, WeatherPoint};
use crate::session::buffer::FrameBuffer;
use crate::session::types::{Direction, SessionInfo, SessionKind, SessionRequest};
use crate::sinks::{LeaderboardModel, ReplayMessage, SceneModel, TelemetryChart};
use crate::types::{DriverCode, TrackGeometry};

/// Actions that any panel can emit
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    // Session
    /// Fetch and load a session in the background
    LoadSession(SessionRequest),
    /// Re-scan the data directory for a season
    RefreshAvailable(u16),

    // Playback
    TogglePlay,
    Stop,
    /// Move the cursor by a number of frames and show it
    Step(isize),
    /// Jump to a frame
    Seek(usize),
    SetRate(f64),
    SetDirection(Direction),

    // View
    /// Follow a driver in the telemetry chart
    FocusDriver(Option<DriverCode>),
    ToggleAnalysis,
}

/// Inputs of the session load form
#[derive(Debug, Clone)]
pub struct LoadForm {
    pub year: u16,
    pub round: u8,
    pub kind: SessionKind,
    /// Sessions found on disk for `year`
    pub available: Vec<SessionRequest>,
}

impl Default for LoadForm {
    fn default() -> Self {
        let request = SessionRequest::default();
        Self {
            year: request.year,
            round: request.round,
            kind: request.kind,
            available: Vec::new(),
        }
    }
}

impl LoadForm {
    pub fn request(&self) -> SessionRequest {
        SessionRequest::new(self.year, self.round, self.kind)
    }

    pub fn set_request(&mut self, request: SessionRequest) {
        self.year = request.year;
        self.round = request.round;
        self.kind = request.kind;
    }
}

/// Analyses computed once per loaded session
#[derive(Debug, Clone, Default)]
pub struct SessionAnalysis {
    pub strategy: BTreeMap<DriverCode, Vec<TyreStint>>,
    pub lap_times: BTreeMap<DriverCode, DriverLapSummary>,
    pub weather: Vec<WeatherPoint>,
}

impl SessionAnalysis {
    pub fn compute(buffer: &FrameBuffer) -> Self {
        Self {
            strategy: analysis::tyre_strategy(buffer),
            lap_times: analysis::lap_times(buffer),
            weather: analysis::weather_timeline(buffer),
        }
    }
}

/// What the viewer shows. Fed from the broadcast channel on the UI thread.
#[derive(Debug, Default)]
pub struct ViewerModels {
    pub session: Option<SessionInfo>,
    pub track: TrackGeometry,
    /// Shared with the engine; used for analyses, never for playback
    pub buffer: FrameBuffer,
    pub scene: SceneModel,
    pub leaderboard: LeaderboardModel,
    pub telemetry: TelemetryChart,
    pub analysis: Option<SessionAnalysis>,
    /// Frame currently on screen
    pub frame_index: Option<usize>,
}

impl ViewerModels {
    pub fn new(telemetry_history: usize) -> Self {
        Self {
            telemetry: TelemetryChart::new(telemetry_history),
            ..Self::default()
        }
    }

    /// Apply one message from the broadcast channel
    pub fn apply(&mut self, message: ReplayMessage) {
        match message {
            ReplayMessage::Session(info) => {
                self.scene.reset(&info);
                self.leaderboard.clear();
                self.telemetry.clear();
                if let Some(code) = self.telemetry.focus() {
                    if info.driver(code).is_none() {
                        self.telemetry.set_focus(None);
                    }
                }
                self.frame_index = None;
                self.session = Some(*info);
            }
            ReplayMessage::Frame(frame) => {
                self.scene.update(&frame);
                self.leaderboard.update(&frame);
                self.telemetry.update(&frame);
                self.frame_index = Some(frame.index);
            }
        }
    }

    /// Compute the analyses for the current session if not done yet
    pub fn ensure_analysis(&mut self) {
        if self.analysis.is_none() {
            self.analysis = Some(SessionAnalysis::compute(&self.buffer));
        }
    }
}
