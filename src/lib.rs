//! # Race Replay: Motorsport Session Replay
//!
//! Replays a recorded race session frame by frame and keeps a track map,
//! a leaderboard and a telemetry chart in step with the playback cursor.
//!
//! ## Architecture
//!
//! - **Session**: Frame buffer, playback engine and the threaded controller
//!   that ticks it; the loader turns session files into validated frames
//! - **Sinks**: Consumers that receive every emitted frame (scene model,
//!   leaderboard, telemetry chart, broadcast channel to the UI)
//! - **Frontend**: Renders the viewer using eframe/egui with egui_plot
//! - **Communication**: Crossbeam channels between the ticker thread, the
//!   loader thread and the UI
//!
//! ## Configuration
//!
//! Application state (recent sessions, preferences) is stored in the
//! platform-appropriate data directory under `dev.racereplay.race-replay`.
//! See [`config`] for the exact locations.
//!
//! ## Example
//!
//! ```ignore
//! use race_replay::{
//!     session::{FileSessionSource, PlaybackController, PlaybackEngine, SessionLoader},
//!     session::types::{SessionKind, SessionRequest},
//!     DEFAULT_TICK_PERIOD,
//! };
//!
//! let loader = SessionLoader::new(Box::new(FileSessionSource::new("sessions")));
//! let session = loader.load_session(SessionRequest::new(2024, 1, SessionKind::Race))?;
//!
//! let mut controller = PlaybackController::new(PlaybackEngine::new(), DEFAULT_TICK_PERIOD);
//! controller.load_session(&session);
//! controller.play()?;
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod frontend;
pub mod session;
pub mod sinks;
pub mod types;

// Re-export commonly used types
pub use app::ReplayApp;
pub use config::{AppState, ReplayConfig};
pub use error::{ReplayError, Result, SinkError};
pub use session::{
    FrameBuffer, PlaybackController, PlaybackEngine, SessionLoader, DEFAULT_TICK_PERIOD,
};
pub use sinks::FrameSink;
pub use types::{DriverState, Frame, TrackGeometry};
