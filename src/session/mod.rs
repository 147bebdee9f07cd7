//! Session loading and playback
//!
//! This module holds everything between the data provider and the sinks:
//! validated frame storage, the playback state machine, its timer-driven
//! controller, the loader adapter and on-demand analyses.
//!
//! # Features
//!
//! - Load sessions from a pluggable [`SessionSource`]
//! - Play, pause, stop, seek and step through a session
//! - Variable playback rate and direction
//! - Tyre strategy, lap times and weather derived from the frames

pub mod analysis;
pub mod buffer;
pub mod controller;
pub mod engine;
pub mod loader;
pub mod types;

pub use buffer::FrameBuffer;
pub use controller::{PlaybackController, PlaybackSnapshot, Ticker, DEFAULT_TICK_PERIOD};
pub use engine::PlaybackEngine;
pub use loader::{FileSessionSource, LoadedSession, RawSession, SessionLoader, SessionSource};
pub use types::{
    Direction, PlaybackRate, PlaybackStatus, RunToken, SessionInfo, SessionKind, SessionRequest,
    TickOutcome, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE,
};
