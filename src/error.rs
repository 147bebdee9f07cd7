//! Error handling for Race Replay
//!
//! This module defines the crate-wide error type, the sink error type and a
//! Result alias used throughout the application.

use thiserror::Error;

/// Main error type for Race Replay operations
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Frame sequence handed to a buffer is malformed (gaps, bad indices,
    /// missing fields, non-finite values)
    #[error("Invalid frame sequence: {0}")]
    InvalidFrameSequence(String),

    /// Direct lookup outside the buffer
    #[error("Frame index {index} out of range (buffer has {len} frames)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Slice with `start > end`
    #[error("Invalid slice: start {start} is after end {end}")]
    InvalidSlice { start: usize, end: usize },

    /// Playback requested with nothing loaded
    #[error("Cannot start playback: frame buffer is empty")]
    EmptyBuffer,

    /// The external session source failed
    #[error("Session load error: {0}")]
    SessionLoad(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReplayError>,
    },
}

impl ReplayError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReplayError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &ReplayError {
        match self {
            ReplayError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(err: serde_json::Error) -> Self {
        ReplayError::Serialization(err.to_string())
    }
}

/// Result type alias for Race Replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Error reported by a frame sink. Isolated per sink, never aborts a tick.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink's downstream channel is gone
    #[error("Sink disconnected")]
    Disconnected,

    /// The sink could not render the frame
    #[error("Render failed: {0}")]
    Render(String),
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
