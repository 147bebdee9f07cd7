//! Configuration module for Race Replay
//!
//! This module handles application configuration including:
//! - Application state persistence (recent sessions, last session)
//! - Replay settings (tick period, default rate, data directory, UI)
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.racereplay.race-replay/`
//! - **macOS**: `~/Library/Application Support/dev.racereplay.race-replay/`
//! - **Windows**: `%APPDATA%\dev.racereplay.race-replay\`
//!
//! # Files
//!
//! - `app_state.json` - Settings, recent sessions and last session
//! - `logs/` - Daily rolling log files
//! - `sessions/` - Default session data directory
//!
//! # Example
//!
//! ```ignore
//! use race_replay::config::AppState;
//!
//! let mut state = AppState::load_or_default();
//! state.add_recent_session(request, "2024 Bahrain Grand Prix - Race");
//! state.save()?;
//! ```

pub mod settings;

pub use settings::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReplayError, Result};
use crate::session::types::SessionRequest;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.racereplay.race-replay";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Maximum number of recent sessions to remember
pub const MAX_RECENT_SESSIONS: usize = 10;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        ReplayError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            ReplayError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

/// Directory for rolling log files
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join("logs"))
}

// ==================== Recent Session Entry ====================

/// A session the user loaded before
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSession {
    pub request: SessionRequest,

    /// Title shown in the recent list
    pub title: String,

    pub last_opened: chrono::DateTime<chrono::Utc>,
}

impl RecentSession {
    pub fn new(request: SessionRequest, title: impl Into<String>) -> Self {
        Self {
            request,
            title: title.into(),
            last_opened: chrono::Utc::now(),
        }
    }
}

// ==================== App State ====================

/// Persistent application state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// Recently loaded sessions, most recent first
    #[serde(default)]
    pub recent_sessions: Vec<RecentSession>,

    /// Session restored on startup
    #[serde(default)]
    pub last_session: Option<SessionRequest>,

    #[serde(default)]
    pub config: ReplayConfig,
}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            recent_sessions: Vec::new(),
            last_session: None,
            config: ReplayConfig::default(),
        }
    }
}

impl AppState {
    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path().ok_or_else(|| {
            ReplayError::Config("Could not determine app state path".to_string())
        })?;
        Self::load_from(path)
    }

    /// Load app state from a specific file. A missing file yields defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ReplayError::Config(format!("Failed to read app state: {}", e)))?;

        let state: Self = serde_json::from_str(&content)
            .map_err(|e| ReplayError::Config(format!("Failed to parse app state: {}", e)))?;
        state.config.validate()?;
        Ok(state)
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(APP_STATE_FILE))
    }

    /// Save app state to a specific file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ReplayError::Config(format!("Failed to serialize app state: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| ReplayError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Add or refresh a recent session and make it the last session
    pub fn add_recent_session(&mut self, request: SessionRequest, title: impl Into<String>) {
        self.recent_sessions.retain(|s| s.request != request);
        self.recent_sessions
            .insert(0, RecentSession::new(request, title));
        self.recent_sessions.truncate(MAX_RECENT_SESSIONS);
        self.last_session = Some(request);
    }

    /// Forget a session (e.g. its file was deleted)
    pub fn remove_recent_session(&mut self, request: &SessionRequest) {
        self.recent_sessions.retain(|s| &s.request != request);
        if self.last_session.as_ref() == Some(request) {
            self.last_session = None;
        }
    }
}
