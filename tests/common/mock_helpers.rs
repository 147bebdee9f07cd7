//! Sink doubles shared by the integration tests

use std::sync::{Arc, Mutex};

use race_replay::error::SinkError;
use race_replay::session::types::SessionInfo;
use race_replay::types::Frame;
use race_replay::FrameSink;

/// Records every emitted frame index; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    frames: Arc<Mutex<Vec<usize>>>,
    sessions: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitted frame indices, in order
    pub fn frames(&self) -> Vec<usize> {
        self.frames.lock().unwrap().clone()
    }

    /// Event names of announced sessions
    pub fn sessions(&self) -> Vec<String> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
    }

    pub fn boxed(&self) -> Box<dyn FrameSink> {
        Box::new(self.clone())
    }
}

impl FrameSink for CollectingSink {
    fn name(&self) -> &str {
        "collecting"
    }

    fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.frames.lock().unwrap().push(frame.index);
        Ok(())
    }

    fn on_session(&mut self, session: &SessionInfo) {
        self.sessions.lock().unwrap().push(session.event_name.clone());
    }
}

/// Fails on every frame
pub struct FailingSink;

impl FrameSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_frame(&mut self, _frame: &Frame) -> Result<(), SinkError> {
        Err(SinkError::Render("always fails".to_string()))
    }
}

/// Panics on every frame
pub struct PanickingSink;

impl FrameSink for PanickingSink {
    fn name(&self) -> &str {
        "panicking"
    }

    fn on_frame(&mut self, _frame: &Frame) -> Result<(), SinkError> {
        panic!("sink blew up");
    }
}
