//! BroadcastSink - forwards emitted frames to another thread.
//!
//! The UI thread cannot be called from the ticker thread, so the viewer
//! registers a `BroadcastSink` and drains the receiving end once per repaint.
//! Frame sends never block: when the channel is full the frame is dropped
//! and counted. The session announcement is a control message and waits up
//! to [`SESSION_SEND_TIMEOUT`] for room, since the consumer cannot make sense
//! of later frames without it.

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use std::time::Duration;

use crate::error::SinkError;
use crate::session::types::SessionInfo;
use crate::sinks::FrameSink;
use crate::types::Frame;

/// Default channel capacity, about four seconds of real-time frames
pub const DEFAULT_CAPACITY: usize = 100;

/// How long a session announcement waits for the consumer to make room
pub const SESSION_SEND_TIMEOUT: Duration = Duration::from_millis(250);

/// Message carried from the engine to the consumer
#[derive(Debug, Clone)]
pub enum ReplayMessage {
    /// A new session replaced the previous one
    Session(Box<SessionInfo>),
    /// A frame was emitted
    Frame(Frame),
}

pub struct BroadcastSink {
    tx: Sender<ReplayMessage>,
    dropped: u64,
}

impl BroadcastSink {
    pub fn new(tx: Sender<ReplayMessage>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Create a sink together with the receiver it feeds
    pub fn channel(capacity: usize) -> (Self, Receiver<ReplayMessage>) {
        let (tx, rx) = bounded(capacity);
        (Self::new(tx), rx)
    }

    /// Frames dropped since the last session change
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn report_drops(&self) {
        if self.dropped > 0 {
            tracing::warn!(
                "BroadcastSink dropped {} frames due to backpressure",
                self.dropped
            );
        }
    }
}

impl FrameSink for BroadcastSink {
    fn name(&self) -> &str {
        "BroadcastSink"
    }

    fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        match self.tx.try_send(ReplayMessage::Frame(frame.clone())) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(SinkError::Disconnected),
        }
    }

    fn on_session(&mut self, session: &SessionInfo) {
        self.report_drops();
        self.dropped = 0;
        let message = ReplayMessage::Session(Box::new(session.clone()));
        match self.tx.send_timeout(message, SESSION_SEND_TIMEOUT) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => tracing::warn!(
                "BroadcastSink could not announce session: channel full for {:?}",
                SESSION_SEND_TIMEOUT
            ),
            Err(SendTimeoutError::Disconnected(_)) => {
                tracing::debug!("BroadcastSink receiver is gone")
            }
        }
    }
}

impl Drop for BroadcastSink {
    fn drop(&mut self) {
        self.report_drops();
    }
}
