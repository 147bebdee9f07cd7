//! Frame sinks - consumers the playback engine pushes frames into.
//!
//! A sink receives every emitted frame synchronously, in registration order,
//! on every tick and every seek. Sinks only get `&Frame`; they can copy what
//! they need but never change the buffer.
//!
//! Built-in sinks:
//! - [`SceneModel`] - per-driver markers for the track map
//! - [`LeaderboardModel`] - live ranking by race distance
//! - [`TelemetryChart`] - rolling telemetry history for one driver
//! - [`BroadcastSink`] - forwards frames to another thread over a channel

pub mod broadcast_sink;
pub mod leaderboard_sink;
pub mod scene_sink;
pub mod telemetry_sink;

pub use broadcast_sink::{BroadcastSink, ReplayMessage};
pub use leaderboard_sink::{rank, LeaderboardEntry, LeaderboardModel};
pub use scene_sink::{DriverMarker, SceneModel};
pub use telemetry_sink::{TelemetryChannel, TelemetryChart, TelemetrySample};

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::SinkError;
use crate::session::types::SessionInfo;
use crate::types::Frame;

/// Consumer of emitted frames
pub trait FrameSink: Send {
    /// Human-readable name, used in logs
    fn name(&self) -> &str;

    /// Called for every emitted frame
    fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError>;

    /// Called when a new session replaces the previous one
    fn on_session(&mut self, _session: &SessionInfo) {}
}

/// Handle returned when registering a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(pub u32);

struct SinkSlot {
    id: SinkId,
    sink: Box<dyn FrameSink>,
    failures: u64,
}

/// Ordered set of sinks with per-sink failure isolation
#[derive(Default)]
pub struct SinkRegistry {
    slots: Vec<SinkSlot>,
    next_id: u32,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink; it is called after every sink registered before it.
    pub fn register(&mut self, sink: Box<dyn FrameSink>) -> SinkId {
        let id = SinkId(self.next_id);
        self.next_id += 1;
        tracing::debug!("Registered sink '{}' as {:?}", sink.name(), id);
        self.slots.push(SinkSlot {
            id,
            sink,
            failures: 0,
        });
        id
    }

    /// Remove a sink, returning it if it was registered
    pub fn unregister(&mut self, id: SinkId) -> Option<Box<dyn FrameSink>> {
        let pos = self.slots.iter().position(|s| s.id == id)?;
        Some(self.slots.remove(pos).sink)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of failed deliveries recorded for a sink
    pub fn failures(&self, id: SinkId) -> Option<u64> {
        self.slots.iter().find(|s| s.id == id).map(|s| s.failures)
    }

    /// Deliver a frame to every sink. A failing or panicking sink is logged
    /// and skipped; the rest still receive the frame. Returns the number of
    /// sinks that failed.
    pub fn emit(&mut self, frame: &Frame) -> usize {
        let mut failed = 0;
        for slot in &mut self.slots {
            let result = catch_unwind(AssertUnwindSafe(|| slot.sink.on_frame(frame)));
            let error = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(_) => "sink panicked".to_string(),
            };
            slot.failures += 1;
            failed += 1;
            tracing::warn!(
                "Sink '{}' failed on frame {}: {}",
                slot.sink.name(),
                frame.index,
                error
            );
        }
        failed
    }

    /// Announce a new session to every sink
    pub fn announce_session(&mut self, session: &SessionInfo) {
        for slot in &mut self.slots {
            let result = catch_unwind(AssertUnwindSafe(|| slot.sink.on_session(session)));
            if result.is_err() {
                slot.failures += 1;
                tracing::warn!("Sink '{}' panicked while resetting", slot.sink.name());
            }
        }
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| (s.id, s.sink.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<(&'static str, usize)>>>,
    }

    impl FrameSink for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
            self.log.lock().unwrap().push((self.name, frame.index));
            Ok(())
        }
    }

    struct Failing;

    impl FrameSink for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_frame(&mut self, _frame: &Frame) -> Result<(), SinkError> {
            Err(SinkError::Render("boom".to_string()))
        }
    }

    struct Panicking;

    impl FrameSink for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn on_frame(&mut self, _frame: &Frame) -> Result<(), SinkError> {
            panic!("sink bug");
        }
    }

    #[test]
    fn test_emit_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SinkRegistry::new();
        registry.register(Box::new(Recorder { name: "a", log: log.clone() }));
        registry.register(Box::new(Recorder { name: "b", log: log.clone() }));

        registry.emit(&Frame::new(4, Duration::ZERO));
        assert_eq!(*log.lock().unwrap(), vec![("a", 4), ("b", 4)]);
    }

    #[test]
    fn test_failures_are_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SinkRegistry::new();
        let failing = registry.register(Box::new(Failing));
        registry.register(Box::new(Panicking));
        registry.register(Box::new(Recorder { name: "after", log: log.clone() }));

        let failed = registry.emit(&Frame::new(0, Duration::ZERO));
        assert_eq!(failed, 2);
        assert_eq!(*log.lock().unwrap(), vec![("after", 0)]);
        assert_eq!(registry.failures(failing), Some(1));
    }

    #[test]
    fn test_unregister() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SinkRegistry::new();
        let id = registry.register(Box::new(Recorder { name: "a", log: log.clone() }));
        assert!(registry.unregister(id).is_some());
        assert!(registry.unregister(id).is_none());
        registry.emit(&Frame::new(0, Duration::ZERO));
        assert!(log.lock().unwrap().is_empty());
        assert!(registry.is_empty());
    }
}
