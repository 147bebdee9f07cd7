//! Playback engine - the cursor state machine that drives frames into sinks.
//!
//! The engine is plain single-threaded state. Something outside it (the
//! [`Ticker`](super::controller::Ticker), a test, a UI loop) calls
//! [`PlaybackEngine::tick`] once per base period with the [`RunToken`] it got
//! from [`PlaybackEngine::play`]. Every transition out of `Playing` retires
//! the token, so a tick that was already in flight when the state changed is
//! ignored instead of emitting a stale frame.
//!
//! Speed is expressed as frames moved per tick, never as a different tick
//! period. Every frame the cursor passes is emitted in order, so the rate
//! changes pacing only: 4x shows the same frames as 1x in a quarter of the
//! ticks, and 0.5x holds each frame for two ticks.

use std::time::Duration;

use crate::error::{ReplayError, Result};
use crate::session::buffer::FrameBuffer;
use crate::session::types::{
    Direction, PlaybackRate, PlaybackStatus, RunToken, SessionInfo, TickOutcome,
};
use crate::sinks::{FrameSink, SinkId, SinkRegistry};
use crate::types::Frame;

/// Cursor state machine over a [`FrameBuffer`]
#[derive(Debug, Default)]
pub struct PlaybackEngine {
    buffer: FrameBuffer,
    /// Index into `buffer`, or `buffer.len()` as the end sentinel
    cursor: usize,
    status: PlaybackStatus,
    rate: PlaybackRate,
    direction: Direction,
    /// Last handed-out run generation
    generation: u64,
    /// Token of the current `Playing` run
    active_run: Option<RunToken>,
    /// Index of the last frame delivered to sinks
    last_emitted: Option<usize>,
    /// Fractional frames owed to the current run
    carry: f64,
    sinks: SinkRegistry,
}

impl PlaybackEngine {
    /// Create an engine with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with an initial rate
    pub fn with_rate(rate: f64) -> Self {
        Self {
            rate: PlaybackRate::new(rate),
            ..Self::default()
        }
    }

    // ── Sinks ──

    /// Register a sink; sinks are called in registration order.
    pub fn register_sink(&mut self, sink: Box<dyn FrameSink>) -> SinkId {
        self.sinks.register(sink)
    }

    pub fn unregister_sink(&mut self, id: SinkId) -> Option<Box<dyn FrameSink>> {
        self.sinks.unregister(id)
    }

    pub fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    // ── Queries ──

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Token of the active run, if playing
    pub fn active_run(&self) -> Option<RunToken> {
        self.active_run
    }

    /// Frame under the cursor (none at the end sentinel)
    pub fn current_frame(&self) -> Option<&Frame> {
        self.buffer.get(self.cursor).ok()
    }

    /// Session time under the cursor
    pub fn current_time(&self) -> Duration {
        match self.current_frame() {
            Some(frame) => frame.timestamp,
            None => self.buffer.duration(),
        }
    }

    /// Playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        let last = self.buffer.len().saturating_sub(1);
        if last == 0 {
            return 0.0;
        }
        (self.cursor.min(last) as f64) / (last as f64)
    }

    // ── Control ──

    /// Replace the buffer. Allowed in any state; ends any run and rewinds.
    pub fn load(&mut self, buffer: FrameBuffer) {
        self.retire_run();
        self.buffer = buffer;
        self.cursor = 0;
        self.last_emitted = None;
        self.carry = 0.0;
        self.status = PlaybackStatus::Stopped;
        tracing::info!("Loaded frame buffer with {} frames", self.buffer.len());
    }

    /// Tell every sink a new session starts
    pub fn begin_session(&mut self, session: &SessionInfo) {
        self.sinks.announce_session(session);
    }

    /// Drop the buffer and return to the initial state
    pub fn reset(&mut self) {
        self.load(FrameBuffer::new());
    }

    /// Start or resume playback.
    ///
    /// Returns the token for the new run, or `None` if already playing.
    pub fn play(&mut self) -> Result<Option<RunToken>> {
        if self.buffer.is_empty() {
            tracing::warn!("Ignoring play: no frames loaded");
            return Err(ReplayError::EmptyBuffer);
        }

        match self.status {
            PlaybackStatus::Playing => Ok(None),
            PlaybackStatus::Stopped | PlaybackStatus::Paused => {
                self.generation += 1;
                let token = RunToken(self.generation);
                self.active_run = Some(token);
                self.carry = 0.0;
                self.status = PlaybackStatus::Playing;
                tracing::info!(
                    "Playback started at frame {} ({:?}, {:.1}x)",
                    self.cursor,
                    self.direction,
                    self.rate.value()
                );
                Ok(Some(token))
            }
        }
    }

    /// Pause playback, keeping the cursor
    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.retire_run();
            self.status = PlaybackStatus::Paused;
            tracing::info!("Playback paused at frame {}", self.cursor);
        }
    }

    /// Stop playback and rewind to the first frame
    pub fn stop(&mut self) {
        self.retire_run();
        self.cursor = 0;
        self.last_emitted = None;
        self.carry = 0.0;
        self.status = PlaybackStatus::Stopped;
    }

    /// Move the cursor to `index` (clamped) and show that frame right away.
    ///
    /// Status is unchanged. Returns the emitted index, if any.
    pub fn seek(&mut self, index: usize) -> Option<usize> {
        self.cursor = index.min(self.buffer.len());
        if self.cursor < self.buffer.len() {
            self.emit_cursor();
            Some(self.cursor)
        } else {
            None
        }
    }

    /// Seek to the frame at or before a session time
    pub fn seek_time(&mut self, time: Duration) -> Option<usize> {
        let index = self.buffer.find_frame_at(time)?;
        self.seek(index)
    }

    /// Nudge the cursor by `frames` (negative moves back), clamped to the
    /// buffer. Independent of direction and status; does not emit.
    pub fn step(&mut self, frames: isize) {
        let len = self.buffer.len() as isize;
        let target = (self.cursor as isize).saturating_add(frames);
        self.cursor = target.clamp(0, len) as usize;
    }

    /// Change speed; takes effect on the next tick
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = PlaybackRate::new(rate);
    }

    /// Change direction; takes effect on the next tick
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Advance one base tick of the run identified by `token`.
    pub fn tick(&mut self, token: RunToken) -> TickOutcome {
        if self.active_run != Some(token) || !self.status.is_playing() {
            return TickOutcome::Stale;
        }

        let len = self.buffer.len();
        if len == 0 {
            self.finish();
            return TickOutcome::Finished;
        }
        let last = len - 1;

        if self.cursor > last {
            // Sitting on the end sentinel
            match self.direction {
                Direction::Forward => {
                    self.finish();
                    return TickOutcome::Finished;
                }
                Direction::Backward => {
                    self.cursor = last;
                    self.emit_cursor();
                    return TickOutcome::Emitted(self.cursor);
                }
            }
        }

        // Frame under the cursor not shown yet (fresh load, stop, step)
        if self.last_emitted != Some(self.cursor) {
            self.emit_cursor();
            return TickOutcome::Emitted(self.cursor);
        }

        let at_end = match self.direction {
            Direction::Forward => self.cursor >= last,
            Direction::Backward => self.cursor == 0,
        };
        if at_end {
            self.finish();
            return TickOutcome::Finished;
        }

        let frames = self.rate.frames_this_tick(&mut self.carry);
        if frames == 0 {
            return TickOutcome::Held;
        }

        let target = match self.direction {
            Direction::Forward => self.cursor.saturating_add(frames).min(last),
            Direction::Backward => self.cursor.saturating_sub(frames),
        };
        while self.cursor != target {
            match self.direction {
                Direction::Forward => self.cursor += 1,
                Direction::Backward => self.cursor -= 1,
            }
            self.emit_cursor();
        }

        tracing::trace!("Tick emitted up to frame {}", self.cursor);
        TickOutcome::Emitted(self.cursor)
    }

    fn emit_cursor(&mut self) {
        if let Ok(frame) = self.buffer.get(self.cursor) {
            self.sinks.emit(frame);
            self.last_emitted = Some(self.cursor);
        }
    }

    fn finish(&mut self) {
        self.retire_run();
        self.status = PlaybackStatus::Stopped;
        tracing::info!("Replay reached the end at frame {}", self.cursor);
    }

    fn retire_run(&mut self) {
        self.active_run = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use std::sync::{Arc, Mutex};

    struct IndexLog(Arc<Mutex<Vec<usize>>>);

    impl FrameSink for IndexLog {
        fn name(&self) -> &str {
            "index-log"
        }

        fn on_frame(&mut self, frame: &Frame) -> std::result::Result<(), SinkError> {
            self.0.lock().unwrap().push(frame.index);
            Ok(())
        }
    }

    fn buffer(n: usize) -> FrameBuffer {
        let frames = (0..n)
            .map(|i| Frame::new(i, Duration::from_millis(i as u64 * 40)))
            .collect();
        FrameBuffer::from_frames(frames).unwrap()
    }

    fn engine_with_log(n: usize) -> (PlaybackEngine, Arc<Mutex<Vec<usize>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = PlaybackEngine::new();
        engine.register_sink(Box::new(IndexLog(log.clone())));
        engine.load(buffer(n));
        (engine, log)
    }

    #[test]
    fn test_engine_lifecycle() {
        let (mut engine, _) = engine_with_log(10);
        assert_eq!(engine.status(), PlaybackStatus::Stopped);

        assert!(engine.play().unwrap().is_some());
        assert_eq!(engine.status(), PlaybackStatus::Playing);
        assert!(engine.active_run().is_some());

        engine.pause();
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert!(engine.active_run().is_none());

        engine.stop();
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert_eq!(engine.cursor(), 0);

        engine.reset();
        assert!(engine.is_empty());
    }

    #[test]
    fn test_three_frame_scenario() {
        let (mut engine, log) = engine_with_log(3);
        let token = engine.play().unwrap().unwrap();

        assert_eq!(engine.tick(token), TickOutcome::Emitted(0));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(1));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(2));
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);

        assert_eq!(engine.tick(token), TickOutcome::Finished);
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert_eq!(engine.tick(token), TickOutcome::Stale);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_play_on_empty_buffer() {
        let mut engine = PlaybackEngine::new();
        assert!(matches!(engine.play(), Err(ReplayError::EmptyBuffer)));
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_double_play_is_idempotent() {
        let (mut engine, _) = engine_with_log(5);
        let first = engine.play().unwrap();
        assert!(first.is_some());
        assert_eq!(engine.play().unwrap(), None);
        assert_eq!(engine.active_run(), first);
    }

    #[test]
    fn test_pause_retires_token() {
        let (mut engine, log) = engine_with_log(5);
        let token = engine.play().unwrap().unwrap();
        engine.tick(token);
        engine.pause();
        assert_eq!(engine.tick(token), TickOutcome::Stale);

        let resumed = engine.play().unwrap().unwrap();
        assert_ne!(resumed, token);
        // Resuming continues after the frame already shown
        assert_eq!(engine.tick(resumed), TickOutcome::Emitted(1));
        assert_eq!(*log.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_load_while_playing_cancels_run() {
        let (mut engine, log) = engine_with_log(5);
        let token = engine.play().unwrap().unwrap();
        engine.tick(token);
        engine.tick(token);

        engine.load(buffer(8));
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.tick(token), TickOutcome::Stale);
        assert_eq!(*log.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_seek_emits_and_clamps() {
        let (mut engine, log) = engine_with_log(5);
        assert_eq!(engine.seek(3), Some(3));
        assert_eq!(engine.seek(3), Some(3));
        assert_eq!(engine.status(), PlaybackStatus::Stopped);

        assert_eq!(engine.seek(99), None);
        assert_eq!(engine.cursor(), 5);
        assert_eq!(*log.lock().unwrap(), vec![3, 3]);
    }

    #[test]
    fn test_seek_while_paused_then_resume() {
        let (mut engine, log) = engine_with_log(10);
        let token = engine.play().unwrap().unwrap();
        engine.tick(token);
        engine.pause();
        engine.seek(6);

        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Emitted(7));
        assert_eq!(*log.lock().unwrap(), vec![0, 6, 7]);
    }

    #[test]
    fn test_seek_time() {
        let (mut engine, _) = engine_with_log(10);
        assert_eq!(engine.seek_time(Duration::from_millis(130)), Some(3));
        assert_eq!(engine.current_time(), Duration::from_millis(120));
    }

    #[test]
    fn test_step_clamps() {
        let (mut engine, log) = engine_with_log(5);
        engine.step(3);
        assert_eq!(engine.cursor(), 3);
        engine.step(-10);
        assert_eq!(engine.cursor(), 0);
        engine.step(50);
        assert_eq!(engine.cursor(), 5);
        engine.step(isize::MAX);
        assert_eq!(engine.cursor(), 5);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_step_then_play_shows_new_cursor_first() {
        let (mut engine, log) = engine_with_log(10);
        engine.step(4);
        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Emitted(4));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(5));
        assert_eq!(*log.lock().unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_rate_changes_pacing_on_next_tick() {
        let (mut engine, log) = engine_with_log(20);
        let token = engine.play().unwrap().unwrap();
        engine.tick(token);
        engine.tick(token);
        engine.set_rate(4.0);
        assert_eq!(engine.tick(token), TickOutcome::Emitted(5));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(9));
        assert_eq!(*log.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_high_rate_visits_every_frame() {
        let (mut engine, log) = engine_with_log(10);
        engine.set_rate(8.0);
        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Emitted(0));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(8));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(9));
        assert_eq!(engine.tick(token), TickOutcome::Finished);
        assert_eq!(*log.lock().unwrap(), (0..10).collect::<Vec<_>>());
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_half_rate_holds_each_frame_for_two_ticks() {
        let (mut engine, log) = engine_with_log(3);
        engine.set_rate(0.5);
        let token = engine.play().unwrap().unwrap();
        let outcomes: Vec<_> = (0..6).map(|_| engine.tick(token)).collect();
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Emitted(0),
                TickOutcome::Held,
                TickOutcome::Emitted(1),
                TickOutcome::Held,
                TickOutcome::Emitted(2),
                TickOutcome::Finished,
            ]
        );
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_held_tick_after_pause_is_stale() {
        let (mut engine, _) = engine_with_log(5);
        engine.set_rate(0.5);
        let token = engine.play().unwrap().unwrap();
        engine.tick(token);
        assert_eq!(engine.tick(token), TickOutcome::Held);
        engine.pause();
        assert_eq!(engine.tick(token), TickOutcome::Stale);
    }

    #[test]
    fn test_backward_playback() {
        let (mut engine, log) = engine_with_log(5);
        engine.seek(2);
        engine.set_direction(Direction::Backward);
        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Emitted(1));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(0));
        assert_eq!(engine.tick(token), TickOutcome::Finished);
        assert_eq!(*log.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_backward_from_end_sentinel() {
        let (mut engine, log) = engine_with_log(4);
        engine.step(10);
        engine.set_direction(Direction::Backward);
        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Emitted(3));
        assert_eq!(engine.tick(token), TickOutcome::Emitted(2));
        assert_eq!(*log.lock().unwrap(), vec![3, 2]);
    }

    #[test]
    fn test_forward_from_end_sentinel_finishes() {
        let (mut engine, log) = engine_with_log(4);
        engine.seek(4);
        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Finished);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_replay_after_finish_requires_rewind() {
        let (mut engine, log) = engine_with_log(2);
        let token = engine.play().unwrap().unwrap();
        while engine.tick(token).keeps_running() {}

        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Finished);

        engine.stop();
        let token = engine.play().unwrap().unwrap();
        assert_eq!(engine.tick(token), TickOutcome::Emitted(0));
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 0]);
    }

    #[test]
    fn test_progress() {
        let (mut engine, _) = engine_with_log(5);
        assert_eq!(engine.progress(), 0.0);
        engine.seek(2);
        assert_eq!(engine.progress(), 0.5);
        engine.seek(4);
        assert_eq!(engine.progress(), 1.0);
    }
}
