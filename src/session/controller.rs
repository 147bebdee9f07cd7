//! Timer-driven playback - the control surface used by a UI.
//!
//! [`PlaybackController`] owns the engine behind a single mutex and at most
//! one [`Ticker`]. The ticker is a background thread that wakes every base
//! period and calls [`PlaybackEngine::tick`] with its run token.
//!
//! Cancellation happens in two steps. `pause`, `stop` and `load` first change
//! the engine state under the lock, which retires the run token; a tick that
//! already fired and is waiting for the lock then sees a stale token and
//! emits nothing. Only afterwards is the old ticker thread told to exit and
//! joined.
//!
//! Sinks run on the ticker thread while the engine lock is held, so a sink
//! must never call back into the controller.

use crossbeam_channel::{bounded, select, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::Result;
use crate::session::buffer::FrameBuffer;
use crate::session::engine::PlaybackEngine;
use crate::session::loader::LoadedSession;
use crate::session::types::{Direction, PlaybackStatus, RunToken, TickOutcome};
use crate::sinks::{FrameSink, SinkId};

/// Default wall-clock period between ticks (25 frames per second)
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(40);

/// Lock the engine, recovering from a poisoned mutex. Sink panics are caught
/// inside the engine, so poisoning only follows a bug in the engine itself.
fn lock_engine(engine: &Mutex<PlaybackEngine>) -> MutexGuard<'_, PlaybackEngine> {
    engine.lock().unwrap_or_else(|poisoned| {
        tracing::error!("Playback engine mutex was poisoned; continuing");
        poisoned.into_inner()
    })
}

/// Recurring scheduling handle for one run
pub struct Ticker {
    token: RunToken,
    cancel_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn the ticker thread for `token`
    pub fn spawn(
        engine: Arc<Mutex<PlaybackEngine>>,
        token: RunToken,
        period: Duration,
    ) -> Result<Self> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        let handle = std::thread::Builder::new()
            .name(format!("replay-ticker-{}", token.generation()))
            .spawn(move || {
                let ticks = crossbeam_channel::tick(period);
                tracing::debug!("Ticker {} started ({:?})", token.generation(), period);

                loop {
                    select! {
                        recv(cancel_rx) -> _ => break,
                        recv(ticks) -> _ => {
                            let outcome = lock_engine(&engine).tick(token);
                            if !outcome.keeps_running() {
                                if outcome == TickOutcome::Finished {
                                    tracing::info!("Run {} finished", token.generation());
                                }
                                break;
                            }
                        }
                    }
                }

                tracing::debug!("Ticker {} exiting", token.generation());
            })?;

        Ok(Self {
            token,
            cancel_tx,
            handle: Some(handle),
        })
    }

    pub fn token(&self) -> RunToken {
        self.token
    }

    /// Whether the thread is still running
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it to exit
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // The thread may have exited on its own already
        let _ = self.cancel_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Ticker {} panicked", self.token.generation());
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Point-in-time copy of the playback state, for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub cursor: usize,
    pub len: usize,
    pub rate: f64,
    pub direction: Direction,
    pub current_time: Duration,
    pub duration: Duration,
}

/// Owns the engine and its single scheduling handle
pub struct PlaybackController {
    engine: Arc<Mutex<PlaybackEngine>>,
    ticker: Option<Ticker>,
    tick_period: Duration,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlaybackEngine::new(), DEFAULT_TICK_PERIOD)
    }
}

impl PlaybackController {
    pub fn new(engine: PlaybackEngine, tick_period: Duration) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: None,
            tick_period,
        }
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Run a closure against the locked engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut PlaybackEngine) -> R) -> R {
        f(&mut lock_engine(&self.engine))
    }

    pub fn register_sink(&self, sink: Box<dyn FrameSink>) -> SinkId {
        self.with_engine(|e| e.register_sink(sink))
    }

    pub fn unregister_sink(&self, id: SinkId) -> Option<Box<dyn FrameSink>> {
        self.with_engine(|e| e.unregister_sink(id))
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.with_engine(|e| PlaybackSnapshot {
            status: e.status(),
            cursor: e.cursor(),
            len: e.len(),
            rate: e.rate().value(),
            direction: e.direction(),
            current_time: e.current_time(),
            duration: e.buffer().duration(),
        })
    }

    pub fn status(&self) -> PlaybackStatus {
        self.with_engine(|e| e.status())
    }

    /// Whether a ticker thread is currently running
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| t.is_active())
    }

    /// Replace the buffer, stopping any run
    pub fn load(&mut self, buffer: FrameBuffer) {
        self.with_engine(|e| e.load(buffer));
        self.cancel_ticker();
    }

    /// Load a validated session and announce it to every sink
    pub fn load_session(&mut self, session: &LoadedSession) {
        self.with_engine(|e| {
            e.load(session.buffer.clone());
            e.begin_session(&session.info);
        });
        self.cancel_ticker();
    }

    /// Start or resume playback. Idempotent while playing.
    pub fn play(&mut self) -> Result<()> {
        let token = self.with_engine(|e| e.play())?;
        if let Some(token) = token {
            self.cancel_ticker();
            match Ticker::spawn(self.engine.clone(), token, self.tick_period) {
                Ok(ticker) => self.ticker = Some(ticker),
                Err(err) => {
                    // Keep "playing implies a ticker" true
                    self.with_engine(|e| e.pause());
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.with_engine(|e| e.pause());
        self.cancel_ticker();
    }

    pub fn stop(&mut self) {
        self.with_engine(|e| e.stop());
        self.cancel_ticker();
    }

    /// Toggle between playing and paused
    pub fn toggle(&mut self) -> Result<()> {
        if self.status().is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    pub fn seek(&self, index: usize) -> Option<usize> {
        self.with_engine(|e| e.seek(index))
    }

    pub fn seek_time(&self, time: Duration) -> Option<usize> {
        self.with_engine(|e| e.seek_time(time))
    }

    /// Nudge the cursor and show the resulting frame
    pub fn step(&self, frames: isize) -> Option<usize> {
        self.with_engine(|e| {
            e.step(frames);
            let cursor = e.cursor();
            e.seek(cursor)
        })
    }

    pub fn set_rate(&self, rate: f64) {
        self.with_engine(|e| e.set_rate(rate));
    }

    pub fn set_direction(&self, direction: Direction) {
        self.with_engine(|e| e.set_direction(direction));
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.with_engine(|e| e.pause());
        self.cancel_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::types::Frame;
    use crossbeam_channel::{unbounded, Receiver};

    struct ChannelLog(Sender<usize>);

    impl FrameSink for ChannelLog {
        fn name(&self) -> &str {
            "channel-log"
        }

        fn on_frame(&mut self, frame: &Frame) -> std::result::Result<(), SinkError> {
            let _ = self.0.send(frame.index);
            Ok(())
        }
    }

    fn controller(n: usize) -> (PlaybackController, Receiver<usize>) {
        let (tx, rx) = unbounded();
        let mut controller = PlaybackController::new(PlaybackEngine::new(), Duration::from_millis(2));
        controller.register_sink(Box::new(ChannelLog(tx)));
        let frames = (0..n)
            .map(|i| Frame::new(i, Duration::from_millis(i as u64 * 40)))
            .collect();
        controller.load(FrameBuffer::from_frames(frames).unwrap());
        (controller, rx)
    }

    fn wait_for_stop(controller: &PlaybackController) {
        for _ in 0..500 {
            if controller.status() == PlaybackStatus::Stopped {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("playback did not stop");
    }

    #[test]
    fn test_ticker_plays_to_end() {
        let (mut controller, rx) = controller(3);
        controller.play().unwrap();
        wait_for_stop(&controller);

        let seen: Vec<usize> = rx.try_iter().collect();
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(controller.snapshot().cursor, 2);
    }

    #[test]
    fn test_pause_stops_emission() {
        let (mut controller, rx) = controller(10_000);
        controller.play().unwrap();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        controller.pause();
        assert!(!controller.is_ticking());

        let _ = rx.try_iter().count();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.try_iter().count(), 0);
        assert_eq!(controller.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_load_while_playing_resets() {
        let (mut controller, rx) = controller(10_000);
        controller.play().unwrap();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();

        let frames = (0..4)
            .map(|i| Frame::new(i, Duration::from_millis(i as u64 * 40)))
            .collect();
        controller.load(FrameBuffer::from_frames(frames).unwrap());
        let _ = rx.try_iter().count();

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.try_iter().count(), 0);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Stopped);
        assert_eq!(snapshot.cursor, 0);
        assert_eq!(snapshot.len, 4);
    }

    #[test]
    fn test_play_on_empty_reports_error() {
        let mut controller = PlaybackController::default();
        assert!(controller.play().is_err());
        assert!(!controller.is_ticking());
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_step_emits_new_position() {
        let (controller, rx) = controller(10);
        assert_eq!(controller.step(3), Some(3));
        assert_eq!(controller.step(-1), Some(2));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![3, 2]);
    }
}
