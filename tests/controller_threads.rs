//! Integration tests for the threaded playback controller
//!
//! These validate the ticker lifecycle against real threads:
//! - Playing to the end and stopping on its own
//! - Pause, stop and load cancelling the ticker
//! - Dropping a playing controller

mod common;

use common::builders::BufferBuilder;
use common::mock_helpers::CollectingSink;
use common::{test_tick_period, test_timeout, wait_until};
use race_replay::session::types::{Direction, PlaybackStatus};
use race_replay::{PlaybackController, PlaybackEngine};
use std::thread;
use std::time::Duration;

fn controller_with(frames: usize) -> (PlaybackController, CollectingSink) {
    let sink = CollectingSink::new();
    let mut controller = PlaybackController::new(PlaybackEngine::new(), test_tick_period());
    controller.register_sink(sink.boxed());
    controller.load(BufferBuilder::new(frames).build());
    (controller, sink)
}

#[test]
fn test_plays_to_end_and_stops() {
    let (mut controller, sink) = controller_with(20);
    controller.play().unwrap();

    assert!(wait_until(test_timeout(), || {
        controller.status() == PlaybackStatus::Stopped
    }));
    assert_eq!(sink.frames(), (0..20).collect::<Vec<_>>());
    assert!(wait_until(test_timeout(), || !controller.is_ticking()));
}

#[test]
fn test_pause_stops_emission() {
    let (mut controller, sink) = controller_with(10_000);
    controller.play().unwrap();
    assert!(wait_until(test_timeout(), || sink.frames().len() >= 3));

    controller.pause();
    let emitted = sink.frames().len();
    assert_eq!(controller.status(), PlaybackStatus::Paused);
    assert!(!controller.is_ticking());

    thread::sleep(test_tick_period() * 10);
    assert_eq!(sink.frames().len(), emitted);

    // Resume continues from the cursor
    let cursor = controller.snapshot().cursor;
    controller.play().unwrap();
    assert!(wait_until(test_timeout(), || sink.frames().len() > emitted));
    controller.pause();
    assert_eq!(sink.frames()[emitted], cursor + 1);
}

#[test]
fn test_frames_are_monotonic_across_pause_resume() {
    let (mut controller, sink) = controller_with(10_000);
    for _ in 0..3 {
        controller.play().unwrap();
        thread::sleep(test_tick_period() * 4);
        controller.pause();
    }

    let frames = sink.frames();
    assert!(!frames.is_empty());
    assert!(frames.windows(2).all(|w| w[0] < w[1]), "{:?}", frames);
}

#[test]
fn test_stop_rewinds_and_cancels() {
    let (mut controller, sink) = controller_with(10_000);
    controller.play().unwrap();
    assert!(wait_until(test_timeout(), || !sink.frames().is_empty()));

    controller.stop();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Stopped);
    assert_eq!(snapshot.cursor, 0);
    assert!(!controller.is_ticking());
}

#[test]
fn test_toggle() {
    let (mut controller, _sink) = controller_with(10_000);
    controller.toggle().unwrap();
    assert!(controller.status().is_playing());
    controller.toggle().unwrap();
    assert!(controller.status().is_paused());
}

#[test]
fn test_load_while_playing_cancels_run() {
    let (mut controller, sink) = controller_with(10_000);
    controller.play().unwrap();
    assert!(wait_until(test_timeout(), || !sink.frames().is_empty()));

    controller.load(BufferBuilder::new(5).build());
    sink.clear();
    thread::sleep(test_tick_period() * 10);

    assert!(sink.frames().is_empty());
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Stopped);
    assert_eq!(snapshot.len, 5);
}

#[test]
fn test_step_shows_the_frame() {
    let (controller, sink) = controller_with(10);
    assert_eq!(controller.step(3), Some(3));
    assert_eq!(controller.step(-1), Some(2));
    assert_eq!(sink.frames(), vec![3, 2]);
}

#[test]
fn test_rate_and_direction_apply_to_running_ticker() {
    let (mut controller, sink) = controller_with(10_000);
    controller.seek(5_000);
    controller.set_direction(Direction::Backward);
    controller.set_rate(4.0);
    controller.play().unwrap();
    assert!(wait_until(test_timeout(), || sink.frames().len() >= 4));
    controller.pause();

    let frames = sink.frames();
    assert_eq!(frames[0], 5_000);
    assert!(frames.windows(2).all(|w| w[0] == w[1] + 1), "{:?}", frames);
    assert_eq!(controller.snapshot().rate, 4.0);
}

#[test]
fn test_drop_while_playing_joins_ticker() {
    let (mut controller, sink) = controller_with(10_000);
    controller.play().unwrap();
    assert!(wait_until(test_timeout(), || !sink.frames().is_empty()));

    drop(controller);
    let emitted = sink.frames().len();
    thread::sleep(test_tick_period() * 10);
    assert_eq!(sink.frames().len(), emitted);
}

#[test]
fn test_play_empty_controller_fails() {
    let mut controller = PlaybackController::new(PlaybackEngine::new(), Duration::from_millis(5));
    assert!(controller.play().is_err());
    assert!(!controller.is_ticking());
}
