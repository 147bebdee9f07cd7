//! Property-based tests for cursor movement and emission order

mod common;

use common::builders::BufferBuilder;
use common::mock_helpers::CollectingSink;
use proptest::prelude::*;
use race_replay::session::types::{Direction, PlaybackRate};
use race_replay::PlaybackEngine;

fn engine_with(frames: usize) -> (PlaybackEngine, CollectingSink) {
    let sink = CollectingSink::new();
    let mut engine = PlaybackEngine::new();
    engine.register_sink(sink.boxed());
    engine.load(BufferBuilder::new(frames).build());
    (engine, sink)
}

fn run_to_end(engine: &mut PlaybackEngine) {
    let token = engine.play().unwrap().unwrap();
    while engine.tick(token).keeps_running() {}
}

proptest! {
    #[test]
    fn step_stays_in_bounds(len in 1usize..200, steps in prop::collection::vec(-300isize..300, 1..20)) {
        let (mut engine, sink) = engine_with(len);
        for step in steps {
            engine.step(step);
            prop_assert!(engine.cursor() <= len);
        }
        prop_assert!(sink.frames().is_empty());
    }

    #[test]
    fn step_round_trips_inside_buffer(len in 1usize..200, start in 0usize..200, delta in -200isize..200) {
        let start = start % len;
        let target = start as isize + delta;
        prop_assume!(target >= 0 && target <= len as isize);

        let (mut engine, _sink) = engine_with(len);
        engine.seek(start);
        engine.step(delta);
        engine.step(-delta);
        prop_assert_eq!(engine.cursor(), start);
    }

    #[test]
    fn forward_run_visits_every_frame_at_any_rate(len in 1usize..300, rate in 0.5f64..=8.0) {
        let (mut engine, sink) = engine_with(len);
        engine.set_rate(rate);
        run_to_end(&mut engine);

        prop_assert_eq!(sink.frames(), (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn backward_run_visits_every_frame_in_reverse(len in 1usize..300, rate in 0.5f64..=8.0) {
        let (mut engine, sink) = engine_with(len);
        engine.seek(len - 1);
        engine.set_direction(Direction::Backward);
        engine.set_rate(rate);
        run_to_end(&mut engine);

        prop_assert_eq!(sink.frames(), (0..len).rev().collect::<Vec<_>>());
    }

    #[test]
    fn rate_is_always_clamped(rate in proptest::num::f64::ANY) {
        let value = PlaybackRate::new(rate).value();
        prop_assert!(value.is_finite());
        prop_assert!((0.5..=8.0).contains(&value));
        let mut carry = 0.0;
        let moved: usize = (0..4).map(|_| PlaybackRate::new(rate).frames_this_tick(&mut carry)).sum();
        prop_assert!(moved >= 2);
        prop_assert!((0.0..1.0).contains(&carry));
    }
}
