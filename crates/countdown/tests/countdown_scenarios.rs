//! Countdown behaviour on virtual time
//!
//! Drives the engine and node through whole runs on a `ManualClock`,
//! one virtual second per tick.

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempo_clock::{Clock, ManualClock};
use tempo_core::CountdownConfig;
use tempo_countdown::{CountdownEngine, CountdownEvent, CountdownListener, SignalOutcome};

use CountdownEvent::{Cancel, Complete, Tick};

const SECOND: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Recorder(Mutex<Vec<CountdownEvent>>);

impl CountdownListener for Recorder {
    fn notify(&self, event: CountdownEvent) {
        self.0.lock().push(event);
    }
}

impl Recorder {
    fn events(&self) -> Vec<CountdownEvent> {
        self.0.lock().clone()
    }

    fn ticks(&self) -> Vec<i64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Tick(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    fn completions(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Complete(_)))
            .count()
    }

    fn cancels(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, Cancel)).count()
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    recorder: Arc<Recorder>,
    engine: CountdownEngine,
}

fn harness(from: i64, restart: bool) -> Harness {
    let _ = env_logger::try_init();

    let clock = ManualClock::new();
    let recorder = Arc::new(Recorder::default());
    let config = CountdownConfig::new(from, restart).expect("valid config");
    let engine = CountdownEngine::new(config, clock.clone(), recorder.clone());

    Harness {
        clock,
        recorder,
        engine,
    }
}

/// Start "3", let it run out: ticks 3, 2, 1 then one completion at 0
#[test]
fn test_full_run_from_three() {
    let h = harness(3, false);

    h.engine.submit(&json!(true));
    h.clock.advance(SECOND * 3);

    assert_eq!(h.recorder.ticks(), vec![3, 2, 1]);
    assert_eq!(h.recorder.completions(), 1);
    assert_eq!(h.recorder.cancels(), 0);
    assert_eq!(h.recorder.events().last(), Some(&Complete(0)));
}

/// A second start one period in changes nothing when restart is off
#[test]
fn test_second_start_is_noop_without_restart() {
    let with_second = harness(3, false);
    let without_second = harness(3, false);

    for h in [&with_second, &without_second] {
        h.engine.submit(&json!(true));
        h.clock.advance(SECOND);
    }
    assert_eq!(
        with_second.engine.submit(&json!(true)),
        SignalOutcome::Ignored
    );
    for h in [&with_second, &without_second] {
        h.clock.advance(SECOND * 10);
    }

    assert_eq!(with_second.recorder.events(), without_second.recorder.events());
    assert_eq!(
        with_second.recorder.events(),
        vec![Tick(3), Tick(2), Tick(1), Complete(0)]
    );
}

#[test]
fn test_tick_sequence_for_many_starts() {
    for n in 1..=25 {
        let h = harness(n, false);

        h.engine.submit(&json!(true));
        h.clock.advance(SECOND * (n as u32 + 5));

        let expected: Vec<i64> = (1..=n).rev().collect();
        assert_eq!(h.recorder.ticks(), expected, "countdown from {}", n);
        assert_eq!(h.recorder.events().last(), Some(&Complete(0)));
        assert_eq!(h.recorder.completions(), 1);
        assert_eq!(h.clock.pending(), 0);
    }
}

#[test]
fn test_cancel_at_any_point_suppresses_completion() {
    for n in 2..=10 {
        for elapsed in 0..(n - 1) {
            let h = harness(n, false);

            h.engine.submit(&json!(true));
            h.clock.advance(SECOND * elapsed as u32);
            assert!(h.engine.ticks_remaining() > 0);
            assert_eq!(h.engine.submit(&json!(false)), SignalOutcome::Cancelled);
            h.clock.advance(SECOND * 100);

            assert_eq!(h.recorder.completions(), 0, "n={} elapsed={}", n, elapsed);
            assert_eq!(h.recorder.cancels(), 1);
            assert_eq!(h.recorder.events().last(), Some(&Cancel));
        }
    }
}

/// Restart at the second tick: 3, 2, then a fresh 3, 2, 1, 0
#[test]
fn test_restart_begins_fresh_sequence() {
    let h = harness(3, true);

    h.engine.submit(&json!(true));
    h.clock.advance(SECOND);
    assert_eq!(h.engine.submit(&json!(true)), SignalOutcome::Restarted);
    h.clock.advance(SECOND * 10);

    let observed: Vec<i64> = h
        .recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Tick(v) | Complete(v) => Some(v),
            Cancel => None,
        })
        .collect();
    assert_eq!(observed, vec![3, 2, 3, 2, 1, 0]);
    assert_eq!(h.recorder.completions(), 1);
    assert_eq!(h.recorder.cancels(), 0);
}

#[test]
fn test_restart_at_every_tick() {
    let n = 6;
    for elapsed in 0..(n - 1) {
        let h = harness(n, true);

        h.engine.submit(&json!(true));
        h.clock.advance(SECOND * elapsed as u32);
        h.engine.submit(&json!(true));
        h.clock.advance(SECOND * 100);

        let mut expected: Vec<i64> = (n - elapsed..=n).rev().collect();
        expected.extend((1..=n).rev());
        assert_eq!(h.recorder.ticks(), expected, "restart after {}s", elapsed);
        assert_eq!(h.recorder.completions(), 1);
    }
}

#[test]
fn test_run_all_terminates_after_completion() {
    let h = harness(4, false);

    h.engine.submit(&json!(true));
    let fired = h.clock.run_all(10).expect("countdown stops its timer");

    assert_eq!(fired, 4);
    assert_eq!(h.clock.now(), SECOND * 4);
    assert_eq!(h.recorder.completions(), 1);
}
