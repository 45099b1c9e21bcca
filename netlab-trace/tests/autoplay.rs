//! Scheduler behaviour under Tokio's paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use netlab_trace::engine::{Snapshot, TraceSession};
use netlab_trace::experiment::{Experiment, ExperimentConfig};
use netlab_trace::random::FixedRandom;
use netlab_trace::scheduler::Autoplay;
use netlab_trace::sliding_window::SlidingWindowConfig;
use netlab_trace::stop_and_wait::StopAndWaitConfig;

const CADENCE: Duration = Duration::from_millis(100);

fn autoplay(config: ExperimentConfig) -> Autoplay<Experiment> {
    let session = TraceSession::start(&config, Box::new(FixedRandom(0.5))).unwrap();
    Autoplay::with_session(session, CADENCE)
}

/// Surface that records the step counter of every redraw.
fn recorder() -> (Arc<Mutex<Vec<u64>>>, impl FnMut(&Snapshot<Experiment>) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |snap: &Snapshot<Experiment>| {
        sink.lock().unwrap().push(snap.steps)
    })
}

fn lossless_window() -> ExperimentConfig {
    ExperimentConfig::SlidingWindow(SlidingWindowConfig {
        window_size: 2,
        total_frames: 4,
        loss_probability: 0.0,
        ..SlidingWindowConfig::default()
    })
}

/// Enough frames that no test here reaches the terminal step.
fn lossless_window_long() -> ExperimentConfig {
    ExperimentConfig::SlidingWindow(SlidingWindowConfig {
        window_size: 4,
        total_frames: 40,
        loss_probability: 0.0,
        ..SlidingWindowConfig::default()
    })
}

#[tokio::test(start_paused = true)]
async fn runs_until_terminal_then_stops() {
    let mut auto = autoplay(ExperimentConfig::ScenarioTour);
    let (seen, surface) = recorder();
    auto.start(surface);
    auto.join().await;

    let snap = auto.snapshot();
    assert!(snap.terminal);
    assert!(!snap.running);
    assert!(!auto.is_pending());
    assert_eq!(
        snap.log.last().map(String::as_str),
        Some("Done: all scenarios completed. Reset to run again.")
    );
    // Eight scripted events plus the closing line, one redraw each.
    assert_eq!(*seen.lock().unwrap(), (1..=9).collect::<Vec<u64>>());
}

#[tokio::test(start_paused = true)]
async fn first_step_waits_one_cadence() {
    let mut auto = autoplay(lossless_window());
    auto.start(|_: &Snapshot<Experiment>| {});

    tokio::time::sleep(CADENCE / 2).await;
    assert_eq!(auto.snapshot().steps, 0);
    tokio::time::sleep(CADENCE).await;
    assert_eq!(auto.snapshot().steps, 1);
    auto.cancel();
}

#[tokio::test(start_paused = true)]
async fn restarting_cancels_the_prior_run() {
    let mut auto = autoplay(lossless_window());
    auto.start(|_: &Snapshot<Experiment>| {});
    auto.start(|_: &Snapshot<Experiment>| {});
    auto.start(|_: &Snapshot<Experiment>| {});

    // A single task steps once per cadence; three would step three times.
    tokio::time::sleep(CADENCE * 3 + CADENCE / 2).await;
    assert_eq!(auto.snapshot().steps, 3);
    auto.cancel();
}

#[tokio::test(start_paused = true)]
async fn cancel_freezes_progress() {
    let mut auto = autoplay(lossless_window());
    auto.start(|_: &Snapshot<Experiment>| {});

    tokio::time::sleep(CADENCE * 2 + CADENCE / 2).await;
    auto.cancel();
    let frozen = auto.snapshot();
    assert_eq!(frozen.steps, 2);
    assert!(!frozen.running);

    tokio::time::sleep(CADENCE * 10).await;
    assert_eq!(auto.snapshot().steps, 2);
    assert!(!auto.is_pending());
}

#[tokio::test(start_paused = true)]
async fn manual_steps_share_the_session() {
    let mut auto = autoplay(lossless_window());
    auto.step_manual();
    auto.step_manual();
    auto.start(|_: &Snapshot<Experiment>| {});

    tokio::time::sleep(CADENCE + CADENCE / 2).await;
    let snap = auto.snapshot();
    assert_eq!(snap.steps, 3);
    assert_eq!(snap.log[..2], ["Sent frame 0", "Sent frame 1"]);
    auto.cancel();
}

#[tokio::test(start_paused = true)]
async fn reset_after_autoplay_restores_initial_state() {
    let config = ExperimentConfig::StopAndWait(StopAndWaitConfig {
        ack_loss_probability: 1.0,
        ..StopAndWaitConfig::default()
    });
    let mut auto = autoplay(config);
    auto.start(|_: &Snapshot<Experiment>| {});
    tokio::time::sleep(CADENCE * 5 + CADENCE / 2).await;
    assert_eq!(auto.snapshot().steps, 5);

    let snap = auto.reset();
    assert_eq!(snap.steps, 0);
    assert!(snap.log.is_empty());
    assert!(!snap.terminal);
    assert!(!auto.is_pending());

    tokio::time::sleep(CADENCE * 3).await;
    assert_eq!(auto.snapshot().steps, 0);
}

#[tokio::test(start_paused = true)]
async fn abandoned_join_does_not_leave_a_second_ticker() {
    let mut auto = autoplay(lossless_window_long());
    auto.start(|_: &Snapshot<Experiment>| {});

    // Give up waiting before the run ends; the run must stay owned.
    let waited = tokio::time::timeout(CADENCE / 2, auto.join()).await;
    assert!(waited.is_err());
    assert!(auto.is_pending());

    auto.cancel();
    assert!(!auto.is_pending());
    auto.start(|_: &Snapshot<Experiment>| {});

    tokio::time::sleep(CADENCE * 4 + CADENCE / 2).await;
    assert_eq!(auto.snapshot().steps, 4);
    auto.cancel();
}

#[tokio::test(start_paused = true)]
async fn restart_after_abandoned_join_steps_once_per_cadence() {
    let mut auto = autoplay(lossless_window_long());
    auto.start(|_: &Snapshot<Experiment>| {});
    let _ = tokio::time::timeout(CADENCE + CADENCE / 2, auto.join()).await;
    assert_eq!(auto.snapshot().steps, 1);

    // No cancel in between: start alone has to retire the first ticker.
    auto.start(|_: &Snapshot<Experiment>| {});
    tokio::time::sleep(CADENCE * 3 + CADENCE / 2).await;
    assert_eq!(auto.snapshot().steps, 4);
    auto.cancel();
}
