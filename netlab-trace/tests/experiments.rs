//! End-to-end traces driven through `TraceSession`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use netlab_trace::dfa::{DfaConfig, DfaTrace, Verdict};
use netlab_trace::dijkstra::{solve, DijkstraConfig, DijkstraTrace, Graph};
use netlab_trace::engine::{Simulation, TraceSession};
use netlab_trace::experiment::{Experiment, ExperimentConfig};
use netlab_trace::random::{FixedRandom, ScriptedRandom, SeededRandom};
use netlab_trace::sliding_window::{SlideRule, SlidingWindow, SlidingWindowConfig};
use netlab_trace::state::{ArqPhase, FrameStatus, WindowPhase};
use netlab_trace::stop_and_wait::{StopAndWait, StopAndWaitConfig};

const MAX_STEPS: usize = 10_000;

// ---------------------------------------------------------------------------
// Sliding window
// ---------------------------------------------------------------------------

#[test]
fn lossless_window_acknowledges_every_frame() {
    let config = SlidingWindowConfig {
        window_size: 4,
        total_frames: 10,
        loss_probability: 0.0,
        slide_rule: SlideRule::HighestAck,
    };
    let mut session =
        TraceSession::<SlidingWindow>::start(&config, Box::new(SeededRandom::new(1))).unwrap();
    session.run_to_end(MAX_STEPS);

    assert!(session.is_terminal());
    let state = session.state();
    assert_eq!(state.phase, WindowPhase::Done);
    assert!(state.frames().iter().all(|s| *s == FrameStatus::Acknowledged));
    let done_lines = session
        .log()
        .iter()
        .filter(|l| l.as_str() == "All frames transmitted successfully.")
        .count();
    assert_eq!(done_lines, 1);
    assert_eq!(
        session.log().last().map(String::as_str),
        Some("All frames transmitted successfully.")
    );
}

#[test]
fn cumulative_rule_eventually_acknowledges_all_frames_under_loss() {
    for seed in 0..20 {
        let config = SlidingWindowConfig {
            window_size: 3,
            total_frames: 12,
            loss_probability: 0.4,
            slide_rule: SlideRule::Cumulative,
        };
        let mut session =
            TraceSession::<SlidingWindow>::start(&config, Box::new(SeededRandom::new(seed)))
                .unwrap();
        session.run_to_end(MAX_STEPS);

        assert!(session.is_terminal(), "seed {seed} did not finish");
        assert_eq!(session.state().acknowledged(), 12, "seed {seed}");
    }
}

#[test]
fn window_rounds_report_lost_acks() {
    let config = SlidingWindowConfig {
        window_size: 2,
        total_frames: 2,
        loss_probability: 0.5,
        slide_rule: SlideRule::Cumulative,
    };
    // First round: frame 0 acked, frame 1 lost; then everything arrives.
    let rng = ScriptedRandom::new(vec![0.9, 0.1], 0.9);
    let mut session = TraceSession::<SlidingWindow>::start(&config, Box::new(rng)).unwrap();
    session.run_to_end(MAX_STEPS);

    let log = session.log();
    assert!(log.contains(&"Acknowledged frames: 0".to_string()));
    assert!(log.contains(&"Timeout / Missing ACK for frames: 1".to_string()));
    assert!(log.contains(&"Window slides to [1, 2)".to_string()));
    assert_eq!(session.state().acknowledged(), 2);
}

// ---------------------------------------------------------------------------
// Stop-and-wait
// ---------------------------------------------------------------------------

#[test]
fn always_lost_ack_retransmits_until_loss_is_lifted() {
    let config = StopAndWaitConfig {
        total_frames: 3,
        ack_loss_probability: 1.0,
        frame_loss_probability: 0.0,
        ack_timeout_ticks: 1,
    };
    let mut session =
        TraceSession::<StopAndWait>::start(&config, Box::new(SeededRandom::new(9))).unwrap();

    session.run_to_end(60);
    assert!(!session.is_terminal());
    let state = session.state();
    assert_eq!((state.frame, state.seq), (0, 0));
    assert!(state.retransmissions >= 10);
    assert!(session
        .log()
        .iter()
        .filter(|l| l.starts_with("Retransmitting"))
        .all(|l| l.starts_with("Retransmitting frame 0 (seq 0)")));

    session.state_mut().set_ack_loss_probability(0.0).unwrap();
    let mut guard = 0;
    while session.state().frame == 0 && guard < 10 {
        session.advance();
        guard += 1;
    }
    let state = session.state();
    assert_eq!(state.frame, 1);
    assert_eq!(state.seq, 1);
    assert_eq!(state.phase, ArqPhase::Ready);
}

#[test]
fn lossless_stop_and_wait_alternates_sequence_numbers() {
    let config = StopAndWaitConfig {
        total_frames: 4,
        ack_loss_probability: 0.0,
        frame_loss_probability: 0.0,
        ack_timeout_ticks: 2,
    };
    let mut session =
        TraceSession::<StopAndWait>::start(&config, Box::new(FixedRandom(0.5))).unwrap();
    session.run_to_end(MAX_STEPS);

    let sends: Vec<&str> = session
        .log()
        .iter()
        .filter(|l| l.starts_with("Sending"))
        .map(String::as_str)
        .collect();
    assert_eq!(
        sends,
        vec![
            "Sending frame 0 (seq 0)",
            "Sending frame 1 (seq 1)",
            "Sending frame 2 (seq 0)",
            "Sending frame 3 (seq 1)",
        ]
    );
    assert_eq!(
        session.log().last().map(String::as_str),
        Some("All 4 frames acknowledged (0 retransmission(s)).")
    );
    assert!(!session.log().iter().any(|l| l.starts_with("Timeout")));
}

// ---------------------------------------------------------------------------
// Dijkstra
// ---------------------------------------------------------------------------

/// Textbook binary-heap Dijkstra, independent of the traced solver.
fn reference_distance(graph: &Graph, source: &str, target: &str) -> Option<u64> {
    let mut adj: HashMap<&str, Vec<(&str, u64)>> = HashMap::new();
    for e in &graph.edges {
        adj.entry(e.from.as_str()).or_default().push((e.to.as_str(), u64::from(e.weight)));
        adj.entry(e.to.as_str()).or_default().push((e.from.as_str(), u64::from(e.weight)));
    }
    let mut dist: HashMap<&str, u64> = HashMap::new();
    let mut heap = BinaryHeap::new();
    dist.insert(source, 0);
    heap.push(Reverse((0u64, source)));
    while let Some(Reverse((d, node))) = heap.pop() {
        if dist.get(node).is_some_and(|&best| d > best) {
            continue;
        }
        for &(next, w) in adj.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            let candidate = d + w;
            if dist.get(next).map_or(true, |&best| candidate < best) {
                dist.insert(next, candidate);
                heap.push(Reverse((candidate, next)));
            }
        }
    }
    dist.get(target).copied()
}

#[test]
fn dijkstra_trace_matches_reference_solver() {
    let config = DijkstraConfig::default();
    let expected = reference_distance(&config.graph, "A", "F");
    assert_eq!(expected, Some(9));

    let mut session =
        TraceSession::<DijkstraTrace>::start(&config, Box::new(FixedRandom(0.0))).unwrap();
    session.run_to_end(MAX_STEPS);

    let outcome = solve(&config).unwrap();
    assert_eq!(outcome.distance, expected);
    assert_eq!(outcome.path, vec!["A", "D", "E", "F"]);
    assert_eq!(
        session.log().last().map(String::as_str),
        Some("Simulation complete. Final path: A → D → E → F, Total Distance: 9")
    );
}

#[test]
fn replayed_steps_equal_the_eager_record() {
    let config = DijkstraConfig::default();
    let outcome = solve(&config).unwrap();
    let mut session =
        TraceSession::<DijkstraTrace>::start(&config, Box::new(FixedRandom(0.0))).unwrap();

    for _ in 0..outcome.steps.len() {
        session.advance();
    }
    assert_eq!(session.state().replayed(), outcome.steps.as_slice());
    assert!(!session.is_terminal());
    session.advance();
    assert!(session.is_terminal());
    assert_eq!(session.log().len(), outcome.steps.len() + 1);
}

#[test]
fn every_target_matches_reference_distance() {
    let graph = Graph::example();
    for target in &graph.nodes {
        let config = DijkstraConfig {
            graph: graph.clone(),
            source: "A".into(),
            target: target.clone(),
        };
        assert_eq!(
            solve(&config).unwrap().distance,
            reference_distance(&graph, "A", target),
            "target {target}"
        );
    }
}

// ---------------------------------------------------------------------------
// DFA
// ---------------------------------------------------------------------------

fn run_dfa(input: &str) -> TraceSession<DfaTrace> {
    let mut session =
        TraceSession::<DfaTrace>::start(&DfaConfig::example(input), Box::new(FixedRandom(0.0)))
            .unwrap();
    session.run_to_end(MAX_STEPS);
    session
}

#[test]
fn dfa_verdicts() {
    let ab = run_dfa("AB");
    assert_eq!(ab.state().verdict(), Some(Verdict::Accepted));

    let a = run_dfa("A");
    assert_eq!(a.state().verdict(), Some(Verdict::Rejected));
    assert_eq!(a.state().current, "S1");

    let ba = run_dfa("BA");
    assert_eq!(ba.state().verdict(), Some(Verdict::Rejected));
    assert_eq!(ba.state().current, "Dead");
}

// ---------------------------------------------------------------------------
// Session properties
// ---------------------------------------------------------------------------

#[test]
fn reset_with_same_seed_reproduces_the_log() {
    let config = ExperimentConfig::SlidingWindow(SlidingWindowConfig {
        loss_probability: 0.3,
        ..SlidingWindowConfig::default()
    });
    let mut session =
        TraceSession::<Experiment>::start(&config, Box::new(SeededRandom::new(42))).unwrap();
    session.run_to_end(MAX_STEPS);
    let first = session.log().to_vec();

    session.reset();
    session.set_random_source(Box::new(SeededRandom::new(42)));
    session.run_to_end(MAX_STEPS);
    assert_eq!(session.log(), first.as_slice());
}

#[test]
fn forced_loss_is_reproducible_under_any_source() {
    let config = StopAndWaitConfig {
        ack_loss_probability: 1.0,
        ..StopAndWaitConfig::default()
    };
    let mut session =
        TraceSession::<StopAndWait>::start(&config, Box::new(SeededRandom::new(1))).unwrap();
    session.run_to_end(40);
    let first = session.log().to_vec();

    session.reset();
    session.set_random_source(Box::new(SeededRandom::new(2)));
    session.run_to_end(40);
    assert_eq!(session.log(), first.as_slice());
}

#[test]
fn initialize_without_steps_is_the_initial_state() {
    let config = SlidingWindowConfig::default();
    let expected = SlidingWindow::initialize(&config).unwrap();
    let session =
        TraceSession::<SlidingWindow>::start(&config, Box::new(FixedRandom(0.0))).unwrap();

    assert_eq!(session.state(), &expected);
    assert!(session.log().is_empty());
    assert_eq!(session.steps(), 0);
    assert!(!session.is_terminal());
    assert_eq!(expected.phase, WindowPhase::Idle);
}

#[test]
fn terminal_session_ignores_further_steps() {
    let mut session = run_dfa("AB");
    let len = session.log().len();
    let steps = session.steps();
    assert!(session.advance().is_empty());
    assert_eq!(session.log().len(), len);
    assert_eq!(session.steps(), steps);
}
