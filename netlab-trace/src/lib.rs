//! `netlab-trace`: stepwise trace engine for networking and automata labs.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐  snapshots   ┌───────────────┐
//!  │   Autoplay   │─────────────▶│    Surface    │  (CLI, UI, test recorder)
//!  └──────┬───────┘              └───────────────┘
//!         │ advance() on a cadence, or by hand
//!  ┌──────▼───────────────────────────────┐
//!  │            TraceSession              │
//!  │  initial / state / log / terminal    │
//!  └──────┬─────────────────────┬─────────┘
//!         │ step(&state, rng)    │ next_f64()
//!  ┌──────▼───────┐       ┌──────▼───────┐
//!  │  Simulation  │       │ RandomSource │
//!  └──────────────┘       └──────────────┘
//!     SlidingWindow · StopAndWait · DfaTrace
//!     Replay<F>: DijkstraTrace · TopologyTrace · ScenarioTour
//! ```
//!
//! Each module has a single responsibility:
//! - [`engine`]: `Simulation` trait, `TraceSession`, config errors
//! - [`replay`]: engine variant over a precomputed frame list
//! - [`random`]: pluggable uniform random sources
//! - [`state`]: phase and frame-status types
//! - [`sliding_window`]: windowed transmission with per-frame ACK loss
//! - [`stop_and_wait`]: stop-and-wait ARQ with timeout and retransmit
//! - [`dijkstra`]: shortest-path solver and its replay trace
//! - [`dfa`]: table-driven finite automaton trace
//! - [`topology`]: bus/star/ring/mesh construction trace
//! - [`scenario`]: scripted tour of the three ARQ outcomes
//! - [`experiment`]: tagged union over every experiment
//! - [`config`]: TOML lab file
//! - [`scheduler`]: cancellable autoplay task

pub mod config;
pub mod dfa;
pub mod dijkstra;
pub mod engine;
pub mod experiment;
pub mod random;
pub mod replay;
pub mod scenario;
pub mod scheduler;
pub mod sliding_window;
pub mod state;
pub mod stop_and_wait;
pub mod topology;

pub use engine::{ConfigError, LogEntry, Simulation, Snapshot, StepResult, TraceSession};
pub use experiment::{Experiment, ExperimentConfig};
pub use random::{FixedRandom, RandomSource, ScriptedRandom, SeededRandom};
pub use scheduler::{Autoplay, SharedSession, Surface};
