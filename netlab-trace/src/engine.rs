//! Stepwise trace engine.
//!
//! Every experiment is a [`Simulation`]: an immutable state value plus a
//! transition that produces the next state and the log lines describing the
//! event.  A [`TraceSession`] owns one running simulation and accumulates
//! its log.
//!
//! # Session lifecycle
//!
//! ```text
//!  config ──initialize──▶ initial ──advance──▶ ... ──advance──▶ terminal
//!                            ▲                                     │
//!                            └──────────────── reset ──────────────┘
//! ```
//!
//! - `advance` applies exactly one logical event.
//! - Once terminal, `advance` is a no-op until `reset`.
//! - The engine has no notion of time; hosts drive it manually or through
//!   [`crate::scheduler::Autoplay`].

use serde::Serialize;
use thiserror::Error;

use crate::random::RandomSource;

/// One human-readable trace line.
pub type LogEntry = String;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Configuration rejected before a session is created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window size must be at least 1 (got {0})")]
    WindowSize(usize),
    #[error("frame count must be at least 1 (got {0})")]
    FrameCount(usize),
    #[error("{name} must lie within [0, 1] (got {value})")]
    Probability { name: &'static str, value: f64 },
    #[error("ACK timeout must be at least one tick")]
    AckTimeout,
    #[error("input string is empty")]
    EmptyInput,
    #[error("graph has no nodes")]
    EmptyGraph,
    #[error("node `{0}` is declared twice")]
    DuplicateNode(String),
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("unknown automaton state `{0}`")]
    UnknownState(String),
    #[error("transition symbol `{0}` must be a single character")]
    Symbol(String),
}

/// Validate a probability knob.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Probability { name, value })
    }
}

// ---------------------------------------------------------------------------
// StepResult / Simulation
// ---------------------------------------------------------------------------

/// Outcome of one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<S> {
    pub next_state: S,
    pub emitted: Vec<LogEntry>,
    pub terminal: bool,
}

impl<S> StepResult<S> {
    /// Re-wrap the state, keeping the log and terminal flag.
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> StepResult<T> {
        StepResult {
            next_state: f(self.next_state),
            emitted: self.emitted,
            terminal: self.terminal,
        }
    }
}

impl<S: Simulation> StepResult<S> {
    /// Build a result whose terminal flag is read from `next_state`.
    pub fn from_state(next_state: S, emitted: Vec<LogEntry>) -> Self {
        let terminal = next_state.is_terminal();
        Self {
            next_state,
            emitted,
            terminal,
        }
    }
}

/// Capability shared by every experiment.
pub trait Simulation: Clone + Sized {
    type Config;

    /// Build the starting state.  Pure; validates logical ranges only.
    fn initialize(config: &Self::Config) -> Result<Self, ConfigError>;

    /// Apply one event to a non-terminal state.
    ///
    /// Implementations may only consume randomness through `rng`.
    fn transition(&self, rng: &mut dyn RandomSource) -> StepResult<Self>;

    /// `true` once no further events are defined.
    fn is_terminal(&self) -> bool;

    /// One-line summary for status bars and debug logs.
    fn describe(&self) -> String;

    /// Apply one event; a terminal state is returned unchanged with no log.
    fn step(&self, rng: &mut dyn RandomSource) -> StepResult<Self> {
        if self.is_terminal() {
            return StepResult {
                next_state: self.clone(),
                emitted: Vec::new(),
                terminal: true,
            };
        }
        self.transition(rng)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable copy of a session handed to rendering surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<S> {
    pub state: S,
    pub log: Vec<LogEntry>,
    pub terminal: bool,
    pub running: bool,
    pub steps: u64,
}

// ---------------------------------------------------------------------------
// TraceSession
// ---------------------------------------------------------------------------

/// One running instance of a simulation together with its trace.
pub struct TraceSession<S: Simulation> {
    initial: S,
    state: S,
    log: Vec<LogEntry>,
    terminal: bool,
    running: bool,
    /// Bumped whenever autoplay starts or stops; a ticker only steps while
    /// its own run is current.
    run: u64,
    steps: u64,
    rng: Box<dyn RandomSource>,
}

impl<S: Simulation> TraceSession<S> {
    /// Validate `config` and create a session at the initial state.
    ///
    /// Invalid configuration is refused and no session exists afterwards.
    pub fn start(config: &S::Config, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        let initial = S::initialize(config)?;
        Ok(Self::from_state(initial, rng))
    }

    /// Create a session from an already-built initial state.
    pub fn from_state(initial: S, rng: Box<dyn RandomSource>) -> Self {
        let terminal = initial.is_terminal();
        Self {
            state: initial.clone(),
            initial,
            log: Vec::new(),
            terminal,
            running: false,
            run: 0,
            steps: 0,
            rng,
        }
    }

    /// Apply one event and return the lines it appended.
    pub fn advance(&mut self) -> &[LogEntry] {
        let before = self.log.len();
        if self.terminal {
            return &self.log[before..];
        }

        let result = self.state.step(self.rng.as_mut());
        self.state = result.next_state;
        self.log.extend(result.emitted);
        self.terminal = result.terminal;
        self.steps += 1;
        if self.terminal {
            self.running = false;
        }

        log::debug!(
            "[engine] step {} → {}{}",
            self.steps,
            self.state.describe(),
            if self.terminal { " (terminal)" } else { "" }
        );
        &self.log[before..]
    }

    /// Advance until terminal or until `max_steps` events were applied.
    ///
    /// Returns the number of events applied.  The bound protects hosts from
    /// configurations that never terminate (e.g. every ACK lost).
    pub fn run_to_end(&mut self, max_steps: usize) -> usize {
        let mut applied = 0;
        while !self.terminal && applied < max_steps {
            self.advance();
            applied += 1;
        }
        applied
    }

    /// Discard all progress and return to the initial state.
    ///
    /// The random source is kept; use [`set_random_source`] to replay a
    /// seed from the start.
    ///
    /// [`set_random_source`]: Self::set_random_source
    pub fn reset(&mut self) {
        self.state = self.initial.clone();
        self.log.clear();
        self.terminal = self.initial.is_terminal();
        self.end_run();
        self.steps = 0;
        log::debug!("[engine] reset → {}", self.state.describe());
    }

    pub fn set_random_source(&mut self, rng: Box<dyn RandomSource>) {
        self.rng = rng;
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable access for live tuning knobs (e.g. loss probabilities).
    ///
    /// Callers must not move a state into or out of terminal; the session's
    /// terminal flag is only refreshed by `advance` and `reset`.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Whether autoplay is currently driving this session.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mark a new autoplay run as driving the session and return its id.
    /// Any older run stops being current.
    pub(crate) fn begin_run(&mut self) -> u64 {
        self.run += 1;
        self.running = !self.terminal;
        self.run
    }

    /// Clear `running`; no earlier run id stays current.
    pub(crate) fn end_run(&mut self) {
        self.run += 1;
        self.running = false;
    }

    /// Whether the ticker holding `run` may still step.
    pub(crate) fn is_current_run(&self, run: u64) -> bool {
        self.running && !self.terminal && self.run == run
    }

    /// Number of events applied since start or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        Snapshot {
            state: self.state.clone(),
            log: self.log.clone(),
            terminal: self.terminal,
            running: self.running,
            steps: self.steps,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
