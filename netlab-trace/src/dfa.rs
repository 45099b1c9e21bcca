//! Deterministic finite automaton trace.
//!
//! [`DfaTrace`] consumes one input symbol per step, looking up
//! `(state, symbol)` in a [`TransitionTable`].  A missing entry sends the
//! machine to the configured dead state, which must be declared in the
//! table like the start state.  The step that consumes the last
//! symbol also evaluates the caller's [`Acceptance`] predicate.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::engine::{ConfigError, LogEntry, Simulation, StepResult};
use crate::random::RandomSource;

/// Decides acceptance from the final state and the full (normalized) input.
pub type Acceptance = Arc<dyn Fn(&str, &[char]) -> bool + Send + Sync>;

/// Accept iff the machine stops in one of `states` and, when given, the
/// last symbol is `last_symbol`.
pub fn accept_when(states: Vec<String>, last_symbol: Option<char>) -> Acceptance {
    Arc::new(move |state: &str, input: &[char]| {
        states.iter().any(|s| s == state)
            && last_symbol.map_or(true, |c| input.last() == Some(&c))
    })
}

// ---------------------------------------------------------------------------
// TransitionTable
// ---------------------------------------------------------------------------

/// `state → symbol → state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionTable {
    rows: BTreeMap<String, BTreeMap<char, String>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `δ(from, symbol) = to`; both states become known.
    pub fn with(mut self, from: &str, symbol: char, to: &str) -> Self {
        self.insert(from, symbol, to);
        self
    }

    pub fn insert(&mut self, from: &str, symbol: char, to: &str) {
        self.rows
            .entry(from.to_string())
            .or_default()
            .insert(symbol, to.to_string());
        self.rows.entry(to.to_string()).or_default();
    }

    pub fn next(&self, state: &str, symbol: char) -> Option<&str> {
        self.rows.get(state)?.get(&symbol).map(String::as_str)
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.rows.contains_key(state)
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Strings starting with A and ending with B over `{A, B}`.
    pub fn example() -> Self {
        Self::new()
            .with("S0", 'A', "S1")
            .with("S1", 'A', "S1")
            .with("S1", 'B', "S2")
            .with("S2", 'A', "S1")
            .with("S2", 'B', "S2")
            .with("Dead", 'A', "Dead")
            .with("Dead", 'B', "Dead")
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Machine definition plus the string to run.
#[derive(Clone)]
pub struct DfaConfig {
    pub table: TransitionTable,
    pub start: String,
    pub dead: String,
    pub input: String,
    pub acceptance: Acceptance,
}

impl DfaConfig {
    /// The lab machine: accept iff it ends in S2 on a trailing `B`.
    pub fn example(input: &str) -> Self {
        Self {
            table: TransitionTable::example(),
            start: "S0".to_string(),
            dead: "Dead".to_string(),
            input: input.to_string(),
            acceptance: accept_when(vec!["S2".to_string()], Some('B')),
        }
    }
}

impl fmt::Debug for DfaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DfaConfig")
            .field("table", &self.table)
            .field("start", &self.start)
            .field("dead", &self.dead)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DfaTrace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "ACCEPTED"),
            Verdict::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// State of one automaton run.
#[derive(Clone, Serialize)]
pub struct DfaTrace {
    pub current: String,
    input: Vec<char>,
    /// Symbols consumed so far.
    position: usize,
    verdict: Option<Verdict>,
    #[serde(skip)]
    table: Arc<TransitionTable>,
    #[serde(skip)]
    dead: String,
    #[serde(skip)]
    acceptance: Acceptance,
}

impl DfaTrace {
    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Set once the whole input has been consumed.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }
}

impl fmt::Debug for DfaTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DfaTrace")
            .field("current", &self.current)
            .field("input", &self.input)
            .field("position", &self.position)
            .field("verdict", &self.verdict)
            .finish_non_exhaustive()
    }
}

impl Simulation for DfaTrace {
    type Config = DfaConfig;

    fn initialize(config: &DfaConfig) -> Result<Self, ConfigError> {
        let input: Vec<char> = config.input.trim().to_uppercase().chars().collect();
        if input.is_empty() {
            return Err(ConfigError::EmptyInput);
        }
        for state in [&config.start, &config.dead] {
            if !config.table.contains_state(state) {
                return Err(ConfigError::UnknownState(state.clone()));
            }
        }

        Ok(Self {
            current: config.start.clone(),
            input,
            position: 0,
            verdict: None,
            table: Arc::new(config.table.clone()),
            dead: config.dead.clone(),
            acceptance: Arc::clone(&config.acceptance),
        })
    }

    fn transition(&self, _rng: &mut dyn RandomSource) -> StepResult<Self> {
        let mut next = self.clone();
        let mut emitted: Vec<LogEntry> = Vec::new();

        if let Some(&symbol) = self.input.get(self.position) {
            let to = self
                .table
                .next(&self.current, symbol)
                .unwrap_or(self.dead.as_str())
                .to_string();
            emitted.push(format!("δ({}, '{symbol}') = {to}", self.current));
            log::debug!("[dfa] {} --{symbol}--> {to}", self.current);
            next.current = to;
            next.position += 1;

            if next.position == next.input.len() {
                let verdict = if (self.acceptance)(next.current.as_str(), next.input.as_slice()) {
                    Verdict::Accepted
                } else {
                    Verdict::Rejected
                };
                next.verdict = Some(verdict);
                emitted.push(format!("Result: {verdict}"));
            }
        }

        StepResult::from_state(next, emitted)
    }

    fn is_terminal(&self) -> bool {
        self.verdict.is_some()
    }

    fn describe(&self) -> String {
        format!(
            "dfa {} at {}/{}{}",
            self.current,
            self.position,
            self.input.len(),
            self.verdict.map(|v| format!(" {v}")).unwrap_or_default()
        )
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
