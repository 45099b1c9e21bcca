//! Replay variant of the trace engine.
//!
//! Some experiments compute their whole trace eagerly (Dijkstra, topology
//! construction, the scripted ARQ tour).  [`Replay`] then hands out one
//! recorded frame per step, followed by an optional closing line.  The
//! recording is shared behind an `Arc`, so cloning a replay state for a
//! snapshot never copies the frames.

use std::sync::Arc;

use serde::Serialize;

use crate::engine::{ConfigError, LogEntry, Simulation, StepResult};
use crate::random::RandomSource;

/// A frame type that can be recorded from a config and narrated.
pub trait ReplayFrame: Clone + Serialize {
    type Config;

    /// Compute the full trace up front.
    fn record(config: &Self::Config) -> Result<Recording<Self>, ConfigError>;

    /// Log line for the frame at `index` (0-based).
    fn narrate(&self, index: usize) -> LogEntry;
}

/// Eagerly computed trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording<F> {
    pub frames: Vec<F>,
    /// Emitted on its own step after the last frame.
    pub closing: Option<LogEntry>,
}

/// Cursor over a [`Recording`].
#[derive(Debug, Clone, Serialize)]
pub struct Replay<F> {
    frames: Arc<[F]>,
    closing: Option<LogEntry>,
    /// Frames already replayed.
    cursor: usize,
    closed: bool,
}

impl<F: ReplayFrame> Replay<F> {
    pub fn new(recording: Recording<F>) -> Self {
        Self {
            frames: recording.frames.into(),
            closing: recording.closing,
            cursor: 0,
            closed: false,
        }
    }

    /// Every recorded frame, replayed or not.
    pub fn frames(&self) -> &[F] {
        &self.frames
    }

    /// Most recently replayed frame.
    pub fn current(&self) -> Option<&F> {
        self.cursor.checked_sub(1).map(|i| &self.frames[i])
    }

    /// Frames replayed so far.
    pub fn replayed(&self) -> &[F] {
        &self.frames[..self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn closing(&self) -> Option<&str> {
        self.closing.as_deref()
    }
}

impl<F: ReplayFrame> Simulation for Replay<F> {
    type Config = F::Config;

    fn initialize(config: &F::Config) -> Result<Self, ConfigError> {
        Ok(Self::new(F::record(config)?))
    }

    fn transition(&self, _rng: &mut dyn RandomSource) -> StepResult<Self> {
        let mut next = self.clone();
        let mut emitted = Vec::new();

        if let Some(frame) = self.frames.get(self.cursor) {
            emitted.push(frame.narrate(self.cursor));
            next.cursor += 1;
        } else if let Some(closing) = &self.closing {
            emitted.push(closing.clone());
            next.closed = true;
        }

        StepResult::from_state(next, emitted)
    }

    fn is_terminal(&self) -> bool {
        self.cursor >= self.frames.len() && (self.closing.is_none() || self.closed)
    }

    fn describe(&self) -> String {
        format!("replay {}/{}", self.cursor, self.frames.len())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
