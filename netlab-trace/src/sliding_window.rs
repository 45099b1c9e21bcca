//! Sliding-window transmission experiment.
//!
//! [`SlidingWindow`] sends the frames of a window one per step, resolves
//! every ACK of the window in a single step (each frame independently lost
//! with `loss_probability`), then slides.
//!
//! # Window contract
//!
//! - The window covers `[window_start, window_end)` with
//!   `window_end = min(window_start + window_size, total_frames)`.
//! - [`SlideRule::HighestAck`]: the new start is one past the highest frame
//!   acknowledged in the round, or unchanged if none was.  A lost frame
//!   below an acknowledged one is skipped.
//! - [`SlideRule::Cumulative`]: the new start is the first frame not yet
//!   acknowledged (Go-Back-N), so every frame is eventually acknowledged.
//! - The run ends once `window_start >= total_frames`.
//!
//! ```text
//!  window_start       window_end
//!       │                  │
//!  ─────┼──────────────────┼───────────▶ frame index
//!  acked│ <── this round ─▶│ <── pending
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::{check_probability, ConfigError, LogEntry, Simulation, StepResult};
use crate::random::{draw_loss, RandomSource};
use crate::state::{FrameStatus, WindowPhase};

/// How the window start moves after a round of ACKs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideRule {
    #[default]
    HighestAck,
    Cumulative,
}

impl std::str::FromStr for SlideRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highest-ack" | "highest" => Ok(SlideRule::HighestAck),
            "cumulative" | "go-back-n" | "gbn" => Ok(SlideRule::Cumulative),
            _ => Err(format!("unknown slide rule: {s}")),
        }
    }
}

/// Parameters accepted before a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingWindowConfig {
    pub window_size: usize,
    pub total_frames: usize,
    /// Per-frame probability that the ACK never arrives.
    pub loss_probability: f64,
    pub slide_rule: SlideRule,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            window_size: 4,
            total_frames: 10,
            loss_probability: 0.1,
            slide_rule: SlideRule::HighestAck,
        }
    }
}

// ---------------------------------------------------------------------------
// SlidingWindow
// ---------------------------------------------------------------------------

/// State of one sliding-window run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlidingWindow {
    pub phase: WindowPhase,
    /// Left window edge (first frame of the current round).
    pub window_start: usize,
    /// Right window edge, exclusive.
    pub window_end: usize,
    /// Next frame to put on the wire while transmitting.
    next_frame: usize,
    frames: Vec<FrameStatus>,
    /// Frames sent in the current round, in send order.
    in_transit: Vec<usize>,
    /// Frames whose ACK arrived in the most recent round.
    last_acked: Vec<usize>,
    /// Completed ACK rounds.
    pub rounds: u32,
    window_size: usize,
    loss_probability: f64,
    slide_rule: SlideRule,
}

impl SlidingWindow {
    pub fn frames(&self) -> &[FrameStatus] {
        &self.frames
    }

    pub fn in_transit(&self) -> &[usize] {
        &self.in_transit
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn slide_rule(&self) -> SlideRule {
        self.slide_rule
    }

    pub fn acknowledged(&self) -> usize {
        self.frames
            .iter()
            .filter(|s| **s == FrameStatus::Acknowledged)
            .count()
    }

    fn window_end_from(&self, start: usize) -> usize {
        (start + self.window_size).min(self.frames.len())
    }

    /// Put the next frame of the window on the wire.
    fn send_next(&mut self, emitted: &mut Vec<LogEntry>) {
        let frame = self.next_frame;
        self.frames[frame] = FrameStatus::InTransit;
        self.in_transit.push(frame);
        self.next_frame += 1;
        emitted.push(format!("Sent frame {frame}"));
        log::debug!(
            "[window] → frame {frame} in_flight={} window=[{}, {})",
            self.in_transit.len(),
            self.window_start,
            self.window_end
        );
        if self.next_frame >= self.window_end {
            self.phase = WindowPhase::AwaitingAcks;
        }
    }

    /// Draw one loss outcome per in-transit frame.
    fn resolve_acks(&mut self, rng: &mut dyn RandomSource, emitted: &mut Vec<LogEntry>) {
        let mut acked = Vec::new();
        let mut lost = Vec::new();
        for &frame in &self.in_transit {
            if draw_loss(rng, self.loss_probability) {
                lost.push(frame);
            } else {
                acked.push(frame);
            }
        }

        for &frame in &acked {
            self.frames[frame] = FrameStatus::Acknowledged;
        }
        for &frame in &lost {
            // A resent frame keeps an earlier acknowledgement.
            if self.frames[frame] != FrameStatus::Acknowledged {
                self.frames[frame] = FrameStatus::Lost;
            }
        }

        emitted.push(format!("Acknowledged frames: {}", join_or_none(&acked)));
        emitted.push(format!(
            "Successfully transferred {} out of {} frames in this window.",
            acked.len(),
            self.in_transit.len()
        ));
        if !lost.is_empty() {
            emitted.push(format!(
                "Timeout / Missing ACK for frames: {}",
                join_or_none(&lost)
            ));
        }
        log::debug!("[window] ← acked={acked:?} lost={lost:?}");

        self.last_acked = acked;
        self.rounds += 1;
        self.phase = WindowPhase::Sliding;
    }

    /// Move the window according to the slide rule.
    fn slide(&mut self, emitted: &mut Vec<LogEntry>) {
        let start = match self.slide_rule {
            SlideRule::HighestAck => self
                .last_acked
                .iter()
                .max()
                .map_or(self.window_start, |&highest| highest + 1),
            SlideRule::Cumulative => (self.window_start..self.frames.len())
                .find(|&i| self.frames[i] != FrameStatus::Acknowledged)
                .unwrap_or(self.frames.len()),
        };

        self.window_start = start;
        self.window_end = self.window_end_from(start);
        self.next_frame = start;
        self.in_transit.clear();

        if start >= self.frames.len() {
            self.phase = WindowPhase::Done;
            emitted.push("All frames transmitted successfully.".to_string());
            log::debug!("[window] done after {} round(s)", self.rounds);
        } else {
            self.phase = WindowPhase::Transmitting;
            emitted.push(format!(
                "Window slides to [{}, {})",
                self.window_start, self.window_end
            ));
        }
    }
}

fn join_or_none(frames: &[usize]) -> String {
    if frames.is_empty() {
        return "None".to_string();
    }
    frames
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Simulation for SlidingWindow {
    type Config = SlidingWindowConfig;

    fn initialize(config: &SlidingWindowConfig) -> Result<Self, ConfigError> {
        if config.window_size < 1 {
            return Err(ConfigError::WindowSize(config.window_size));
        }
        if config.total_frames < 1 {
            return Err(ConfigError::FrameCount(config.total_frames));
        }
        let loss_probability = check_probability("loss probability", config.loss_probability)?;

        Ok(Self {
            phase: WindowPhase::Idle,
            window_start: 0,
            window_end: config.window_size.min(config.total_frames),
            next_frame: 0,
            frames: vec![FrameStatus::Pending; config.total_frames],
            in_transit: Vec::with_capacity(config.window_size),
            last_acked: Vec::new(),
            rounds: 0,
            window_size: config.window_size,
            loss_probability,
            slide_rule: config.slide_rule,
        })
    }

    fn transition(&self, rng: &mut dyn RandomSource) -> StepResult<Self> {
        let mut next = self.clone();
        let mut emitted = Vec::new();

        match self.phase {
            WindowPhase::Idle => {
                next.phase = WindowPhase::Transmitting;
                next.send_next(&mut emitted);
            }
            WindowPhase::Transmitting => next.send_next(&mut emitted),
            WindowPhase::AwaitingAcks => next.resolve_acks(rng, &mut emitted),
            WindowPhase::Sliding => next.slide(&mut emitted),
            WindowPhase::Done => {}
        }

        StepResult::from_state(next, emitted)
    }

    fn is_terminal(&self) -> bool {
        self.phase == WindowPhase::Done
    }

    fn describe(&self) -> String {
        format!(
            "sliding window [{}, {}) {} acked={}/{}",
            self.window_start,
            self.window_end,
            self.phase,
            self.acknowledged(),
            self.frames.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
