//! Stop-and-wait ARQ experiment.
//!
//! [`StopAndWait`] keeps exactly one frame outstanding and labels frames
//! with a one-bit sequence number.
//!
//! # Stop-and-Wait contract
//! - At most **one** frame is in flight at any moment.
//! - The frame may be lost on the way out (`frame_loss_probability`) or its
//!   ACK may be lost on the way back (`ack_loss_probability`).
//! - Without an ACK the sender waits `ack_timeout_ticks` steps, then resends
//!   the same frame with the same sequence number.
//! - On ACK the sequence number flips (0 ↔ 1) and the next frame is sent.
//!
//! An ACK that is in flight is always delivered in the first waiting step,
//! which also drops the pending timeout.  A lost ACK never arrives late, so
//! a timeout and an ACK can never both fire for the same transmission.

use serde::{Deserialize, Serialize};

use crate::engine::{check_probability, ConfigError, LogEntry, Simulation, StepResult};
use crate::random::{draw_loss, RandomSource};
use crate::state::ArqPhase;

/// Parameters accepted before a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopAndWaitConfig {
    pub total_frames: usize,
    pub ack_loss_probability: f64,
    pub frame_loss_probability: f64,
    /// Waiting steps before a timeout fires.
    pub ack_timeout_ticks: u32,
}

impl Default for StopAndWaitConfig {
    fn default() -> Self {
        Self {
            total_frames: 5,
            ack_loss_probability: 0.2,
            frame_loss_probability: 0.0,
            ack_timeout_ticks: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// StopAndWait
// ---------------------------------------------------------------------------

/// Send-side state of one stop-and-wait run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopAndWait {
    pub phase: ArqPhase,
    /// Index of the frame currently being delivered.
    pub frame: usize,
    /// One-bit sequence number carried by the current frame.
    pub seq: u8,
    /// Transmissions of the current frame (1 = first send).
    pub tx_count: u32,
    /// Retransmissions over the whole run.
    pub retransmissions: u32,
    waited: u32,
    ack_in_flight: bool,
    total_frames: usize,
    ack_loss_probability: f64,
    frame_loss_probability: f64,
    ack_timeout_ticks: u32,
}

impl StopAndWait {
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Sequence number the receiver acknowledges with.
    fn ack_seq(&self) -> u8 {
        self.seq ^ 1
    }

    pub fn ack_loss_probability(&self) -> f64 {
        self.ack_loss_probability
    }

    /// Change ACK loss between steps.
    pub fn set_ack_loss_probability(&mut self, p: f64) -> Result<(), ConfigError> {
        self.ack_loss_probability = check_probability("ACK loss probability", p)?;
        Ok(())
    }

    /// Change frame loss between steps.
    pub fn set_frame_loss_probability(&mut self, p: f64) -> Result<(), ConfigError> {
        self.frame_loss_probability = check_probability("frame loss probability", p)?;
        Ok(())
    }

    fn send(&mut self, emitted: &mut Vec<LogEntry>) {
        self.tx_count = 1;
        self.waited = 0;
        self.phase = ArqPhase::Sending;
        emitted.push(format!("Sending frame {} (seq {})", self.frame, self.seq));
        log::debug!("[arq] → frame={} seq={}", self.frame, self.seq);
    }

    fn deliver(&mut self, rng: &mut dyn RandomSource, emitted: &mut Vec<LogEntry>) {
        self.ack_in_flight = false;
        self.waited = 0;
        self.phase = ArqPhase::AwaitingAck;

        if draw_loss(rng, self.frame_loss_probability) {
            emitted.push(format!("Frame {} (seq {}) lost in transit", self.frame, self.seq));
            log::debug!("[arq] frame={} lost", self.frame);
            return;
        }

        emitted.push(format!(
            "Receiver got frame {} (seq {}); sending ACK {}",
            self.frame,
            self.seq,
            self.ack_seq()
        ));
        if draw_loss(rng, self.ack_loss_probability) {
            emitted.push(format!("ACK {} lost", self.ack_seq()));
            log::debug!("[arq] ACK {} lost", self.ack_seq());
        } else {
            self.ack_in_flight = true;
        }
    }

    fn await_ack(&mut self, emitted: &mut Vec<LogEntry>) {
        if self.ack_in_flight {
            self.ack_in_flight = false;
            self.waited = 0;
            self.phase = ArqPhase::AckReceived;
            emitted.push(format!("ACK {} received for frame {}", self.ack_seq(), self.frame));
            log::debug!("[arq] ← ACK {} frame={}", self.ack_seq(), self.frame);
            return;
        }

        self.waited += 1;
        if self.waited >= self.ack_timeout_ticks {
            self.phase = ArqPhase::TimeoutRetransmit;
            emitted.push(format!(
                "Timeout: no ACK for frame {} after {} tick(s)",
                self.frame, self.waited
            ));
        } else {
            emitted.push(format!(
                "Waiting for ACK of frame {} ({}/{})",
                self.frame, self.waited, self.ack_timeout_ticks
            ));
        }
    }

    fn retransmit(&mut self, emitted: &mut Vec<LogEntry>) {
        self.tx_count += 1;
        self.retransmissions += 1;
        self.waited = 0;
        self.phase = ArqPhase::Sending;
        emitted.push(format!(
            "Retransmitting frame {} (seq {}), attempt {}",
            self.frame, self.seq, self.tx_count
        ));
        log::debug!("[arq] ↻ frame={} seq={} tx={}", self.frame, self.seq, self.tx_count);
    }

    fn complete_frame(&mut self, emitted: &mut Vec<LogEntry>) {
        self.seq ^= 1;
        self.frame += 1;
        if self.frame >= self.total_frames {
            self.phase = ArqPhase::Done;
            emitted.push(format!(
                "All {} frames acknowledged ({} retransmission(s)).",
                self.total_frames, self.retransmissions
            ));
        } else {
            self.phase = ArqPhase::Ready;
            emitted.push(format!(
                "Sequence number flips to {}; next frame {}",
                self.seq, self.frame
            ));
        }
    }
}

impl Simulation for StopAndWait {
    type Config = StopAndWaitConfig;

    fn initialize(config: &StopAndWaitConfig) -> Result<Self, ConfigError> {
        if config.total_frames < 1 {
            return Err(ConfigError::FrameCount(config.total_frames));
        }
        if config.ack_timeout_ticks < 1 {
            return Err(ConfigError::AckTimeout);
        }
        let ack_loss_probability =
            check_probability("ACK loss probability", config.ack_loss_probability)?;
        let frame_loss_probability =
            check_probability("frame loss probability", config.frame_loss_probability)?;

        Ok(Self {
            phase: ArqPhase::Ready,
            frame: 0,
            seq: 0,
            tx_count: 0,
            retransmissions: 0,
            waited: 0,
            ack_in_flight: false,
            total_frames: config.total_frames,
            ack_loss_probability,
            frame_loss_probability,
            ack_timeout_ticks: config.ack_timeout_ticks,
        })
    }

    fn transition(&self, rng: &mut dyn RandomSource) -> StepResult<Self> {
        let mut next = self.clone();
        let mut emitted = Vec::new();

        match self.phase {
            ArqPhase::Ready => next.send(&mut emitted),
            ArqPhase::Sending => next.deliver(rng, &mut emitted),
            ArqPhase::AwaitingAck => next.await_ack(&mut emitted),
            ArqPhase::TimeoutRetransmit => next.retransmit(&mut emitted),
            ArqPhase::AckReceived => next.complete_frame(&mut emitted),
            ArqPhase::Done => {}
        }

        StepResult::from_state(next, emitted)
    }

    fn is_terminal(&self) -> bool {
        self.phase == ArqPhase::Done
    }

    fn describe(&self) -> String {
        format!(
            "stop-and-wait frame {}/{} seq={} {} tx={}",
            self.frame, self.total_frames, self.seq, self.phase, self.tx_count
        )
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
