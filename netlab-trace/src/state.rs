//! Finite-state-machine types shared by the protocol experiments.
//!
//! Transitions live in [`crate::sliding_window`] and
//! [`crate::stop_and_wait`]; this module only names the states so hosts can
//! render them without reaching into experiment internals.

use serde::Serialize;

/// Phases of the sliding-window sender.
///
/// ```text
/// Idle ──▶ Transmitting ──window full──▶ AwaitingAcks ──▶ Sliding
///               ▲                                            │
///               └──────────── frames left ───────────────────┤
///                                                            ▼
///                                                          Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    /// Nothing sent yet.
    #[default]
    Idle,
    /// Sending the frames of the current window, one per step.
    Transmitting,
    /// Whole window in flight; the next step resolves every ACK.
    AwaitingAcks,
    /// ACKs resolved; the next step moves the window.
    Sliding,
    Done,
}

/// Phases of the stop-and-wait ARQ sender.
///
/// ```text
/// Ready ──▶ Sending ──▶ AwaitingAck ──ACK──▶ AckReceived ──▶ Ready | Done
///              ▲             │
///              │          timeout
///              │             ▼
///              └──── TimeoutRetransmit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArqPhase {
    #[default]
    Ready,
    /// Frame on the wire; the next step decides frame and ACK loss.
    Sending,
    AwaitingAck,
    /// Wait budget exhausted; the next step resends the same frame.
    TimeoutRetransmit,
    /// ACK in hand; the next step flips the sequence bit.
    AckReceived,
    Done,
}

/// Per-frame status shown by the sliding-window view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    #[default]
    Pending,
    InTransit,
    Acknowledged,
    /// Sent at least once and its most recent ACK never arrived.
    Lost,
}

impl std::fmt::Display for WindowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::fmt::Display for ArqPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
