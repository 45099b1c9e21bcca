//! Guided stop-and-wait tour.
//!
//! A fixed walkthrough of the three textbook ARQ outcomes, replayed one
//! event per step.  Unlike [`crate::stop_and_wait`] nothing here is random;
//! the tour exists so a learner can see each outcome on demand.

use serde::Serialize;

use crate::engine::{ConfigError, LogEntry};
use crate::replay::{Recording, Replay, ReplayFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// DATA delivered, ACK returned.
    Success,
    /// DATA delivered, ACK too late: timeout and retransmit.
    Timeout,
    /// DATA lost: no ACK, timeout and retransmit.
    Lost,
}

impl Scenario {
    pub fn number(self) -> u8 {
        match self {
            Scenario::Success => 1,
            Scenario::Timeout => 2,
            Scenario::Lost => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TourEvent {
    pub scenario: Scenario,
    pub text: &'static str,
}

const SCRIPT: [(Scenario, &str); 8] = [
    (Scenario::Success, "Sender sends DATA; receiver will ACK."),
    (Scenario::Success, "Receiver sends ACK back to sender."),
    (Scenario::Timeout, "Sender sends DATA; the ACK is delayed."),
    (Scenario::Timeout, "Sender waited; timeout occurs with no ACK."),
    (Scenario::Timeout, "Timeout: sender retransmits DATA'; ACK returns."),
    (Scenario::Lost, "Sender sends DATA; it is lost mid-way."),
    (Scenario::Lost, "Packet lost in transit; no ACK arrives."),
    (Scenario::Lost, "Timeout: sender retransmits DATA'; receiver receives it."),
];

impl ReplayFrame for TourEvent {
    type Config = ();

    fn record(_config: &()) -> Result<Recording<Self>, ConfigError> {
        Ok(Recording {
            frames: SCRIPT
                .iter()
                .map(|&(scenario, text)| TourEvent { scenario, text })
                .collect(),
            closing: Some("Done: all scenarios completed. Reset to run again.".to_string()),
        })
    }

    fn narrate(&self, _index: usize) -> LogEntry {
        format!("Scenario {}: {}", self.scenario.number(), self.text)
    }
}

pub type ScenarioTour = Replay<TourEvent>;
