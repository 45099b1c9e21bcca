//! Tagged union over every experiment.
//!
//! Hosts that let the learner pick an experiment at runtime drive an
//! [`Experiment`] through the same [`Simulation`] interface as the concrete
//! types; each call dispatches to the wrapped state.

use std::time::Duration;

use serde::Serialize;

use crate::dfa::{DfaConfig, DfaTrace};
use crate::dijkstra::{DijkstraConfig, DijkstraTrace};
use crate::engine::{ConfigError, Simulation, StepResult};
use crate::random::RandomSource;
use crate::scenario::ScenarioTour;
use crate::sliding_window::{SlidingWindow, SlidingWindowConfig};
use crate::stop_and_wait::{StopAndWait, StopAndWaitConfig};
use crate::topology::{TopologyConfig, TopologyTrace};

/// Configuration for whichever experiment is being started.
#[derive(Debug, Clone)]
pub enum ExperimentConfig {
    SlidingWindow(SlidingWindowConfig),
    StopAndWait(StopAndWaitConfig),
    Dijkstra(DijkstraConfig),
    Dfa(DfaConfig),
    Topology(TopologyConfig),
    ScenarioTour,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "experiment", rename_all = "snake_case")]
pub enum Experiment {
    SlidingWindow(SlidingWindow),
    StopAndWait(StopAndWait),
    Dijkstra(DijkstraTrace),
    Dfa(DfaTrace),
    Topology(TopologyTrace),
    ScenarioTour(ScenarioTour),
}

impl Experiment {
    pub fn name(&self) -> &'static str {
        match self {
            Experiment::SlidingWindow(_) => "sliding-window",
            Experiment::StopAndWait(_) => "stop-and-wait",
            Experiment::Dijkstra(_) => "dijkstra",
            Experiment::Dfa(_) => "dfa",
            Experiment::Topology(_) => "topology",
            Experiment::ScenarioTour(_) => "tour",
        }
    }

    /// Autoplay cadence the lab uses for this experiment.
    pub fn default_cadence(&self) -> Duration {
        match self {
            Experiment::Dijkstra(_) => Duration::from_millis(1200),
            Experiment::ScenarioTour(_) => Duration::from_millis(2400),
            _ => Duration::from_millis(700),
        }
    }
}

impl Simulation for Experiment {
    type Config = ExperimentConfig;

    fn initialize(config: &ExperimentConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            ExperimentConfig::SlidingWindow(c) => {
                Experiment::SlidingWindow(SlidingWindow::initialize(c)?)
            }
            ExperimentConfig::StopAndWait(c) => {
                Experiment::StopAndWait(StopAndWait::initialize(c)?)
            }
            ExperimentConfig::Dijkstra(c) => Experiment::Dijkstra(DijkstraTrace::initialize(c)?),
            ExperimentConfig::Dfa(c) => Experiment::Dfa(DfaTrace::initialize(c)?),
            ExperimentConfig::Topology(c) => Experiment::Topology(TopologyTrace::initialize(c)?),
            ExperimentConfig::ScenarioTour => {
                Experiment::ScenarioTour(ScenarioTour::initialize(&())?)
            }
        })
    }

    fn transition(&self, rng: &mut dyn RandomSource) -> StepResult<Self> {
        match self {
            Experiment::SlidingWindow(s) => s.transition(rng).map(Experiment::SlidingWindow),
            Experiment::StopAndWait(s) => s.transition(rng).map(Experiment::StopAndWait),
            Experiment::Dijkstra(s) => s.transition(rng).map(Experiment::Dijkstra),
            Experiment::Dfa(s) => s.transition(rng).map(Experiment::Dfa),
            Experiment::Topology(s) => s.transition(rng).map(Experiment::Topology),
            Experiment::ScenarioTour(s) => s.transition(rng).map(Experiment::ScenarioTour),
        }
    }

    fn is_terminal(&self) -> bool {
        match self {
            Experiment::SlidingWindow(s) => s.is_terminal(),
            Experiment::StopAndWait(s) => s.is_terminal(),
            Experiment::Dijkstra(s) => s.is_terminal(),
            Experiment::Dfa(s) => s.is_terminal(),
            Experiment::Topology(s) => s.is_terminal(),
            Experiment::ScenarioTour(s) => s.is_terminal(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Experiment::SlidingWindow(s) => s.describe(),
            Experiment::StopAndWait(s) => s.describe(),
            Experiment::Dijkstra(s) => format!("dijkstra {}", s.describe()),
            Experiment::Dfa(s) => s.describe(),
            Experiment::Topology(s) => format!("topology {}", s.describe()),
            Experiment::ScenarioTour(s) => format!("tour {}", s.describe()),
        }
    }
}
