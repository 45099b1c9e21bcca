//! Lab configuration file.
//!
//! Every section and key is optional; missing values fall back to the
//! defaults the lab ships with.
//!
//! ```toml
//! [sliding_window]
//! window_size = 4
//! total_frames = 10
//! loss_probability = 0.1
//! slide_rule = "highest-ack"   # or "cumulative"
//!
//! [stop_and_wait]
//! total_frames = 5
//! ack_loss_probability = 0.2
//!
//! [dijkstra]
//! source = "A"
//! target = "F"
//!
//! [dfa]
//! input = "AAB"
//! accept_states = ["S2"]
//! accept_last_symbol = "B"
//!
//! [dfa.transitions.S0]
//! A = "S1"
//!
//! [autoplay]
//! cadence_ms = 700
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::dfa::{accept_when, DfaConfig, TransitionTable};
use crate::dijkstra::DijkstraConfig;
use crate::engine::ConfigError;
use crate::sliding_window::SlidingWindowConfig;
use crate::stop_and_wait::StopAndWaitConfig;
use crate::topology::TopologyConfig;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse lab config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Contents of a lab TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub sliding_window: SlidingWindowConfig,
    pub stop_and_wait: StopAndWaitConfig,
    pub dijkstra: DijkstraConfig,
    pub dfa: DfaSection,
    pub topology: TopologyConfig,
    pub autoplay: AutoplaySection,
}

impl LabConfig {
    pub fn load(path: &Path) -> Result<Self, LabError> {
        let content = std::fs::read_to_string(path).map_err(|source| LabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("loaded lab config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LabError> {
        Ok(toml::from_str(content)?)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutoplaySection {
    /// Overrides the per-experiment cadence when set.
    pub cadence_ms: Option<u64>,
}

impl AutoplaySection {
    pub fn cadence(&self) -> Option<Duration> {
        self.cadence_ms.map(Duration::from_millis)
    }
}

/// Declarative DFA: table, endpoints and an acceptance rule.
///
/// An empty `transitions` table selects the built-in lab machine.  Without
/// `accept_states` the built-in rule applies (end in S2 on a trailing B);
/// `accept_last_symbol` only refines an explicit `accept_states`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DfaSection {
    pub transitions: BTreeMap<String, BTreeMap<String, String>>,
    pub start: String,
    pub dead: String,
    pub input: String,
    pub accept_states: Option<Vec<String>>,
    pub accept_last_symbol: Option<String>,
}

impl Default for DfaSection {
    fn default() -> Self {
        Self {
            transitions: BTreeMap::new(),
            start: "S0".to_string(),
            dead: "Dead".to_string(),
            input: String::new(),
            accept_states: None,
            accept_last_symbol: None,
        }
    }
}

fn single_char(symbol: &str) -> Result<char, ConfigError> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c.to_ascii_uppercase()),
        _ => Err(ConfigError::Symbol(symbol.to_string())),
    }
}

impl DfaSection {
    pub fn to_config(&self) -> Result<DfaConfig, ConfigError> {
        let table = if self.transitions.is_empty() {
            TransitionTable::example()
        } else {
            let mut table = TransitionTable::new();
            for (from, row) in &self.transitions {
                for (symbol, to) in row {
                    table.insert(from, single_char(symbol)?, to);
                }
            }
            table
        };
        let acceptance = match &self.accept_states {
            Some(states) => {
                let last_symbol = self
                    .accept_last_symbol
                    .as_deref()
                    .map(single_char)
                    .transpose()?;
                accept_when(states.clone(), last_symbol)
            }
            None => DfaConfig::example("").acceptance,
        };

        Ok(DfaConfig {
            table,
            start: self.start.clone(),
            dead: self.dead.clone(),
            input: self.input.clone(),
            acceptance,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sliding_window::SlideRule;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = LabConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.sliding_window, SlidingWindowConfig::default());
        assert_eq!(cfg.stop_and_wait, StopAndWaitConfig::default());
        assert_eq!(cfg.dijkstra, DijkstraConfig::default());
        assert!(cfg.autoplay.cadence().is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = LabConfig::from_toml_str(
            r#"
            [sliding_window]
            window_size = 2
            slide_rule = "cumulative"

            [autoplay]
            cadence_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sliding_window.window_size, 2);
        assert_eq!(cfg.sliding_window.total_frames, 10);
        assert_eq!(cfg.sliding_window.slide_rule, SlideRule::Cumulative);
        assert_eq!(cfg.autoplay.cadence(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn custom_graph() {
        let cfg = LabConfig::from_toml_str(
            r#"
            [dijkstra]
            source = "X"
            target = "Y"

            [dijkstra.graph]
            nodes = ["X", "Y"]
            edges = [{ from = "X", to = "Y", weight = 7 }]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.dijkstra.graph.nodes, vec!["X", "Y"]);
        assert_eq!(cfg.dijkstra.graph.edges[0].weight, 7);
    }

    #[test]
    fn dfa_section_builds_table() {
        let cfg = LabConfig::from_toml_str(
            r#"
            [dfa]
            start = "Q0"
            dead = "Trap"
            input = "01"
            accept_states = ["Q1"]

            [dfa.transitions.Q0]
            0 = "Q0"
            1 = "Q1"
            "#,
        )
        .unwrap();
        let dfa = cfg.dfa.to_config().unwrap();
        assert_eq!(dfa.table.next("Q0", '1'), Some("Q1"));
        assert!(dfa.table.contains_state("Q1"));
        assert_eq!(dfa.start, "Q0");
    }

    #[test]
    fn multi_char_symbol_is_rejected() {
        let mut section = DfaSection::default();
        section
            .transitions
            .insert("S0".into(), BTreeMap::from([("AB".to_string(), "S1".to_string())]));
        assert_eq!(
            section.to_config().err().map(|e| e.to_string()),
            Some("transition symbol `AB` must be a single character".to_string())
        );
    }

    #[test]
    fn parse_error_is_reported() {
        let err = LabConfig::from_toml_str("[sliding_window]\nwindow_size = \"four\"").unwrap_err();
        assert!(matches!(err, LabError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = LabConfig::load(Path::new("/nonexistent/lab.toml")).unwrap_err();
        assert!(matches!(err, LabError::Io { .. }));
    }
}
