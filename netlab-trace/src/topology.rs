//! Network topology construction trace.
//!
//! Builds one of the four classic layouts and replays it link by link:
//!
//! | Kind   | Nodes                 | Links                          |
//! |--------|-----------------------|--------------------------------|
//! | Bus    | 5 on a line           | neighbours on the line         |
//! | Star   | hub + 5 around it     | every node to the hub          |
//! | Ring   | 6 on a circle         | neighbours, closing the circle |
//! | Mesh   | 8 cube corners        | the 12 cube edges              |
//!
//! A built [`Topology`] can also be handed to the Dijkstra trace as a
//! unit-weight [`Graph`].

use serde::{Deserialize, Serialize};

use crate::dijkstra::{Edge, Graph};
use crate::engine::{ConfigError, LogEntry};
use crate::replay::{Recording, Replay, ReplayFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    #[default]
    Bus,
    Star,
    Ring,
    Mesh,
}

impl std::str::FromStr for TopologyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bus" => Ok(TopologyKind::Bus),
            "star" => Ok(TopologyKind::Star),
            "ring" => Ok(TopologyKind::Ring),
            "mesh" => Ok(TopologyKind::Mesh),
            _ => Err(format!("unknown topology: {s}")),
        }
    }
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Cube edges over corners indexed as in [`Topology::build`].
#[rustfmt::skip]
const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 3), (3, 2), (2, 0),
    (4, 5), (5, 7), (7, 6), (6, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// Nodes and undirected links of a built layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub kind: TopologyKind,
    pub nodes: Vec<String>,
    pub links: Vec<(usize, usize)>,
}

impl Topology {
    pub fn build(kind: TopologyKind) -> Self {
        let numbered = |n: usize| (0..n).map(|i| format!("N{i}")).collect::<Vec<_>>();
        let (nodes, links) = match kind {
            TopologyKind::Bus => (numbered(5), (0..4).map(|i| (i, i + 1)).collect()),
            TopologyKind::Star => {
                let mut nodes = vec!["Hub".to_string()];
                nodes.extend(numbered(5));
                (nodes, (1..=5).map(|i| (0, i)).collect())
            }
            TopologyKind::Ring => (numbered(6), (0..6).map(|i| (i, (i + 1) % 6)).collect()),
            TopologyKind::Mesh => (numbered(8), CUBE_EDGES.to_vec()),
        };
        Self { kind, nodes, links }
    }

    pub fn degree(&self, node: usize) -> usize {
        self.links
            .iter()
            .filter(|(a, b)| *a == node || *b == node)
            .count()
    }

    /// Unit-weight graph over the same nodes and links.
    pub fn to_graph(&self) -> Graph {
        Graph {
            nodes: self.nodes.clone(),
            edges: self
                .links
                .iter()
                .map(|&(a, b)| Edge::new(&self.nodes[a], &self.nodes[b], 1))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub kind: TopologyKind,
}

/// One link being laid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkFrame {
    pub a: String,
    pub b: String,
}

impl ReplayFrame for LinkFrame {
    type Config = TopologyConfig;

    fn record(config: &TopologyConfig) -> Result<Recording<Self>, ConfigError> {
        let topology = Topology::build(config.kind);
        let degrees: Vec<usize> = (0..topology.nodes.len()).map(|i| topology.degree(i)).collect();
        let closing = format!(
            "{} topology: {} nodes, {} links, degree {}..{}",
            topology.kind,
            topology.nodes.len(),
            topology.links.len(),
            degrees.iter().min().copied().unwrap_or(0),
            degrees.iter().max().copied().unwrap_or(0)
        );
        let frames = topology
            .links
            .iter()
            .map(|&(a, b)| LinkFrame {
                a: topology.nodes[a].clone(),
                b: topology.nodes[b].clone(),
            })
            .collect();
        Ok(Recording {
            frames,
            closing: Some(closing),
        })
    }

    fn narrate(&self, index: usize) -> LogEntry {
        format!("Link {}: {} ↔ {}", index + 1, self.a, self.b)
    }
}

pub type TopologyTrace = Replay<LinkFrame>;

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
