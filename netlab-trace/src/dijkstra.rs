//! Dijkstra shortest-path trace.
//!
//! The algorithm runs eagerly over an undirected weighted [`Graph`]; every
//! visit is recorded as a [`DijkstraStep`] and the session replays them one
//! per tick through [`crate::replay::Replay`].
//!
//! Selection rule: the unvisited node with the smallest tentative distance
//! is visited next, ties going to the node declared first.  Unreachable
//! nodes are still visited (at distance ∞) so the trace covers the whole
//! graph.

use serde::{Deserialize, Serialize};

use crate::engine::{ConfigError, LogEntry};
use crate::replay::{Recording, Replay, ReplayFrame};

/// Undirected weighted edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub weight: u32,
}

impl Edge {
    pub fn new(from: &str, to: &str, weight: u32) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            weight,
        }
    }
}

/// Node list plus edge list, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Graph {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// The six-node lab network (A..F).
    pub fn example() -> Self {
        Self {
            nodes: ["A", "B", "C", "D", "E", "F"].map(String::from).to_vec(),
            edges: vec![
                Edge::new("A", "B", 4),
                Edge::new("A", "D", 2),
                Edge::new("B", "C", 3),
                Edge::new("B", "D", 1),
                Edge::new("C", "E", 2),
                Edge::new("D", "C", 5),
                Edge::new("D", "E", 3),
                Edge::new("E", "F", 4),
                Edge::new("C", "F", 6),
            ],
        }
    }

    /// Dense position of `node` in declaration order.
    pub fn index_of(&self, node: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == node)
    }

    /// Check that nodes are unique and every edge endpoint is declared.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.is_empty() {
            return Err(ConfigError::EmptyGraph);
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].contains(node) {
                return Err(ConfigError::DuplicateNode(node.clone()));
            }
        }
        for edge in &self.edges {
            for end in [&edge.from, &edge.to] {
                if self.index_of(end).is_none() {
                    return Err(ConfigError::UnknownNode(end.clone()));
                }
            }
        }
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::example()
    }
}

/// Which graph to search and between which nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DijkstraConfig {
    pub graph: Graph,
    pub source: String,
    pub target: String,
}

impl Default for DijkstraConfig {
    fn default() -> Self {
        Self {
            graph: Graph::example(),
            source: "A".to_string(),
            target: "F".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// DijkstraStep
// ---------------------------------------------------------------------------

/// One visit: the node taken off the frontier and the tables after
/// relaxing its edges.  Distances of `None` are infinite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DijkstraStep {
    pub current: String,
    pub distances: Vec<(String, Option<u64>)>,
    pub previous: Vec<(String, String)>,
}

impl DijkstraStep {
    pub fn distance_to(&self, node: &str) -> Option<u64> {
        self.distances
            .iter()
            .find(|(n, _)| n == node)
            .and_then(|(_, d)| *d)
    }
}

/// Result of running the algorithm to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DijkstraOutcome {
    pub steps: Vec<DijkstraStep>,
    /// Source to target, empty when the target is unreachable.
    pub path: Vec<String>,
    pub distance: Option<u64>,
}

/// Run Dijkstra eagerly, recording every visit.
pub fn solve(config: &DijkstraConfig) -> Result<DijkstraOutcome, ConfigError> {
    let graph = &config.graph;
    graph.validate()?;
    let source = graph
        .index_of(&config.source)
        .ok_or_else(|| ConfigError::UnknownNode(config.source.clone()))?;
    let target = graph
        .index_of(&config.target)
        .ok_or_else(|| ConfigError::UnknownNode(config.target.clone()))?;

    let n = graph.nodes.len();
    let mut adjacency: Vec<Vec<(usize, u64)>> = vec![Vec::new(); n];
    for edge in &graph.edges {
        // Endpoints were validated above.
        let (Some(a), Some(b)) = (graph.index_of(&edge.from), graph.index_of(&edge.to)) else {
            continue;
        };
        adjacency[a].push((b, u64::from(edge.weight)));
        adjacency[b].push((a, u64::from(edge.weight)));
    }

    let mut dist: Vec<Option<u64>> = vec![None; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    dist[source] = Some(0);

    let mut steps = Vec::with_capacity(n);
    for _ in 0..n {
        let Some(current) = closest_unvisited(&dist, &visited) else {
            break;
        };
        visited[current] = true;

        if let Some(base) = dist[current] {
            for &(next, weight) in &adjacency[current] {
                if visited[next] {
                    continue;
                }
                let candidate = base + weight;
                if dist[next].map_or(true, |d| candidate < d) {
                    dist[next] = Some(candidate);
                    prev[next] = Some(current);
                }
            }
        }

        log::debug!("[dijkstra] visit {} dist={:?}", graph.nodes[current], dist[current]);
        steps.push(DijkstraStep {
            current: graph.nodes[current].clone(),
            distances: graph.nodes.iter().cloned().zip(dist.iter().copied()).collect(),
            previous: prev
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.map(|p| (graph.nodes[i].clone(), graph.nodes[p].clone())))
                .collect(),
        });
    }

    let distance = dist[target];
    let path = match distance {
        Some(_) => {
            let mut path = vec![graph.nodes[target].clone()];
            let mut at = target;
            while let Some(p) = prev[at] {
                path.push(graph.nodes[p].clone());
                at = p;
            }
            path.reverse();
            path
        }
        None => Vec::new(),
    };

    Ok(DijkstraOutcome {
        steps,
        path,
        distance,
    })
}

/// Unvisited node with the smallest finite distance; ties go to the lower
/// index.  Falls back to the first unvisited node when all are infinite.
fn closest_unvisited(dist: &[Option<u64>], visited: &[bool]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for i in (0..dist.len()).filter(|&i| !visited[i]) {
        best = match best {
            None => Some(i),
            Some(b) => match (dist[i], dist[b]) {
                (Some(d), Some(bd)) if d < bd => Some(i),
                (Some(_), None) => Some(i),
                _ => Some(b),
            },
        };
    }
    best
}

fn format_distance(d: Option<u64>) -> String {
    d.map_or_else(|| "∞".to_string(), |d| d.to_string())
}

impl ReplayFrame for DijkstraStep {
    type Config = DijkstraConfig;

    fn record(config: &DijkstraConfig) -> Result<Recording<Self>, ConfigError> {
        let outcome = solve(config)?;
        let closing = match outcome.distance {
            Some(d) => format!(
                "Simulation complete. Final path: {}, Total Distance: {}",
                outcome.path.join(" → "),
                d
            ),
            None => format!(
                "Simulation complete. {} is unreachable from {}",
                config.target, config.source
            ),
        };
        Ok(Recording {
            frames: outcome.steps,
            closing: Some(closing),
        })
    }

    fn narrate(&self, index: usize) -> LogEntry {
        let distances = self
            .distances
            .iter()
            .map(|(n, d)| format!("{n}:{}", format_distance(*d)))
            .collect::<Vec<_>>()
            .join(", ");
        let previous = self
            .previous
            .iter()
            .map(|(n, p)| format!("{n}←{p}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Step {}: Visiting {}. Distances: {distances}. Previous: {previous}",
            index + 1,
            self.current
        )
    }
}

/// Replay of a precomputed Dijkstra run.
pub type DijkstraTrace = Replay<DijkstraStep>;

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
