// src/dag/critical_path.rs

//! Longest path through the derived graph.

use petgraph::Direction;
use tracing::debug;

use crate::dag::graph::ScheduleGraph;
use crate::errors::Result;
use crate::model::{ActivityId, NodeKey};

/// The critical path: ordered node ids and the sum of their weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalPath {
    pub nodes: Vec<String>,
    pub total: f64,
}

impl CriticalPath {
    /// Standard longest-path-in-DAG dynamic programme over topological order.
    ///
    /// Each node contributes its own weight: intra nodes carry durations,
    /// relationship nodes carry lags, start/end nodes carry zero.
    ///
    /// Ties go to the node that comes later in topological order, so that
    /// zero-weight tails such as an activity's end node stay on the path.
    pub fn compute(graph: &ScheduleGraph) -> Result<Self> {
        let order = graph.sorted_indices()?;
        let g = graph.inner();

        if order.is_empty() {
            return Ok(Self::default());
        }

        let mut dist = vec![0.0_f64; g.node_count()];
        let mut prev = vec![None; g.node_count()];

        for &ix in &order {
            let mut best: Option<(f64, _)> = None;
            for p in g.neighbors_directed(ix, Direction::Incoming) {
                let d = dist[p.index()];
                if best.is_none_or(|(b, _)| d > b) {
                    best = Some((d, p));
                }
            }
            let base = best.map(|(d, _)| d).unwrap_or(0.0);
            dist[ix.index()] = base + g[ix].weight;
            prev[ix.index()] = best.map(|(_, p)| p);
        }

        let mut tail = order[0];
        for &ix in &order {
            if dist[ix.index()] >= dist[tail.index()] {
                tail = ix;
            }
        }

        let mut nodes = Vec::new();
        let mut cursor = Some(tail);
        while let Some(ix) = cursor {
            nodes.push(g[ix].id.clone());
            cursor = prev[ix.index()];
        }
        nodes.reverse();

        let total = dist[tail.index()];
        debug!(total, length = nodes.len(), "critical path computed");

        Ok(Self { nodes, total })
    }

    /// Path nodes that belong to activities, in order (relationship nodes
    /// and unrecognised ids are skipped).
    pub fn sub_nodes(&self) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter_map(|id| id.parse::<NodeKey>().ok())
            .filter(|key| !key.is_relationship())
            .collect()
    }

    /// Distinct activities along the path, in order.
    pub fn activities(&self) -> Vec<ActivityId> {
        let mut out: Vec<ActivityId> = Vec::new();
        for key in self.sub_nodes() {
            if let Some(id) = key.activity() {
                if out.last() != Some(&id) {
                    out.push(id);
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
