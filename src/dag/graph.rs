// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use crate::dag::critical_path::CriticalPath;
use crate::errors::{Result, ScheduleError};
use crate::store::TopologySnapshot;

/// A weighted node of the derived graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleNode {
    pub id: String,
    pub weight: f64,
}

/// Derived directed graph over every topology node and edge.
///
/// Built from a [`TopologySnapshot`] and thrown away after use; it is never
/// patched in place, so it cannot drift from the store.
#[derive(Debug, Clone, Default)]
pub struct ScheduleGraph {
    graph: DiGraph<ScheduleNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl ScheduleGraph {
    /// Build the graph in O(V + E). Nodes are inserted in id order so that
    /// traversal order (and therefore tie-breaking) is deterministic.
    pub fn from_snapshot(snapshot: &TopologySnapshot) -> Self {
        let mut graph = DiGraph::with_capacity(snapshot.node_count(), snapshot.edge_count());
        let mut index = HashMap::with_capacity(snapshot.node_count());

        for (id, weight) in snapshot.nodes() {
            let ix = graph.add_node(ScheduleNode {
                id: id.to_string(),
                weight,
            });
            index.insert(id.to_string(), ix);
        }

        for (from, to) in snapshot.edges() {
            match (index.get(from), index.get(to)) {
                (Some(&a), Some(&b)) => {
                    graph.add_edge(a, b, ());
                }
                _ => warn!(from, to, "edge references a missing node; skipped"),
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "schedule graph rebuilt"
        );

        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `to` is reachable from `from` (a node reaches itself).
    pub fn reachable(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        toposort(&self.graph, None).is_ok()
    }

    pub(crate) fn sorted_indices(&self) -> Result<Vec<NodeIndex>> {
        toposort(&self.graph, None).map_err(|cycle| {
            let node = &self.graph[cycle.node_id()].id;
            ScheduleError::Cycle(format!("cycle detected involving node '{node}'"))
        })
    }

    pub(crate) fn inner(&self) -> &DiGraph<ScheduleNode, ()> {
        &self.graph
    }

    /// Longest node-weighted path; see [`CriticalPath::compute`].
    pub fn critical_path(&self) -> Result<CriticalPath> {
        CriticalPath::compute(self)
    }
}
