// src/store/snapshot.rs

//! Point-in-time copy of the topology store.

use std::collections::{BTreeMap, BTreeSet};

use crate::store::{TopologyEdge, TopologyNode, TopologyWrite};

/// Immutable view of all nodes and edges, ordered for deterministic
/// iteration.
///
/// Also used to simulate write sets: the coordinator derives compensating
/// writes from it, and the engine checks a planned rewiring for cycles before
/// anything is sent to a store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologySnapshot {
    nodes: BTreeMap<String, f64>,
    edges: BTreeSet<(String, String)>,
}

impl TopologySnapshot {
    pub fn new(nodes: Vec<TopologyNode>, edges: Vec<TopologyEdge>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n.weight)).collect(),
            edges: edges.into_iter().map(|e| (e.from, e.to)).collect(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, f64)> {
        self.nodes.iter().map(|(id, w)| (id.as_str(), *w))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn weight(&self, id: &str) -> Option<f64> {
        self.nodes.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.edges.contains(&(from.to_string(), to.to_string()))
    }

    /// Edges with `id` as either endpoint.
    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.edges().filter(move |(f, t)| *f == id || *t == id)
    }

    /// Writes that undo `write` when applied to the state *after* it.
    ///
    /// Must be called on the state *before* `write` is applied.
    pub fn inverse_of(&self, write: &TopologyWrite) -> Vec<TopologyWrite> {
        match write {
            TopologyWrite::UpsertNode { id, .. } => match self.weight(id) {
                Some(prev) => vec![TopologyWrite::upsert_node(id, prev)],
                None => vec![TopologyWrite::delete_node(id)],
            },
            TopologyWrite::DeleteNode { id } => match self.weight(id) {
                Some(prev) => {
                    let mut undo = vec![TopologyWrite::upsert_node(id, prev)];
                    undo.extend(
                        self.edges_touching(id)
                            .map(|(f, t)| TopologyWrite::upsert_edge(f, t)),
                    );
                    undo
                }
                None => Vec::new(),
            },
            TopologyWrite::UpsertEdge { from, to } => {
                if self.contains_edge(from, to) {
                    Vec::new()
                } else {
                    vec![TopologyWrite::delete_edge(from, to)]
                }
            }
            TopologyWrite::DeleteEdge { from, to } => {
                if self.contains_edge(from, to) {
                    vec![TopologyWrite::upsert_edge(from, to)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Apply a write the way a conforming store would.
    pub fn apply(&mut self, write: &TopologyWrite) {
        match write {
            TopologyWrite::UpsertNode { id, weight } => {
                self.nodes.insert(id.clone(), *weight);
            }
            TopologyWrite::DeleteNode { id } => {
                self.nodes.remove(id);
                self.edges.retain(|(f, t)| f != id && t != id);
            }
            TopologyWrite::UpsertEdge { from, to } => {
                if self.contains_node(from) && self.contains_node(to) {
                    self.edges.insert((from.clone(), to.clone()));
                }
            }
            TopologyWrite::DeleteEdge { from, to } => {
                self.edges.remove(&(from.clone(), to.clone()));
            }
        }
    }
}
