// src/store/memory.rs

//! In-process store implementations backed by `tokio::sync::RwLock` maps.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::model::{ActivityDoc, ActivityId, RelationshipDoc, RelationshipId};
use crate::store::{
    rank_by_overlap, SemanticIndex, StoreResult, TopologyEdge, TopologyNode, TopologyStore,
};

#[derive(Debug, Default)]
struct Graph {
    nodes: BTreeMap<String, f64>,
    edges: BTreeSet<(String, String)>,
}

/// Topology store kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryTopologyStore {
    graph: RwLock<Graph>,
}

impl InMemoryTopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a previously loaded node/edge list.
    pub fn from_parts(nodes: Vec<TopologyNode>, edges: Vec<TopologyEdge>) -> Self {
        let graph = Graph {
            nodes: nodes.into_iter().map(|n| (n.id, n.weight)).collect(),
            edges: edges.into_iter().map(|e| (e.from, e.to)).collect(),
        };
        Self {
            graph: RwLock::new(graph),
        }
    }
}

#[async_trait]
impl TopologyStore for InMemoryTopologyStore {
    async fn upsert_node(&self, id: &str, weight: f64) -> StoreResult<()> {
        self.graph.write().await.nodes.insert(id.to_string(), weight);
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> StoreResult<()> {
        let mut graph = self.graph.write().await;
        graph.nodes.remove(id);
        graph.edges.retain(|(f, t)| f != id && t != id);
        Ok(())
    }

    async fn upsert_edge(&self, from: &str, to: &str) -> StoreResult<()> {
        let mut graph = self.graph.write().await;
        for end in [from, to] {
            if !graph.nodes.contains_key(end) {
                return Err(StoreError::Rejected(format!(
                    "edge {from} -> {to} references missing node {end}"
                )));
            }
        }
        graph.edges.insert((from.to_string(), to.to_string()));
        Ok(())
    }

    async fn delete_edge(&self, from: &str, to: &str) -> StoreResult<()> {
        self.graph
            .write()
            .await
            .edges
            .remove(&(from.to_string(), to.to_string()));
        Ok(())
    }

    async fn load_all(&self) -> StoreResult<(Vec<TopologyNode>, Vec<TopologyEdge>)> {
        let graph = self.graph.read().await;
        let nodes = graph
            .nodes
            .iter()
            .map(|(id, w)| TopologyNode {
                id: id.clone(),
                weight: *w,
            })
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|(f, t)| TopologyEdge {
                from: f.clone(),
                to: t.clone(),
            })
            .collect();
        Ok((nodes, edges))
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
struct Docs {
    activities: BTreeMap<ActivityId, ActivityDoc>,
    relationships: BTreeMap<RelationshipId, RelationshipDoc>,
}

/// Semantic index kept in memory. `query` ranks by token overlap instead of
/// embeddings.
#[derive(Debug, Default)]
pub struct InMemorySemanticIndex {
    docs: RwLock<Docs>,
}

impl InMemorySemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SemanticIndex for InMemorySemanticIndex {
    async fn upsert_activity_doc(&self, doc: &ActivityDoc) -> StoreResult<()> {
        self.docs
            .write()
            .await
            .activities
            .insert(doc.id, doc.clone());
        Ok(())
    }

    async fn delete_activity_doc(&self, id: ActivityId) -> StoreResult<()> {
        self.docs.write().await.activities.remove(&id);
        Ok(())
    }

    async fn upsert_relationship_doc(&self, doc: &RelationshipDoc) -> StoreResult<()> {
        self.docs
            .write()
            .await
            .relationships
            .insert(doc.id, doc.clone());
        Ok(())
    }

    async fn delete_relationship_doc(&self, id: RelationshipId) -> StoreResult<()> {
        self.docs.write().await.relationships.remove(&id);
        Ok(())
    }

    async fn activity_doc(&self, id: ActivityId) -> StoreResult<Option<ActivityDoc>> {
        Ok(self.docs.read().await.activities.get(&id).cloned())
    }

    async fn relationship_doc(&self, id: RelationshipId) -> StoreResult<Option<RelationshipDoc>> {
        Ok(self.docs.read().await.relationships.get(&id).cloned())
    }

    async fn activity_docs(&self) -> StoreResult<Vec<ActivityDoc>> {
        Ok(self.docs.read().await.activities.values().cloned().collect())
    }

    async fn relationship_docs(&self) -> StoreResult<Vec<RelationshipDoc>> {
        Ok(self
            .docs
            .read()
            .await
            .relationships
            .values()
            .cloned()
            .collect())
    }

    async fn query(&self, text: &str, k: usize) -> StoreResult<Vec<String>> {
        let docs = self.docs.read().await;
        let candidates = docs
            .activities
            .values()
            .map(|d| (d.id.to_string(), d.search_text()))
            .chain(
                docs.relationships
                    .values()
                    .map(|d| (d.id.to_string(), d.search_text())),
            );
        Ok(rank_by_overlap(text, candidates, k))
    }

    async fn ping(&self) -> bool {
        true
    }
}
