// src/store/mod.rs

//! Adapters for the two persistent stores.
//!
//! The engine never talks to a database directly. It goes through two narrow
//! traits:
//! - [`TopologyStore`]: weighted nodes plus single-kind "precedes" edges.
//! - [`SemanticIndex`]: documents for activities and relationships, keyed by
//!   the same entity ids.
//!
//! Implementations:
//! - [`memory`] keeps everything in process (tests, embedding in other tools).
//! - [`file`] persists JSON snapshots through the [`crate::fs::FileSystem`]
//!   abstraction (used by the CLI).
//!
//! Retry policy, if any, belongs to an adapter. The coordinator treats every
//! call as a single attempt with a definite outcome.

pub mod file;
pub mod memory;
pub mod snapshot;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::model::{ActivityDoc, ActivityId, RelationshipDoc, RelationshipId};

pub use file::{FileSemanticIndex, FileTopologyStore};
pub use memory::{InMemorySemanticIndex, InMemoryTopologyStore};
pub use snapshot::TopologySnapshot;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub from: String,
    pub to: String,
}

/// Graph store holding the authoritative schedule connectivity.
#[async_trait]
pub trait TopologyStore: Send + Sync {
    async fn upsert_node(&self, id: &str, weight: f64) -> StoreResult<()>;
    /// Delete a node together with any edges still attached to it.
    async fn delete_node(&self, id: &str) -> StoreResult<()>;
    /// Both endpoints must already exist.
    async fn upsert_edge(&self, from: &str, to: &str) -> StoreResult<()>;
    async fn delete_edge(&self, from: &str, to: &str) -> StoreResult<()>;
    async fn load_all(&self) -> StoreResult<(Vec<TopologyNode>, Vec<TopologyEdge>)>;
    async fn ping(&self) -> bool;
}

/// Searchable document store over activities and relationships.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    async fn upsert_activity_doc(&self, doc: &ActivityDoc) -> StoreResult<()>;
    async fn delete_activity_doc(&self, id: ActivityId) -> StoreResult<()>;
    async fn upsert_relationship_doc(&self, doc: &RelationshipDoc) -> StoreResult<()>;
    async fn delete_relationship_doc(&self, id: RelationshipId) -> StoreResult<()>;

    async fn activity_doc(&self, id: ActivityId) -> StoreResult<Option<ActivityDoc>>;
    async fn relationship_doc(&self, id: RelationshipId) -> StoreResult<Option<RelationshipDoc>>;
    async fn activity_docs(&self) -> StoreResult<Vec<ActivityDoc>>;
    async fn relationship_docs(&self) -> StoreResult<Vec<RelationshipDoc>>;

    /// Ranked ids for free text. Only collaborators call this; the engine
    /// itself never searches.
    async fn query(&self, text: &str, k: usize) -> StoreResult<Vec<String>>;
    async fn ping(&self) -> bool;
}

/// A single write against the topology store.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyWrite {
    UpsertNode { id: String, weight: f64 },
    DeleteNode { id: String },
    UpsertEdge { from: String, to: String },
    DeleteEdge { from: String, to: String },
}

impl TopologyWrite {
    pub fn upsert_node(id: impl ToString, weight: f64) -> Self {
        TopologyWrite::UpsertNode {
            id: id.to_string(),
            weight,
        }
    }

    pub fn delete_node(id: impl ToString) -> Self {
        TopologyWrite::DeleteNode { id: id.to_string() }
    }

    pub fn upsert_edge(from: impl ToString, to: impl ToString) -> Self {
        TopologyWrite::UpsertEdge {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn delete_edge(from: impl ToString, to: impl ToString) -> Self {
        TopologyWrite::DeleteEdge {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            TopologyWrite::UpsertNode { .. } => "upsert_node",
            TopologyWrite::DeleteNode { .. } => "delete_node",
            TopologyWrite::UpsertEdge { .. } => "upsert_edge",
            TopologyWrite::DeleteEdge { .. } => "delete_edge",
        }
    }

    pub(crate) async fn apply(&self, store: &dyn TopologyStore) -> StoreResult<()> {
        match self {
            TopologyWrite::UpsertNode { id, weight } => store.upsert_node(id, *weight).await,
            TopologyWrite::DeleteNode { id } => store.delete_node(id).await,
            TopologyWrite::UpsertEdge { from, to } => store.upsert_edge(from, to).await,
            TopologyWrite::DeleteEdge { from, to } => store.delete_edge(from, to).await,
        }
    }
}

/// A single write against the semantic index.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticWrite {
    UpsertActivity(ActivityDoc),
    DeleteActivity(ActivityId),
    UpsertRelationship(RelationshipDoc),
    DeleteRelationship(RelationshipId),
}

impl SemanticWrite {
    pub fn op_name(&self) -> &'static str {
        match self {
            SemanticWrite::UpsertActivity(_) => "upsert_activity_doc",
            SemanticWrite::DeleteActivity(_) => "delete_activity_doc",
            SemanticWrite::UpsertRelationship(_) => "upsert_relationship_doc",
            SemanticWrite::DeleteRelationship(_) => "delete_relationship_doc",
        }
    }

    pub(crate) async fn apply(&self, index: &dyn SemanticIndex) -> StoreResult<()> {
        match self {
            SemanticWrite::UpsertActivity(doc) => index.upsert_activity_doc(doc).await,
            SemanticWrite::DeleteActivity(id) => index.delete_activity_doc(*id).await,
            SemanticWrite::UpsertRelationship(doc) => index.upsert_relationship_doc(doc).await,
            SemanticWrite::DeleteRelationship(id) => index.delete_relationship_doc(*id).await,
        }
    }
}

/// Lower-cased alphanumeric tokens, shared by the in-process `query`
/// implementations.
pub(crate) fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Rank `(id, text)` candidates by token overlap with `query`.
pub(crate) fn rank_by_overlap<I>(query: &str, candidates: I, k: usize) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let wanted = tokens(query);
    if wanted.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, String)> = candidates
        .into_iter()
        .filter_map(|(id, text)| {
            let have = tokens(&text);
            let score = wanted.iter().filter(|t| have.contains(t)).count();
            (score > 0).then_some((score, id))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().take(k).map(|(_, id)| id).collect()
}
