// src/model/activity.rs

//! The activity aggregate and the documents kept in the semantic index.

use serde::{Deserialize, Serialize};

use crate::model::duration::DurationSpec;
use crate::model::ids::{ActivityId, NodeKey, RelationshipId};
use crate::model::relationship::{Relationship, RelationshipType};

/// Topology view of one activity: its three sub-nodes and their state.
///
/// The handles are kept private to the crate; collaborators only ever see
/// the activity id.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityTopology {
    pub id: ActivityId,
    pub(crate) start: Option<f64>,
    pub(crate) intra: Option<f64>,
    pub(crate) end: Option<f64>,
    pub(crate) start_to_intra: bool,
    pub(crate) intra_to_end: bool,
}

impl ActivityTopology {
    pub(crate) fn empty(id: ActivityId) -> Self {
        Self {
            id,
            start: None,
            intra: None,
            end: None,
            start_to_intra: false,
            intra_to_end: false,
        }
    }

    /// All three nodes exist and `start -> intra -> end` is connected.
    pub fn is_complete(&self) -> bool {
        self.start.is_some()
            && self.intra.is_some()
            && self.end.is_some()
            && self.start_to_intra
            && self.intra_to_end
    }

    /// Weight on the intra node (the expected duration), if present.
    pub fn duration(&self) -> Option<f64> {
        self.intra
    }

    /// Sub-nodes currently present in the store.
    pub(crate) fn present_nodes(&self) -> Vec<NodeKey> {
        let mut nodes = Vec::with_capacity(3);
        if self.start.is_some() {
            nodes.push(NodeKey::Start(self.id));
        }
        if self.intra.is_some() {
            nodes.push(NodeKey::Intra(self.id));
        }
        if self.end.is_some() {
            nodes.push(NodeKey::End(self.id));
        }
        nodes
    }
}

/// Semantic index document for an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDoc {
    pub id: ActivityId,
    pub name: String,
    pub description: String,
    /// Canonical duration encoding (see [`DurationSpec`]).
    pub duration: String,
}

impl ActivityDoc {
    pub fn new(id: ActivityId, name: &str, description: &str, duration: &DurationSpec) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            duration: duration.to_string(),
        }
    }

    /// Text used for naive matching by in-process index implementations.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.description, self.duration)
    }
}

/// Semantic index document for an inter-activity relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDoc {
    pub id: RelationshipId,
    pub relationship_type: RelationshipType,
    pub predecessor_id: ActivityId,
    pub successor_id: ActivityId,
    pub lag: f64,
}

impl RelationshipDoc {
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} lag {}",
            self.relationship_type, self.predecessor_id, self.successor_id, self.lag
        )
    }
}

impl From<&Relationship> for RelationshipDoc {
    fn from(rel: &Relationship) -> Self {
        Self {
            id: rel.id,
            relationship_type: rel.relationship_type,
            predecessor_id: rel.predecessor,
            successor_id: rel.successor,
            lag: rel.lag,
        }
    }
}

/// Result of a coordinator read: what the topology store says an id is.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Activity(ActivityTopology),
    Relationship(Relationship),
}
