// src/model/ids.rs

//! Typed entity identifiers and topology node keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a logical activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub Uuid);

/// Identifier of an inter-activity relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub Uuid);

impl ActivityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl RelationshipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActivityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl FromStr for RelationshipId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Any id that can appear in the semantic index or in an error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityId {
    Activity(ActivityId),
    Relationship(RelationshipId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Activity(id) => write!(f, "activity {id}"),
            EntityId::Relationship(id) => write!(f, "relationship {id}"),
        }
    }
}

impl From<ActivityId> for EntityId {
    fn from(id: ActivityId) -> Self {
        EntityId::Activity(id)
    }
}

impl From<RelationshipId> for EntityId {
    fn from(id: RelationshipId) -> Self {
        EntityId::Relationship(id)
    }
}

/// Which end of an activity a relationship attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Anchor {
    Start,
    End,
}

/// Key of a physical node in the topology store.
///
/// String form:
/// - `s-<activity>` / `i-<activity>` / `e-<activity>` for activity sub-nodes
/// - `<relationship>` (bare uuid) for relationship nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    Start(ActivityId),
    Intra(ActivityId),
    End(ActivityId),
    Relationship(RelationshipId),
}

impl NodeKey {
    pub fn anchor(activity: ActivityId, anchor: Anchor) -> Self {
        match anchor {
            Anchor::Start => NodeKey::Start(activity),
            Anchor::End => NodeKey::End(activity),
        }
    }

    /// The activity this node belongs to, for sub-nodes.
    pub fn activity(&self) -> Option<ActivityId> {
        match self {
            NodeKey::Start(id) | NodeKey::Intra(id) | NodeKey::End(id) => Some(*id),
            NodeKey::Relationship(_) => None,
        }
    }

    /// Start/end anchor, for the two sub-nodes relationships may attach to.
    pub fn as_anchor(&self) -> Option<(ActivityId, Anchor)> {
        match self {
            NodeKey::Start(id) => Some((*id, Anchor::Start)),
            NodeKey::End(id) => Some((*id, Anchor::End)),
            NodeKey::Intra(_) | NodeKey::Relationship(_) => None,
        }
    }

    pub fn relationship(&self) -> Option<RelationshipId> {
        match self {
            NodeKey::Relationship(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, NodeKey::Relationship(_))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Start(id) => write!(f, "s-{id}"),
            NodeKey::Intra(id) => write!(f, "i-{id}"),
            NodeKey::End(id) => write!(f, "e-{id}"),
            NodeKey::Relationship(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for NodeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |rest: &str| {
            Uuid::parse_str(rest)
                .map(ActivityId)
                .map_err(|e| format!("invalid node key '{s}': {e}"))
        };

        match s.split_at_checked(2) {
            Some(("s-", rest)) => parse(rest).map(NodeKey::Start),
            Some(("i-", rest)) => parse(rest).map(NodeKey::Intra),
            Some(("e-", rest)) => parse(rest).map(NodeKey::End),
            _ => Uuid::parse_str(s)
                .map(|u| NodeKey::Relationship(RelationshipId(u)))
                .map_err(|e| format!("invalid node key '{s}': {e}")),
        }
    }
}
