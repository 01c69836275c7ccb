// src/model/relationship.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ids::{ActivityId, Anchor, NodeKey, RelationshipId};

/// Precedence relationship kind between two activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Finish-to-start.
    FS,
    /// Start-to-start.
    SS,
    /// Finish-to-finish.
    FF,
    /// Start-to-finish.
    SF,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 4] = [
        RelationshipType::FS,
        RelationshipType::SS,
        RelationshipType::FF,
        RelationshipType::SF,
    ];

    /// Sub-node of the predecessor the relationship leaves from.
    pub fn predecessor_anchor(self) -> Anchor {
        match self {
            RelationshipType::SS | RelationshipType::SF => Anchor::Start,
            RelationshipType::FS | RelationshipType::FF => Anchor::End,
        }
    }

    /// Sub-node of the successor the relationship arrives at.
    pub fn successor_anchor(self) -> Anchor {
        match self {
            RelationshipType::FS | RelationshipType::SS => Anchor::Start,
            RelationshipType::FF | RelationshipType::SF => Anchor::End,
        }
    }

    /// The unique type joining the given anchors.
    pub fn from_anchors(predecessor: Anchor, successor: Anchor) -> Self {
        match (predecessor, successor) {
            (Anchor::End, Anchor::Start) => RelationshipType::FS,
            (Anchor::Start, Anchor::Start) => RelationshipType::SS,
            (Anchor::End, Anchor::End) => RelationshipType::FF,
            (Anchor::Start, Anchor::End) => RelationshipType::SF,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipType::FS => "FS",
            RelationshipType::SS => "SS",
            RelationshipType::FF => "FF",
            RelationshipType::SF => "SF",
        };
        f.write_str(s)
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FS" => Ok(RelationshipType::FS),
            "SS" => Ok(RelationshipType::SS),
            "FF" => Ok(RelationshipType::FF),
            "SF" => Ok(RelationshipType::SF),
            other => Err(format!(
                "invalid relationship type: {other} (expected FS, SS, FF or SF)"
            )),
        }
    }
}

/// A relationship as reconstructed from (or destined for) the topology store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub relationship_type: RelationshipType,
    pub predecessor: ActivityId,
    pub successor: ActivityId,
    pub lag: f64,
}

impl Relationship {
    /// Sub-node the incoming edge starts from.
    pub fn source_node(&self) -> NodeKey {
        NodeKey::anchor(self.predecessor, self.relationship_type.predecessor_anchor())
    }

    /// Sub-node the outgoing edge ends at.
    pub fn target_node(&self) -> NodeKey {
        NodeKey::anchor(self.successor, self.relationship_type.successor_anchor())
    }

    pub fn node(&self) -> NodeKey {
        NodeKey::Relationship(self.id)
    }

    pub fn touches(&self, activity: ActivityId) -> bool {
        self.predecessor == activity || self.successor == activity
    }
}
