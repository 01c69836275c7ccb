// src/model/schedule.rs

//! Entity-level reading of a topology snapshot.
//!
//! The topology store only knows weighted nodes and edges. This module turns
//! a [`TopologySnapshot`] back into activities and relationships, and records
//! anything that does not fit the expected shapes as a [`ModelIssue`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::model::activity::{ActivityTopology, Entity};
use crate::model::ids::{ActivityId, EntityId, NodeKey, RelationshipId};
use crate::model::relationship::{Relationship, RelationshipType};
use crate::store::TopologySnapshot;

/// Structural problem found while reading a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelIssue {
    /// Node id that is neither an activity sub-node nor a relationship.
    ForeignNode(String),
    /// Some but not all of an activity's nodes/edges exist.
    IncompleteActivity(ActivityId),
    /// Relationship node without exactly one anchor-to-anchor in/out edge.
    MalformedRelationship(RelationshipId, String),
}

impl fmt::Display for ModelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelIssue::ForeignNode(id) => write!(f, "foreign node {id}"),
            ModelIssue::IncompleteActivity(id) => write!(f, "incomplete activity {id}"),
            ModelIssue::MalformedRelationship(id, why) => {
                write!(f, "malformed relationship {id}: {why}")
            }
        }
    }
}

#[derive(Debug, Default)]
struct RelationshipNode {
    lag: f64,
    incoming: Vec<NodeKey>,
    outgoing: Vec<NodeKey>,
}

/// Activities and relationships as stored in topology.
#[derive(Debug, Clone, Default)]
pub struct ScheduleModel {
    activities: BTreeMap<ActivityId, ActivityTopology>,
    relationships: BTreeMap<RelationshipId, Relationship>,
    /// Every relationship node, well-formed or not, with its neighbours.
    relationship_nodes: BTreeMap<RelationshipId, BTreeSet<NodeKey>>,
    issues: Vec<ModelIssue>,
}

impl ScheduleModel {
    pub fn from_snapshot(snapshot: &TopologySnapshot) -> Self {
        let mut activities: BTreeMap<ActivityId, ActivityTopology> = BTreeMap::new();
        let mut rel_nodes: BTreeMap<RelationshipId, RelationshipNode> = BTreeMap::new();
        let mut issues = Vec::new();

        for (id, weight) in snapshot.nodes() {
            match id.parse::<NodeKey>() {
                Ok(NodeKey::Start(a)) => {
                    activities
                        .entry(a)
                        .or_insert_with(|| ActivityTopology::empty(a))
                        .start = Some(weight)
                }
                Ok(NodeKey::Intra(a)) => {
                    activities
                        .entry(a)
                        .or_insert_with(|| ActivityTopology::empty(a))
                        .intra = Some(weight)
                }
                Ok(NodeKey::End(a)) => {
                    activities
                        .entry(a)
                        .or_insert_with(|| ActivityTopology::empty(a))
                        .end = Some(weight)
                }
                Ok(NodeKey::Relationship(r)) => {
                    rel_nodes.entry(r).or_default().lag = weight;
                }
                Err(_) => issues.push(ModelIssue::ForeignNode(id.to_string())),
            }
        }

        for (from, to) in snapshot.edges() {
            let (Ok(from), Ok(to)) = (from.parse::<NodeKey>(), to.parse::<NodeKey>()) else {
                continue;
            };
            match (from, to) {
                (NodeKey::Start(a), NodeKey::Intra(b)) if a == b => {
                    if let Some(act) = activities.get_mut(&a) {
                        act.start_to_intra = true;
                    }
                }
                (NodeKey::Intra(a), NodeKey::End(b)) if a == b => {
                    if let Some(act) = activities.get_mut(&a) {
                        act.intra_to_end = true;
                    }
                }
                _ => {}
            }
            if let NodeKey::Relationship(r) = to {
                if let Some(node) = rel_nodes.get_mut(&r) {
                    node.incoming.push(from);
                }
            }
            if let NodeKey::Relationship(r) = from {
                if let Some(node) = rel_nodes.get_mut(&r) {
                    node.outgoing.push(to);
                }
            }
        }

        for act in activities.values() {
            if !act.is_complete() {
                issues.push(ModelIssue::IncompleteActivity(act.id));
            }
        }

        let mut relationships = BTreeMap::new();
        let mut relationship_nodes = BTreeMap::new();

        for (id, node) in rel_nodes {
            let neighbours: BTreeSet<NodeKey> = node
                .incoming
                .iter()
                .chain(node.outgoing.iter())
                .copied()
                .collect();
            relationship_nodes.insert(id, neighbours);

            match decode_relationship(id, &node) {
                Ok(rel) => {
                    relationships.insert(id, rel);
                }
                Err(why) => {
                    debug!(relationship = %id, reason = %why, "malformed relationship node");
                    issues.push(ModelIssue::MalformedRelationship(id, why));
                }
            }
        }

        Self {
            activities,
            relationships,
            relationship_nodes,
            issues,
        }
    }

    pub fn activity(&self, id: ActivityId) -> Option<&ActivityTopology> {
        self.activities.get(&id)
    }

    /// The activity only if all of its members are present and connected.
    pub fn complete_activity(&self, id: ActivityId) -> Option<&ActivityTopology> {
        self.activities.get(&id).filter(|a| a.is_complete())
    }

    pub fn activities(&self) -> impl Iterator<Item = &ActivityTopology> {
        self.activities.values()
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Whether a relationship node exists at all, even a malformed one.
    pub fn has_relationship_node(&self, id: RelationshipId) -> bool {
        self.relationship_nodes.contains_key(&id)
    }

    /// Well-formed relationships ending at `activity`.
    pub fn predecessors_of(&self, activity: ActivityId) -> Vec<Relationship> {
        self.relationships
            .values()
            .filter(|r| r.successor == activity)
            .copied()
            .collect()
    }

    /// Well-formed relationships starting at `activity`.
    pub fn successors_of(&self, activity: ActivityId) -> Vec<Relationship> {
        self.relationships
            .values()
            .filter(|r| r.predecessor == activity)
            .copied()
            .collect()
    }

    /// Every relationship node attached to any of the activity's sub-nodes,
    /// including malformed ones.
    pub fn incident_relationship_nodes(&self, activity: ActivityId) -> Vec<RelationshipId> {
        self.relationship_nodes
            .iter()
            .filter(|(_, neighbours)| neighbours.iter().any(|n| n.activity() == Some(activity)))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether a well-formed relationship with this exact shape exists.
    pub fn find_relationship(
        &self,
        predecessor: ActivityId,
        successor: ActivityId,
        relationship_type: RelationshipType,
    ) -> Option<&Relationship> {
        self.relationships.values().find(|r| {
            r.predecessor == predecessor
                && r.successor == successor
                && r.relationship_type == relationship_type
        })
    }

    pub fn issues(&self) -> &[ModelIssue] {
        &self.issues
    }

    /// Resolve an entity id against topology.
    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        match id {
            EntityId::Activity(a) => self.activity(a).cloned().map(Entity::Activity),
            EntityId::Relationship(r) => self.relationship(r).copied().map(Entity::Relationship),
        }
    }
}

fn decode_relationship(id: RelationshipId, node: &RelationshipNode) -> Result<Relationship, String> {
    let (from, to) = match (node.incoming.as_slice(), node.outgoing.as_slice()) {
        ([from], [to]) => (*from, *to),
        (incoming, outgoing) => {
            return Err(format!(
                "expected in/out degree 1/1, found {}/{}",
                incoming.len(),
                outgoing.len()
            ));
        }
    };

    let Some((predecessor, pred_anchor)) = from.as_anchor() else {
        return Err(format!("incoming edge from non-anchor node {from}"));
    };
    let Some((successor, succ_anchor)) = to.as_anchor() else {
        return Err(format!("outgoing edge to non-anchor node {to}"));
    };
    if predecessor == successor {
        return Err(format!("connects activity {predecessor} to itself"));
    }

    Ok(Relationship {
        id,
        relationship_type: RelationshipType::from_anchors(pred_anchor, succ_anchor),
        predecessor,
        successor,
        lag: node.lag,
    })
}
