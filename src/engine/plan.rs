// src/engine/plan.rs

//! Turning engine operations into transactions.
//!
//! Every function here is pure: it reads a [`TopologySnapshot`], validates
//! against the entity model and returns the writes for both stores. The
//! coordinator calls them inside its exclusive section.

use std::collections::BTreeMap;

use tracing::debug;

use crate::coordinator::Transaction;
use crate::dag::ScheduleGraph;
use crate::engine::compose::compose;
use crate::errors::{Result, ScheduleError};
use crate::model::{
    ActivityDoc, ActivityId, ActivityTopology, EntityId, NodeKey, Relationship, RelationshipDoc,
    RelationshipId, RelationshipType, ScheduleModel,
};
use crate::store::{SemanticWrite, TopologySnapshot, TopologyWrite};

/// What `delete_activity` removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub activity: ActivityId,
    pub removed_relationships: Vec<RelationshipId>,
}

/// What `dissolve_activity` removed and synthesised.
#[derive(Debug, Clone, PartialEq)]
pub struct DissolveOutcome {
    pub activity: ActivityId,
    pub removed_relationships: Vec<RelationshipId>,
    pub created: Vec<Relationship>,
}

/// A transaction under construction plus the topology it would produce.
struct Plan<T> {
    sim: TopologySnapshot,
    tx: Transaction<T>,
}

impl<T> Plan<T> {
    fn new(snapshot: &TopologySnapshot, output: T) -> Self {
        Self {
            sim: snapshot.clone(),
            tx: Transaction::new(output),
        }
    }

    fn topology(&mut self, write: TopologyWrite) {
        self.sim.apply(&write);
        self.tx.topology.push(write);
    }

    fn semantic(&mut self, write: SemanticWrite) {
        self.tx.semantic.push(write);
    }

    fn add_activity(&mut self, doc: ActivityDoc, duration: f64) {
        let id = doc.id;
        let (start, intra, end) = (NodeKey::Start(id), NodeKey::Intra(id), NodeKey::End(id));

        self.topology(TopologyWrite::upsert_node(start, 0.0));
        self.topology(TopologyWrite::upsert_node(intra, duration));
        self.topology(TopologyWrite::upsert_node(end, 0.0));
        self.topology(TopologyWrite::upsert_edge(start, intra));
        self.topology(TopologyWrite::upsert_edge(intra, end));
        self.semantic(SemanticWrite::UpsertActivity(doc));
        self.tx.touch(id);
    }

    fn add_relationship(&mut self, rel: &Relationship) {
        let node = rel.node();
        self.topology(TopologyWrite::upsert_node(node, rel.lag));
        self.topology(TopologyWrite::upsert_edge(rel.source_node(), node));
        self.topology(TopologyWrite::upsert_edge(node, rel.target_node()));
        self.semantic(SemanticWrite::UpsertRelationship(RelationshipDoc::from(rel)));
        self.tx.touch(rel.id);
    }

    /// Detach and delete a node, edge by edge.
    fn remove_node(&mut self, node: NodeKey) {
        let id = node.to_string();
        let edges: Vec<(String, String)> = self
            .sim
            .edges_touching(&id)
            .map(|(f, t)| (f.to_string(), t.to_string()))
            .collect();
        for (from, to) in edges {
            self.topology(TopologyWrite::delete_edge(from, to));
        }
        self.topology(TopologyWrite::delete_node(id));
    }

    fn remove_relationship(&mut self, id: RelationshipId) {
        self.remove_node(NodeKey::Relationship(id));
        self.semantic(SemanticWrite::DeleteRelationship(id));
        self.tx.touch(id);
    }

    fn remove_activity(&mut self, activity: &ActivityTopology) {
        for node in activity.present_nodes() {
            self.remove_node(node);
        }
        self.semantic(SemanticWrite::DeleteActivity(activity.id));
        self.tx.touch(activity.id);
    }

    fn is_acyclic(&self) -> bool {
        ScheduleGraph::from_snapshot(&self.sim).is_acyclic()
    }

    fn finish(self) -> Transaction<T> {
        self.tx
    }
}

pub(crate) fn add_activity(
    snapshot: &TopologySnapshot,
    doc: ActivityDoc,
    duration: f64,
) -> Result<Transaction<ActivityId>> {
    let mut plan = Plan::new(snapshot, doc.id);
    plan.add_activity(doc, duration);
    Ok(plan.finish())
}

pub(crate) fn add_relationship(
    snapshot: &TopologySnapshot,
    rel: Relationship,
) -> Result<Transaction<RelationshipId>> {
    let model = ScheduleModel::from_snapshot(snapshot);

    for endpoint in [rel.predecessor, rel.successor] {
        if model.complete_activity(endpoint).is_none() {
            return Err(ScheduleError::DanglingReference(EntityId::Activity(endpoint)));
        }
    }

    // The new node sits on source -> node -> target, so it closes a cycle
    // exactly when the target already reaches the source.
    let graph = ScheduleGraph::from_snapshot(snapshot);
    if graph.reachable(&rel.target_node().to_string(), &rel.source_node().to_string()) {
        return Err(ScheduleError::InvalidRelationship(format!(
            "{} {} -> {} would introduce a cycle",
            rel.relationship_type, rel.predecessor, rel.successor
        )));
    }

    let mut plan = Plan::new(snapshot, rel.id);
    plan.add_relationship(&rel);
    Ok(plan.finish())
}

pub(crate) fn delete_activity(
    snapshot: &TopologySnapshot,
    id: ActivityId,
) -> Result<Transaction<DeleteOutcome>> {
    let model = ScheduleModel::from_snapshot(snapshot);
    let activity = model
        .activity(id)
        .ok_or(ScheduleError::NotFound(EntityId::Activity(id)))?;

    let removed = model.incident_relationship_nodes(id);
    let mut plan = Plan::new(
        snapshot,
        DeleteOutcome {
            activity: id,
            removed_relationships: removed.clone(),
        },
    );

    for rel in removed {
        plan.remove_relationship(rel);
    }
    plan.remove_activity(activity);

    Ok(plan.finish())
}

pub(crate) fn delete_relationship(
    snapshot: &TopologySnapshot,
    id: RelationshipId,
) -> Result<Transaction<RelationshipId>> {
    let model = ScheduleModel::from_snapshot(snapshot);
    if !model.has_relationship_node(id) {
        return Err(ScheduleError::NotFound(EntityId::Relationship(id)));
    }

    let mut plan = Plan::new(snapshot, id);
    plan.remove_relationship(id);
    Ok(plan.finish())
}

pub(crate) fn dissolve_activity(
    snapshot: &TopologySnapshot,
    id: ActivityId,
) -> Result<Transaction<DissolveOutcome>> {
    let model = ScheduleModel::from_snapshot(snapshot);
    let activity = model
        .activity(id)
        .ok_or(ScheduleError::NotFound(EntityId::Activity(id)))?;
    if !activity.is_complete() {
        return Err(ScheduleError::DanglingReference(EntityId::Activity(id)));
    }
    let duration = activity.duration().unwrap_or(0.0);

    let mut synthesised: BTreeMap<(ActivityId, ActivityId, RelationshipType), f64> =
        BTreeMap::new();

    for before in model.predecessors_of(id) {
        for after in model.successors_of(id) {
            let (b, c) = (before.predecessor, after.successor);
            if b == c {
                debug!(activity = %id, endpoint = %b, "skipping self composition");
                continue;
            }

            let composition = compose(before.relationship_type, after.relationship_type);
            let lag = composition.lag(before.lag, duration, after.lag);
            let ty = composition.relationship_type;

            if let Some(existing) = model.find_relationship(b, c, ty) {
                debug!(
                    activity = %id,
                    relationship = %existing.id,
                    "composition already present; keeping existing relationship"
                );
                continue;
            }

            synthesised
                .entry((b, c, ty))
                .and_modify(|current| *current = current.min(lag))
                .or_insert(lag);
        }
    }

    let removed = model.incident_relationship_nodes(id);
    let created: Vec<Relationship> = synthesised
        .into_iter()
        .map(|((predecessor, successor, relationship_type), lag)| Relationship {
            id: RelationshipId::new(),
            relationship_type,
            predecessor,
            successor,
            lag,
        })
        .collect();

    let mut plan = Plan::new(
        snapshot,
        DissolveOutcome {
            activity: id,
            removed_relationships: removed.clone(),
            created: created.clone(),
        },
    );

    for rel in removed {
        plan.remove_relationship(rel);
    }
    plan.remove_activity(activity);
    for rel in &created {
        plan.add_relationship(rel);
    }

    if !plan.is_acyclic() {
        return Err(ScheduleError::Cycle(format!(
            "dissolving activity {id} would introduce a cycle"
        )));
    }

    Ok(plan.finish())
}
