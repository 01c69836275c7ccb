// src/engine/audit.rs

//! Cross-store consistency audit.
//!
//! Compares the topology store (ground truth for connectivity) with the
//! semantic index and reports every disagreement. Nothing is repaired here.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{
    ActivityDoc, ActivityId, EntityId, ModelIssue, RelationshipDoc, RelationshipId, ScheduleModel,
};
use crate::store::TopologySnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum AuditFinding {
    /// Indexed activity with no complete triple in topology.
    ActivityWithoutTopology(ActivityId),
    /// Complete triple with no activity document.
    ActivityWithoutDoc(ActivityId),
    /// Indexed relationship with no well-formed node in topology.
    RelationshipWithoutTopology(RelationshipId),
    /// Well-formed relationship node with no document.
    RelationshipWithoutDoc(RelationshipId),
    /// Document and node disagree on type, endpoints or lag.
    RelationshipMismatch(RelationshipId, String),
    /// Shape problem found while reading topology.
    Structure(ModelIssue),
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditFinding::ActivityWithoutTopology(id) => {
                write!(f, "activity {id} is indexed but has no complete triple")
            }
            AuditFinding::ActivityWithoutDoc(id) => {
                write!(f, "activity {id} has a triple but no document")
            }
            AuditFinding::RelationshipWithoutTopology(id) => {
                write!(f, "relationship {id} is indexed but has no well-formed node")
            }
            AuditFinding::RelationshipWithoutDoc(id) => {
                write!(f, "relationship {id} has a node but no document")
            }
            AuditFinding::RelationshipMismatch(id, why) => {
                write!(f, "relationship {id} disagrees with its document: {why}")
            }
            AuditFinding::Structure(issue) => write!(f, "{issue}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    pub findings: Vec<AuditFinding>,
    /// Entities flagged by failed rollbacks in this process.
    pub flagged: Vec<EntityId>,
}

impl AuditReport {
    pub fn build(
        snapshot: &TopologySnapshot,
        activity_docs: &[ActivityDoc],
        relationship_docs: &[RelationshipDoc],
        flagged: Vec<EntityId>,
    ) -> Self {
        let model = ScheduleModel::from_snapshot(snapshot);
        let mut findings: Vec<AuditFinding> = model
            .issues()
            .iter()
            .cloned()
            .map(AuditFinding::Structure)
            .collect();

        let indexed: BTreeSet<ActivityId> = activity_docs.iter().map(|d| d.id).collect();
        for id in &indexed {
            if model.complete_activity(*id).is_none() {
                findings.push(AuditFinding::ActivityWithoutTopology(*id));
            }
        }
        for act in model.activities().filter(|a| a.is_complete()) {
            if !indexed.contains(&act.id) {
                findings.push(AuditFinding::ActivityWithoutDoc(act.id));
            }
        }

        for doc in relationship_docs {
            match model.relationship(doc.id) {
                None => findings.push(AuditFinding::RelationshipWithoutTopology(doc.id)),
                Some(rel) => {
                    if let Some(why) = mismatch(doc, &RelationshipDoc::from(rel)) {
                        findings.push(AuditFinding::RelationshipMismatch(doc.id, why));
                    }
                }
            }
        }
        let indexed: BTreeSet<RelationshipId> = relationship_docs.iter().map(|d| d.id).collect();
        for rel in model.relationships() {
            if !indexed.contains(&rel.id) {
                findings.push(AuditFinding::RelationshipWithoutDoc(rel.id));
            }
        }

        Self { findings, flagged }
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.flagged.is_empty()
    }
}

fn mismatch(doc: &RelationshipDoc, stored: &RelationshipDoc) -> Option<String> {
    if doc.relationship_type != stored.relationship_type {
        return Some(format!(
            "type {} in index, {} in topology",
            doc.relationship_type, stored.relationship_type
        ));
    }
    if doc.predecessor_id != stored.predecessor_id || doc.successor_id != stored.successor_id {
        return Some("endpoints differ".to_string());
    }
    if doc.lag != stored.lag {
        return Some(format!("lag {} in index, {} in topology", doc.lag, stored.lag));
    }
    None
}
