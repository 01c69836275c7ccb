// src/engine/mod.rs

//! The topology engine: every schedule mutation and query.
//!
//! - [`compose`] holds the relationship composition table used by dissolve.
//! - [`plan`] turns operations into two-store transactions.
//! - [`audit`] compares both stores for out-of-band repair.
//!
//! The engine owns no state of its own. It validates requests, hands a
//! planner to the [`ConsistencyCoordinator`] and logs the outcome.

pub mod audit;
pub mod compose;
pub mod plan;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::coordinator::{ConsistencyCoordinator, StoreHealth};
use crate::dag::{CriticalPath, ScheduleGraph};
use crate::errors::{Result, ScheduleError};
use crate::model::{
    ActivityDoc, ActivityId, DurationSpec, EntityId, Relationship, RelationshipDoc,
    RelationshipId, RelationshipType,
};
use crate::store::{SemanticIndex, TopologyStore};

pub use audit::{AuditFinding, AuditReport};
pub use compose::{compose, Composition, LagRule, COMPOSITION_TABLE};
pub use plan::{DeleteOutcome, DissolveOutcome};

#[derive(Debug, Clone)]
pub struct TopologyEngine {
    coordinator: ConsistencyCoordinator,
}

impl TopologyEngine {
    pub fn new(coordinator: ConsistencyCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn with_stores(
        topology: Arc<dyn TopologyStore>,
        semantic: Arc<dyn SemanticIndex>,
        timeout: Duration,
    ) -> Self {
        Self::new(ConsistencyCoordinator::new(topology, semantic, timeout))
    }

    pub fn coordinator(&self) -> &ConsistencyCoordinator {
        &self.coordinator
    }

    /// Create an activity: three nodes, two edges and one document.
    ///
    /// The name and duration are validated before any store is touched.
    pub async fn add_activity(
        &self,
        name: &str,
        description: &str,
        duration: &str,
    ) -> Result<ActivityId> {
        if name.trim().is_empty() {
            return Err(ScheduleError::Validation(
                "activity name must not be empty".to_string(),
            ));
        }
        let spec: DurationSpec = duration.parse()?;
        let expected = spec.expected();
        let doc = ActivityDoc::new(ActivityId::new(), name, description, &spec);

        let id = self
            .coordinator
            .plan_and_commit(move |snapshot| plan::add_activity(snapshot, doc, expected))
            .await?;

        info!(activity = %id, name, duration = expected, "activity added");
        Ok(id)
    }

    /// Create a relationship between two complete activities.
    pub async fn add_relationship(
        &self,
        relationship_type: RelationshipType,
        predecessor: ActivityId,
        successor: ActivityId,
        lag: f64,
    ) -> Result<RelationshipId> {
        if predecessor == successor {
            return Err(ScheduleError::InvalidRelationship(format!(
                "activity {predecessor} cannot depend on itself"
            )));
        }
        if !lag.is_finite() {
            return Err(ScheduleError::Validation(format!(
                "lag must be a finite number, got {lag}"
            )));
        }

        let rel = Relationship {
            id: RelationshipId::new(),
            relationship_type,
            predecessor,
            successor,
            lag,
        };

        let id = self
            .coordinator
            .plan_and_commit(move |snapshot| plan::add_relationship(snapshot, rel))
            .await?;

        info!(
            relationship = %id,
            kind = %relationship_type,
            predecessor = %predecessor,
            successor = %successor,
            lag,
            "relationship added"
        );
        Ok(id)
    }

    /// Remove an activity and, in the same transaction, every relationship
    /// attached to it.
    pub async fn delete_activity(&self, id: ActivityId) -> Result<DeleteOutcome> {
        let outcome = self
            .coordinator
            .plan_and_commit(move |snapshot| plan::delete_activity(snapshot, id))
            .await?;

        info!(
            activity = %id,
            cascaded = outcome.removed_relationships.len(),
            "activity deleted"
        );
        Ok(outcome)
    }

    pub async fn delete_relationship(&self, id: RelationshipId) -> Result<()> {
        self.coordinator
            .plan_and_commit(move |snapshot| plan::delete_relationship(snapshot, id))
            .await?;

        info!(relationship = %id, "relationship deleted");
        Ok(())
    }

    /// Remove an activity while preserving precedence between its
    /// predecessors and successors.
    pub async fn dissolve_activity(&self, id: ActivityId) -> Result<DissolveOutcome> {
        let outcome = self
            .coordinator
            .plan_and_commit(move |snapshot| plan::dissolve_activity(snapshot, id))
            .await?;

        for rel in &outcome.created {
            debug!(
                relationship = %rel.id,
                kind = %rel.relationship_type,
                predecessor = %rel.predecessor,
                successor = %rel.successor,
                lag = rel.lag,
                "synthesised relationship"
            );
        }
        info!(
            activity = %id,
            removed = outcome.removed_relationships.len(),
            created = outcome.created.len(),
            "activity dissolved"
        );
        Ok(outcome)
    }

    /// Rebuild the derived graph from the topology store.
    pub async fn recompute(&self) -> Result<ScheduleGraph> {
        let snapshot = self.coordinator.snapshot().await?;
        Ok(ScheduleGraph::from_snapshot(&snapshot))
    }

    pub async fn critical_path(&self) -> Result<CriticalPath> {
        let path = self.recompute().await?.critical_path()?;
        info!(total = path.total, nodes = path.nodes.len(), "critical path");
        Ok(path)
    }

    /// Indexed activity documents.
    pub async fn activities(&self) -> Result<Vec<ActivityDoc>> {
        self.coordinator.activity_docs().await
    }

    /// Indexed relationship documents.
    pub async fn relationships(&self) -> Result<Vec<RelationshipDoc>> {
        self.coordinator.relationship_docs().await
    }

    pub async fn audit(&self) -> Result<AuditReport> {
        let (snapshot, activities, relationships) = self.coordinator.consistent_view().await?;
        let report = AuditReport::build(
            &snapshot,
            &activities,
            &relationships,
            self.coordinator.flagged(),
        );

        if report.is_clean() {
            info!("audit found no inconsistencies");
        } else {
            for finding in &report.findings {
                warn!(%finding, "audit finding");
            }
        }
        Ok(report)
    }

    pub async fn health(&self) -> StoreHealth {
        self.coordinator.health().await
    }

    /// Entities left flagged by failed rollbacks.
    pub fn flagged(&self) -> Vec<EntityId> {
        self.coordinator.flagged()
    }
}
