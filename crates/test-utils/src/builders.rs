#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use schedgraph::engine::TopologyEngine;
use schedgraph::model::{ActivityId, RelationshipId, RelationshipType, ScheduleModel};
use schedgraph::store::TopologySnapshot;

use crate::faulty::{FaultySemanticIndex, FaultyTopologyStore};

/// Store timeout used by fixtures; short so that hang faults resolve fast.
pub const TEST_STORE_TIMEOUT: Duration = Duration::from_millis(200);

/// An engine over fault-injecting in-memory stores.
pub struct Fixture {
    pub engine: TopologyEngine,
    pub topology: Arc<FaultyTopologyStore>,
    pub semantic: Arc<FaultySemanticIndex>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_topology(FaultyTopologyStore::new())
    }

    /// Start from a pre-seeded topology store.
    pub fn with_topology(topology: FaultyTopologyStore) -> Self {
        let topology = Arc::new(topology);
        let semantic = Arc::new(FaultySemanticIndex::new());
        let engine = TopologyEngine::with_stores(
            topology.clone(),
            semantic.clone(),
            TEST_STORE_TIMEOUT,
        );
        Self {
            engine,
            topology,
            semantic,
        }
    }

    /// Add an activity with a fixed duration.
    pub async fn activity(&self, name: &str, duration: f64) -> ActivityId {
        self.engine
            .add_activity(name, "", &duration.to_string())
            .await
            .expect("Failed to add activity in fixture")
    }

    pub async fn relate(
        &self,
        relationship_type: RelationshipType,
        predecessor: ActivityId,
        successor: ActivityId,
        lag: f64,
    ) -> RelationshipId {
        self.engine
            .add_relationship(relationship_type, predecessor, successor, lag)
            .await
            .expect("Failed to add relationship in fixture")
    }

    /// Activities with the given durations joined FS with zero lag, in order.
    pub async fn chain(&self, durations: &[f64]) -> Vec<ActivityId> {
        let mut ids = Vec::with_capacity(durations.len());
        for (i, d) in durations.iter().enumerate() {
            let id = self.activity(&format!("step {i}"), *d).await;
            if let Some(prev) = ids.last() {
                self.relate(RelationshipType::FS, *prev, id, 0.0).await;
            }
            ids.push(id);
        }
        ids
    }

    pub async fn snapshot(&self) -> TopologySnapshot {
        self.engine
            .coordinator()
            .snapshot()
            .await
            .expect("Failed to load snapshot in fixture")
    }

    pub async fn model(&self) -> ScheduleModel {
        ScheduleModel::from_snapshot(&self.snapshot().await)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
