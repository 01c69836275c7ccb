// src/coordinator/mod.rs

//! Two-store transactions with compensating rollback.
//!
//! Every mutation goes through [`ConsistencyCoordinator`]:
//!
//! 1. take the exclusive section (one writer per schedule);
//! 2. load a topology snapshot and let the caller plan against it;
//! 3. apply the topology writes, then the semantic writes;
//! 4. on the first failure, undo everything applied so far in reverse order.
//!
//! If the undo itself fails, the entities involved are flagged and the error
//! is a [`ScheduleError::PartialCommit`]. There is no durable prepare log:
//! the guarantee is "all or flagged for repair", not two-phase commit.
//!
//! The transaction body runs in its own Tokio task. Dropping the caller's
//! future does not stop it once writes have begun.

pub mod writeset;

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, ScheduleError, StoreError, StoreKind};
use crate::model::{ActivityDoc, Entity, EntityId, RelationshipDoc, ScheduleModel};
use crate::store::{
    SemanticIndex, SemanticWrite, StoreResult, TopologySnapshot, TopologyStore, TopologyWrite,
};

pub use writeset::{SemanticWriteSet, TopologyWriteSet, Transaction};

/// Default per-call store timeout.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of pinging both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHealth {
    pub topology: bool,
    pub semantic: bool,
}

impl StoreHealth {
    pub fn all_up(&self) -> bool {
        self.topology && self.semantic
    }
}

struct Inner {
    topology: Arc<dyn TopologyStore>,
    semantic: Arc<dyn SemanticIndex>,
    timeout: Duration,
    /// Held exclusively for the whole of a commit, shared by readers.
    section: RwLock<()>,
    flagged: Mutex<BTreeSet<EntityId>>,
}

/// Owns the transaction lifecycle for one topology/semantic store pair.
///
/// Cheap to clone; clones share the same lock and flagged set.
#[derive(Clone)]
pub struct ConsistencyCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConsistencyCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistencyCoordinator")
            .field("timeout", &self.inner.timeout)
            .field("flagged", &self.flagged())
            .finish_non_exhaustive()
    }
}

impl ConsistencyCoordinator {
    pub fn new(
        topology: Arc<dyn TopologyStore>,
        semantic: Arc<dyn SemanticIndex>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                topology,
                semantic,
                timeout,
                section: RwLock::new(()),
                flagged: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Apply both write sets atomically (or flag `entities` for repair).
    pub async fn commit(
        &self,
        topology: TopologyWriteSet,
        semantic: SemanticWriteSet,
        entities: Vec<EntityId>,
    ) -> Result<()> {
        self.plan_and_commit(move |_| {
            Ok(Transaction {
                topology,
                semantic,
                entities,
                output: (),
            })
        })
        .await
    }

    /// Plan against a fresh snapshot and commit the result, all inside one
    /// exclusive section.
    ///
    /// Planner errors are returned before any store write.
    pub async fn plan_and_commit<T, F>(&self, planner: F) -> Result<T>
    where
        F: FnOnce(&TopologySnapshot) -> Result<Transaction<T>> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            let _exclusive = inner.section.write().await;
            let snapshot = inner.load_snapshot().await?;
            let tx = planner(&snapshot)?;
            inner
                .execute(snapshot, tx.topology, tx.semantic, tx.entities)
                .await?;
            Ok::<T, ScheduleError>(tx.output)
        });

        task.await
            .map_err(|e| ScheduleError::Other(anyhow!("transaction task failed: {e}")))?
    }

    /// Current topology, never observed mid-commit.
    pub async fn snapshot(&self) -> Result<TopologySnapshot> {
        let _shared = self.inner.section.read().await;
        Ok(self.inner.load_snapshot().await?)
    }

    /// Entity view of the current topology.
    pub async fn model(&self) -> Result<ScheduleModel> {
        Ok(ScheduleModel::from_snapshot(&self.snapshot().await?))
    }

    /// Resolve an id against topology, the ground truth for connectivity.
    pub async fn read(&self, id: EntityId) -> Result<Option<Entity>> {
        Ok(self.model().await?.entity(id))
    }

    /// Both stores' documents and topology, read under one shared section.
    pub async fn consistent_view(
        &self,
    ) -> Result<(TopologySnapshot, Vec<ActivityDoc>, Vec<RelationshipDoc>)> {
        let _shared = self.inner.section.read().await;
        let snapshot = self.inner.load_snapshot().await?;
        let activities = self
            .inner
            .timed(StoreKind::Semantic, "activity_docs", self.inner.semantic.activity_docs())
            .await?;
        let relationships = self
            .inner
            .timed(
                StoreKind::Semantic,
                "relationship_docs",
                self.inner.semantic.relationship_docs(),
            )
            .await?;
        Ok((snapshot, activities, relationships))
    }

    pub async fn activity_docs(&self) -> Result<Vec<ActivityDoc>> {
        let _shared = self.inner.section.read().await;
        Ok(self
            .inner
            .timed(StoreKind::Semantic, "activity_docs", self.inner.semantic.activity_docs())
            .await?)
    }

    pub async fn relationship_docs(&self) -> Result<Vec<RelationshipDoc>> {
        let _shared = self.inner.section.read().await;
        Ok(self
            .inner
            .timed(
                StoreKind::Semantic,
                "relationship_docs",
                self.inner.semantic.relationship_docs(),
            )
            .await?)
    }

    /// Ping both stores; a timed-out ping counts as down.
    pub async fn health(&self) -> StoreHealth {
        let timeout = self.inner.timeout;
        let topology = tokio::time::timeout(timeout, self.inner.topology.ping())
            .await
            .unwrap_or(false);
        let semantic = tokio::time::timeout(timeout, self.inner.semantic.ping())
            .await
            .unwrap_or(false);
        StoreHealth { topology, semantic }
    }

    /// Entities left inconsistent by a failed rollback, awaiting repair.
    pub fn flagged(&self) -> Vec<EntityId> {
        self.inner.flagged_set().iter().copied().collect()
    }

    /// Forget a flag once the entity was repaired out of band.
    pub fn clear_flag(&self, id: EntityId) -> bool {
        self.inner.flagged_set().remove(&id)
    }
}

impl Inner {
    fn flagged_set(&self) -> std::sync::MutexGuard<'_, BTreeSet<EntityId>> {
        self.flagged
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn timed<T>(
        &self,
        store: StoreKind,
        op: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                store,
                op,
                elapsed: self.timeout,
            }),
        }
    }

    async fn load_snapshot(&self) -> StoreResult<TopologySnapshot> {
        let (nodes, edges) = self
            .timed(StoreKind::Topology, "load_all", self.topology.load_all())
            .await?;
        Ok(TopologySnapshot::new(nodes, edges))
    }

    async fn apply_topology(&self, write: &TopologyWrite) -> StoreResult<()> {
        self.timed(
            StoreKind::Topology,
            write.op_name(),
            write.apply(self.topology.as_ref()),
        )
        .await
    }

    async fn apply_semantic(&self, write: &SemanticWrite) -> StoreResult<()> {
        self.timed(
            StoreKind::Semantic,
            write.op_name(),
            write.apply(self.semantic.as_ref()),
        )
        .await
    }

    /// Write restoring the document `write` is about to replace or remove.
    async fn semantic_inverse(&self, write: &SemanticWrite) -> StoreResult<Option<SemanticWrite>> {
        let semantic = self.semantic.as_ref();
        let undo = match write {
            SemanticWrite::UpsertActivity(doc) => Some(
                match self
                    .timed(StoreKind::Semantic, "activity_doc", semantic.activity_doc(doc.id))
                    .await?
                {
                    Some(prev) => SemanticWrite::UpsertActivity(prev),
                    None => SemanticWrite::DeleteActivity(doc.id),
                },
            ),
            SemanticWrite::DeleteActivity(id) => self
                .timed(StoreKind::Semantic, "activity_doc", semantic.activity_doc(*id))
                .await?
                .map(SemanticWrite::UpsertActivity),
            SemanticWrite::UpsertRelationship(doc) => Some(
                match self
                    .timed(
                        StoreKind::Semantic,
                        "relationship_doc",
                        semantic.relationship_doc(doc.id),
                    )
                    .await?
                {
                    Some(prev) => SemanticWrite::UpsertRelationship(prev),
                    None => SemanticWrite::DeleteRelationship(doc.id),
                },
            ),
            SemanticWrite::DeleteRelationship(id) => self
                .timed(
                    StoreKind::Semantic,
                    "relationship_doc",
                    semantic.relationship_doc(*id),
                )
                .await?
                .map(SemanticWrite::UpsertRelationship),
        };
        Ok(undo)
    }

    async fn execute(
        &self,
        snapshot: TopologySnapshot,
        topology: TopologyWriteSet,
        semantic: SemanticWriteSet,
        entities: Vec<EntityId>,
    ) -> Result<()> {
        if topology.is_empty() && semantic.is_empty() {
            debug!("empty transaction; nothing to commit");
            return Ok(());
        }

        debug!(
            topology_writes = topology.len(),
            semantic_writes = semantic.len(),
            entities = entities.len(),
            "committing transaction"
        );

        // Inverses are computed before each write. A failed write's own
        // inverse is only replayed when its outcome is unknown (timeout).
        let mut state = snapshot;
        let mut undo_topology: Vec<Vec<TopologyWrite>> = Vec::with_capacity(topology.len());

        for write in topology.iter() {
            let inverse = state.inverse_of(write);
            if let Err(cause) = self.apply_topology(write).await {
                warn!(op = write.op_name(), error = %cause, "topology write failed; rolling back");
                if cause.outcome_unknown() {
                    undo_topology.push(inverse);
                }
                return self
                    .roll_back(cause, Vec::new(), undo_topology, entities)
                    .await;
            }
            undo_topology.push(inverse);
            state.apply(write);
        }

        let mut undo_semantic: Vec<SemanticWrite> = Vec::with_capacity(semantic.len());

        for write in semantic.iter() {
            let inverse = match self.semantic_inverse(write).await {
                Ok(inverse) => inverse,
                Err(cause) => {
                    warn!(op = write.op_name(), error = %cause, "semantic pre-read failed; rolling back");
                    return self
                        .roll_back(cause, undo_semantic, undo_topology, entities)
                        .await;
                }
            };
            if let Err(cause) = self.apply_semantic(write).await {
                warn!(op = write.op_name(), error = %cause, "semantic write failed; rolling back");
                if cause.outcome_unknown() {
                    undo_semantic.extend(inverse);
                }
                return self
                    .roll_back(cause, undo_semantic, undo_topology, entities)
                    .await;
            }
            undo_semantic.extend(inverse);
        }

        info!(
            topology_writes = topology.len(),
            semantic_writes = semantic.len(),
            "transaction committed"
        );
        Ok(())
    }

    /// Best-effort undo: every inverse is attempted even after one fails.
    async fn roll_back(
        &self,
        cause: StoreError,
        undo_semantic: Vec<SemanticWrite>,
        undo_topology: Vec<Vec<TopologyWrite>>,
        entities: Vec<EntityId>,
    ) -> Result<()> {
        let mut failures = Vec::new();

        for write in undo_semantic.iter().rev() {
            if let Err(e) = self.apply_semantic(write).await {
                error!(op = write.op_name(), error = %e, "semantic rollback step failed");
                failures.push(e);
            }
        }

        for group in undo_topology.iter().rev() {
            for write in group {
                if let Err(e) = self.apply_topology(write).await {
                    error!(op = write.op_name(), error = %e, "topology rollback step failed");
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            warn!(?entities, error = %cause, "transaction rolled back cleanly");
            return Err(ScheduleError::Commit {
                entities,
                source: cause,
            });
        }

        {
            let mut flagged = self.flagged_set();
            flagged.extend(entities.iter().copied());
        }
        error!(
            ?entities,
            error = %cause,
            failed_steps = failures.len(),
            "rollback incomplete; entities flagged for repair"
        );

        Err(ScheduleError::PartialCommit {
            entities,
            cause,
            rollback_failures: failures,
        })
    }
}
