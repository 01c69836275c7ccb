//! Store wrappers that fail on demand.
//!
//! Both wrappers delegate to the in-memory stores and consult a shared
//! [`FaultInjector`] before every call. Rules are keyed by operation name
//! (`"upsert_node"`, `"upsert_activity_doc"`, ...).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use schedgraph::errors::{StoreError, StoreKind};
use schedgraph::model::{ActivityDoc, ActivityId, RelationshipDoc, RelationshipId};
use schedgraph::store::{
    InMemorySemanticIndex, InMemoryTopologyStore, SemanticIndex, StoreResult, TopologyEdge,
    TopologyNode, TopologyStore,
};

/// What happens when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Return an error without touching the inner store.
    Fail,
    /// Apply the call, then report a timeout as if the reply was lost.
    LostAck,
    /// Never answer; the coordinator's timeout fires.
    Hang,
    /// Answer normally after a pause.
    Delay(Duration),
}

#[derive(Debug, Clone)]
struct Rule {
    op: &'static str,
    skip: usize,
    remaining: usize,
    fault: Fault,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    calls: HashMap<&'static str, usize>,
}

#[derive(Debug)]
pub struct FaultInjector {
    store: StoreKind,
    state: Mutex<State>,
}

impl FaultInjector {
    pub fn new(store: StoreKind) -> Self {
        Self {
            store,
            state: Mutex::new(State::default()),
        }
    }

    /// Let `skip` calls to `op` through, then inject `fault` into the next
    /// `times` calls.
    pub fn inject(&self, op: &'static str, skip: usize, times: usize, fault: Fault) {
        self.lock().rules.push(Rule {
            op,
            skip,
            remaining: times,
            fault,
        });
    }

    /// Fail every call to `op` from now on.
    pub fn fail_always(&self, op: &'static str) {
        self.inject(op, 0, usize::MAX, Fault::Fail);
    }

    /// Fail only the next call to `op`.
    pub fn fail_next(&self, op: &'static str) {
        self.inject(op, 0, 1, Fault::Fail);
    }

    /// Drop every rule.
    pub fn heal(&self) {
        self.lock().rules.clear();
    }

    /// Calls seen for `op`, faulted or not.
    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn check(&self, op: &'static str) -> Option<Fault> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;

        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.op == op && r.remaining > 0)?;
        if rule.skip > 0 {
            rule.skip -= 1;
            return None;
        }
        rule.remaining -= 1;
        Some(rule.fault)
    }

    async fn guard<T, Fut>(&self, op: &'static str, call: Fut) -> StoreResult<T>
    where
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        match self.check(op) {
            None => call.await,
            Some(Fault::Fail) => Err(injected(op)),
            Some(Fault::LostAck) => {
                call.await?;
                Err(StoreError::Timeout {
                    store: self.store,
                    op,
                    elapsed: Duration::ZERO,
                })
            }
            Some(Fault::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                call.await
            }
            Some(Fault::Delay(pause)) => {
                tokio::time::sleep(pause).await;
                call.await
            }
        }
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Rejected(format!("injected failure in {op}"))
}

/// In-memory topology store with fault injection.
#[derive(Debug)]
pub struct FaultyTopologyStore {
    inner: InMemoryTopologyStore,
    pub faults: FaultInjector,
}

impl FaultyTopologyStore {
    pub fn new() -> Self {
        Self::seeded(Vec::new(), Vec::new())
    }

    /// Seed raw nodes and edges, bypassing the engine.
    pub fn seeded(nodes: Vec<TopologyNode>, edges: Vec<TopologyEdge>) -> Self {
        Self {
            inner: InMemoryTopologyStore::from_parts(nodes, edges),
            faults: FaultInjector::new(StoreKind::Topology),
        }
    }
}

impl Default for FaultyTopologyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopologyStore for FaultyTopologyStore {
    async fn upsert_node(&self, id: &str, weight: f64) -> StoreResult<()> {
        self.faults
            .guard("upsert_node", self.inner.upsert_node(id, weight))
            .await
    }

    async fn delete_node(&self, id: &str) -> StoreResult<()> {
        self.faults
            .guard("delete_node", self.inner.delete_node(id))
            .await
    }

    async fn upsert_edge(&self, from: &str, to: &str) -> StoreResult<()> {
        self.faults
            .guard("upsert_edge", self.inner.upsert_edge(from, to))
            .await
    }

    async fn delete_edge(&self, from: &str, to: &str) -> StoreResult<()> {
        self.faults
            .guard("delete_edge", self.inner.delete_edge(from, to))
            .await
    }

    async fn load_all(&self) -> StoreResult<(Vec<TopologyNode>, Vec<TopologyEdge>)> {
        self.faults.guard("load_all", self.inner.load_all()).await
    }

    async fn ping(&self) -> bool {
        self.faults.check("ping").is_none() && self.inner.ping().await
    }
}

/// In-memory semantic index with fault injection.
#[derive(Debug)]
pub struct FaultySemanticIndex {
    inner: InMemorySemanticIndex,
    pub faults: FaultInjector,
}

impl FaultySemanticIndex {
    pub fn new() -> Self {
        Self {
            inner: InMemorySemanticIndex::default(),
            faults: FaultInjector::new(StoreKind::Semantic),
        }
    }
}

impl Default for FaultySemanticIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SemanticIndex for FaultySemanticIndex {
    async fn upsert_activity_doc(&self, doc: &ActivityDoc) -> StoreResult<()> {
        self.faults
            .guard("upsert_activity_doc", self.inner.upsert_activity_doc(doc))
            .await
    }

    async fn delete_activity_doc(&self, id: ActivityId) -> StoreResult<()> {
        self.faults
            .guard("delete_activity_doc", self.inner.delete_activity_doc(id))
            .await
    }

    async fn upsert_relationship_doc(&self, doc: &RelationshipDoc) -> StoreResult<()> {
        self.faults
            .guard(
                "upsert_relationship_doc",
                self.inner.upsert_relationship_doc(doc),
            )
            .await
    }

    async fn delete_relationship_doc(&self, id: RelationshipId) -> StoreResult<()> {
        self.faults
            .guard(
                "delete_relationship_doc",
                self.inner.delete_relationship_doc(id),
            )
            .await
    }

    async fn activity_doc(&self, id: ActivityId) -> StoreResult<Option<ActivityDoc>> {
        self.faults
            .guard("activity_doc", self.inner.activity_doc(id))
            .await
    }

    async fn relationship_doc(&self, id: RelationshipId) -> StoreResult<Option<RelationshipDoc>> {
        self.faults
            .guard("relationship_doc", self.inner.relationship_doc(id))
            .await
    }

    async fn activity_docs(&self) -> StoreResult<Vec<ActivityDoc>> {
        self.faults
            .guard("activity_docs", self.inner.activity_docs())
            .await
    }

    async fn relationship_docs(&self) -> StoreResult<Vec<RelationshipDoc>> {
        self.faults
            .guard("relationship_docs", self.inner.relationship_docs())
            .await
    }

    async fn query(&self, text: &str, k: usize) -> StoreResult<Vec<String>> {
        self.faults.guard("query", self.inner.query(text, k)).await
    }

    async fn ping(&self) -> bool {
        self.faults.check("ping").is_none() && self.inner.ping().await
    }
}
