// tests/file_store.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use schedgraph::config::{ConfigFile, RawConfigFile};
use schedgraph::engine::TopologyEngine;
use schedgraph::errors::{ScheduleError, StoreError, StoreKind};
use schedgraph::fs::{FileSystem, MockFileSystem};
use schedgraph::model::RelationshipType;
use schedgraph::open_engine;
use schedgraph::store::{FileSemanticIndex, FileTopologyStore, SemanticIndex};

type TestResult = Result<(), Box<dyn Error>>;

const TOPOLOGY: &str = "/project/.schedgraph/topology.json";
const SEMANTIC: &str = "/project/.schedgraph/semantic.json";

fn engine_on(fs: &MockFileSystem) -> TopologyEngine {
    TopologyEngine::with_stores(
        Arc::new(FileTopologyStore::new(fs.clone(), TOPOLOGY)),
        Arc::new(FileSemanticIndex::new(fs.clone(), SEMANTIC)),
        Duration::from_secs(1),
    )
}

#[tokio::test]
async fn state_survives_reopening_the_stores() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();

    let (a, b) = {
        let engine = engine_on(&fs);
        let a = engine.add_activity("Excavate", "site prep", "3").await?;
        let b = engine.add_activity("Foundations", "", "pert(2,4,12)").await?;
        engine
            .add_relationship(RelationshipType::FS, a, b, 1.0)
            .await?;
        (a, b)
    };

    assert!(fs.contents(TOPOLOGY).is_some_and(|s| s.contains(&a.to_string())));
    assert!(fs.contents(SEMANTIC).is_some_and(|s| s.contains("Excavate")));

    let reopened = engine_on(&fs);
    let path = reopened.critical_path().await?;
    assert_eq!(path.activities(), vec![a, b]);
    assert_eq!(path.total, 3.0 + 1.0 + 5.0);
    assert_eq!(reopened.activities().await?.len(), 2);
    assert_eq!(reopened.relationships().await?.len(), 1);
    assert!(reopened.audit().await?.is_clean());
    Ok(())
}

/// Blocks the calling thread on its first write, like a stalled disk.
#[derive(Debug, Clone, Default)]
struct StallingFileSystem {
    inner: MockFileSystem,
    stalled: Arc<AtomicBool>,
}

impl FileSystem for StallingFileSystem {
    fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(600));
        }
        self.inner.write(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
}

#[tokio::test]
async fn stalled_disk_write_times_out_and_is_undone() -> TestResult {
    init_tracing();
    let fs = StallingFileSystem::default();
    let engine = TopologyEngine::with_stores(
        Arc::new(FileTopologyStore::new(fs.clone(), TOPOLOGY)),
        Arc::new(FileSemanticIndex::new(MockFileSystem::new(), SEMANTIC)),
        Duration::from_millis(400),
    );

    match engine.add_activity("A", "", "1").await {
        Err(ScheduleError::Commit {
            source: StoreError::Timeout { store, op, .. },
            ..
        }) => {
            assert_eq!(store, StoreKind::Topology);
            assert_eq!(op, "upsert_node");
        }
        other => panic!("Expected timeout Commit error, got: {other:?}"),
    }

    assert!(engine.flagged().is_empty());
    assert_eq!(engine.coordinator().snapshot().await?.node_count(), 0);
    Ok(())
}

#[tokio::test]
async fn corrupted_topology_file_is_a_store_error() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file(TOPOLOGY, "{ not json");
    let engine = engine_on(&fs);

    assert!(!engine.health().await.topology);
    match engine.critical_path().await {
        Err(ScheduleError::Store(StoreError::Serde(_))) => {}
        other => panic!("Expected Serde store error, got: {other:?}"),
    }
    match engine.add_activity("A", "", "1").await {
        Err(ScheduleError::Store(_)) => {}
        other => panic!("Expected Store error, got: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn query_ranks_documents_by_overlap() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let engine = engine_on(&fs);
    let pour = engine.add_activity("Pour concrete", "slab and footings", "2").await?;
    let paint = engine.add_activity("Paint walls", "interior", "1").await?;

    let index = FileSemanticIndex::new(fs.clone(), SEMANTIC);
    let hits = index.query("concrete slab", 5).await?;
    assert_eq!(hits, vec![pour.to_string()]);

    let hits = index.query("walls concrete", 5).await?;
    assert_eq!(hits.len(), 2);
    assert!(hits.contains(&paint.to_string()));
    assert!(index.query("", 5).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn open_engine_resolves_paths_against_the_root() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let cfg = ConfigFile::try_from(RawConfigFile::default())?;

    let engine = open_engine(&cfg, dir.path());
    let id = engine.add_activity("Roof", "", "uniform(2,4)").await?;

    let topology = dir.path().join(".schedgraph/topology.json");
    let semantic = dir.path().join(".schedgraph/semantic.json");
    assert!(Path::new(&topology).exists());
    assert!(std::fs::read_to_string(&semantic)?.contains(&id.to_string()));

    let again = open_engine(&cfg, dir.path());
    assert_eq!(again.critical_path().await?.total, 3.0);
    Ok(())
}
