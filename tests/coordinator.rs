// tests/coordinator.rs

mod common;
use crate::common::builders::Fixture;
use crate::common::init_tracing;

use std::error::Error;

use schedgraph::coordinator::{SemanticWriteSet, TopologyWriteSet};
use schedgraph::engine::AuditFinding;
use schedgraph::model::{
    ActivityDoc, ActivityId, DurationSpec, Entity, EntityId, RelationshipType,
};
use schedgraph::store::{SemanticIndex, SemanticWrite, TopologyWrite};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn concurrent_mutations_are_serialised() -> TestResult {
    init_tracing();
    let fx = Fixture::new();

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = fx.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.add_activity(&format!("job {i}"), "", "1").await
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }

    let model = fx.model().await;
    assert_eq!(model.activities().filter(|a| a.is_complete()).count(), 16);
    assert_eq!(fx.engine.activities().await?.len(), 16);

    let mut links = Vec::new();
    for pair in ids.windows(2) {
        let engine = fx.engine.clone();
        let (a, b) = (pair[0], pair[1]);
        links.push(tokio::spawn(async move {
            engine.add_relationship(RelationshipType::FS, a, b, 0.0).await
        }));
    }
    for link in links {
        link.await??;
    }

    let path = fx.engine.critical_path().await?;
    assert_eq!(path.total, 16.0);
    assert!(fx.engine.audit().await?.is_clean());
    Ok(())
}

#[tokio::test]
async fn read_answers_from_topology() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 2.0).await;
    let b = fx.activity("B", 1.0).await;
    let rel = fx.relate(RelationshipType::SF, a, b, 0.0).await;

    match fx.engine.coordinator().read(EntityId::Activity(a)).await? {
        Some(Entity::Activity(act)) => {
            assert!(act.is_complete());
            assert_eq!(act.duration(), Some(2.0));
        }
        other => panic!("Expected activity, got: {other:?}"),
    }
    match fx.engine.coordinator().read(EntityId::Relationship(rel)).await? {
        Some(Entity::Relationship(r)) => assert_eq!(r.relationship_type, RelationshipType::SF),
        other => panic!("Expected relationship, got: {other:?}"),
    }

    // A document alone does not make an entity exist.
    let orphan = ActivityId::new();
    let spec: DurationSpec = "3".parse()?;
    fx.semantic
        .upsert_activity_doc(&ActivityDoc::new(orphan, "ghost", "", &spec))
        .await?;
    assert!(fx
        .engine
        .coordinator()
        .read(EntityId::Activity(orphan))
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn raw_commit_applies_both_write_sets() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let id = ActivityId::new();
    let spec: DurationSpec = "normal(4, 1)".parse()?;

    let topology: TopologyWriteSet = [
        TopologyWrite::upsert_node(format!("s-{id}"), 0.0),
        TopologyWrite::upsert_node(format!("i-{id}"), spec.expected()),
        TopologyWrite::upsert_node(format!("e-{id}"), 0.0),
        TopologyWrite::upsert_edge(format!("s-{id}"), format!("i-{id}")),
        TopologyWrite::upsert_edge(format!("i-{id}"), format!("e-{id}")),
    ]
    .into_iter()
    .collect();
    let mut semantic = SemanticWriteSet::new();
    semantic.push(SemanticWrite::UpsertActivity(ActivityDoc::new(
        id, "manual", "", &spec,
    )));

    fx.engine
        .coordinator()
        .commit(topology, semantic, vec![EntityId::Activity(id)])
        .await?;

    let model = fx.model().await;
    assert_eq!(
        model.complete_activity(id).and_then(|a| a.duration()),
        Some(4.0)
    );
    assert!(fx.engine.audit().await?.is_clean());
    Ok(())
}

#[tokio::test]
async fn audit_reports_documents_without_topology() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 1.0).await;

    let orphan = ActivityId::new();
    let spec: DurationSpec = "1".parse()?;
    fx.semantic
        .upsert_activity_doc(&ActivityDoc::new(orphan, "orphan", "", &spec))
        .await?;
    fx.semantic.delete_activity_doc(a).await?;

    let report = fx.engine.audit().await?;
    assert!(report.findings.contains(&AuditFinding::ActivityWithoutTopology(orphan)));
    assert!(report.findings.contains(&AuditFinding::ActivityWithoutDoc(a)));
    assert_eq!(report.findings.len(), 2);
    Ok(())
}
