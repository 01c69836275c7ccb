// tests/activity_lifecycle.rs

mod common;
use crate::common::builders::Fixture;
use crate::common::init_tracing;

use std::error::Error;

use schedgraph::errors::ScheduleError;
use schedgraph::model::{ActivityId, EntityId, NodeKey, RelationshipType};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn add_activity_writes_three_nodes_two_edges_and_one_doc() -> TestResult {
    init_tracing();
    let fx = Fixture::new();

    let id = fx.engine.add_activity("Pour slab", "ground floor", "4").await?;

    let snapshot = fx.snapshot().await;
    assert_eq!(snapshot.node_count(), 3);
    assert_eq!(snapshot.edge_count(), 2);

    let (s, i, e) = (
        NodeKey::Start(id).to_string(),
        NodeKey::Intra(id).to_string(),
        NodeKey::End(id).to_string(),
    );
    assert_eq!(snapshot.weight(&s), Some(0.0));
    assert_eq!(snapshot.weight(&i), Some(4.0));
    assert_eq!(snapshot.weight(&e), Some(0.0));
    assert!(snapshot.contains_edge(&s, &i));
    assert!(snapshot.contains_edge(&i, &e));

    let docs = fx.engine.activities().await?;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, id);
    assert_eq!(docs[0].name, "Pour slab");
    assert_eq!(docs[0].duration, "4");
    Ok(())
}

#[tokio::test]
async fn distribution_duration_stores_expected_value_on_intra_node() -> TestResult {
    init_tracing();
    let fx = Fixture::new();

    let id = fx.engine.add_activity("Survey", "", "tri(1, 4, 7)").await?;

    let snapshot = fx.snapshot().await;
    assert_eq!(snapshot.weight(&NodeKey::Intra(id).to_string()), Some(4.0));
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_store_call() -> TestResult {
    init_tracing();
    let fx = Fixture::new();

    for (name, duration) in [("", "3"), ("ok", "-1"), ("ok", "soon"), ("ok", "tri(5,1,2)")] {
        match fx.engine.add_activity(name, "", duration).await {
            Err(ScheduleError::Validation(_)) => {}
            other => panic!("Expected Validation error for ({name:?}, {duration:?}), got: {other:?}"),
        }
    }

    assert_eq!(fx.topology.faults.calls("load_all"), 0);
    assert_eq!(fx.topology.faults.calls("upsert_node"), 0);
    assert_eq!(fx.semantic.faults.calls("upsert_activity_doc"), 0);
    Ok(())
}

#[tokio::test]
async fn delete_cascades_to_incident_relationships() -> TestResult {
    init_tracing();
    let fx = Fixture::new();

    let ids = fx.chain(&[1.0, 2.0, 3.0]).await;
    let extra = fx.activity("side", 1.0).await;
    fx.relate(RelationshipType::SS, ids[1], extra, 0.5).await;

    let outcome = fx.engine.delete_activity(ids[1]).await?;
    assert_eq!(outcome.activity, ids[1]);
    assert_eq!(outcome.removed_relationships.len(), 3);

    let model = fx.model().await;
    assert!(model.activity(ids[1]).is_none());
    assert_eq!(model.relationships().count(), 0);
    assert!(model.issues().is_empty());

    let snapshot = fx.snapshot().await;
    assert_eq!(snapshot.node_count(), 9);
    assert_eq!(snapshot.edge_count(), 6);
    assert!(fx.engine.relationships().await?.is_empty());
    assert_eq!(fx.engine.activities().await?.len(), 3);

    assert!(
        fx.engine
            .coordinator()
            .read(EntityId::Activity(ids[1]))
            .await?
            .is_none()
    );
    match fx.engine.delete_activity(ids[1]).await {
        Err(ScheduleError::NotFound(EntityId::Activity(id))) => assert_eq!(id, ids[1]),
        other => panic!("Expected NotFound, got: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn deleting_unknown_activity_is_not_found() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let ghost = ActivityId::new();

    match fx.engine.delete_activity(ghost).await {
        Err(ScheduleError::NotFound(EntityId::Activity(id))) => assert_eq!(id, ghost),
        other => panic!("Expected NotFound, got: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn add_then_delete_restores_exact_prior_state() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    fx.chain(&[2.0, 5.0]).await;

    let before = fx.snapshot().await;
    let docs_before = fx.engine.activities().await?;
    let rels_before = fx.engine.relationships().await?;

    let id = fx.activity("temporary", 3.0).await;
    fx.engine.delete_activity(id).await?;

    assert_eq!(fx.snapshot().await, before);
    assert_eq!(fx.engine.activities().await?, docs_before);
    assert_eq!(fx.engine.relationships().await?, rels_before);
    Ok(())
}
