// tests/relationships.rs

mod common;
use crate::common::builders::Fixture;
use crate::common::faulty::FaultyTopologyStore;
use crate::common::init_tracing;

use std::error::Error;

use schedgraph::errors::ScheduleError;
use schedgraph::model::{ActivityId, EntityId, NodeKey, RelationshipId, RelationshipType};
use schedgraph::store::{TopologyEdge, TopologyNode};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn each_type_connects_the_expected_anchors() -> TestResult {
    init_tracing();

    let cases = [
        (RelationshipType::FS, "e", "s"),
        (RelationshipType::SS, "s", "s"),
        (RelationshipType::FF, "e", "e"),
        (RelationshipType::SF, "s", "e"),
    ];

    for (ty, from_prefix, to_prefix) in cases {
        let fx = Fixture::new();
        let a = fx.activity("A", 2.0).await;
        let b = fx.activity("B", 3.0).await;

        let rel = fx.engine.add_relationship(ty, a, b, 1.5).await?;

        let snapshot = fx.snapshot().await;
        let node = NodeKey::Relationship(rel).to_string();
        let source = format!("{from_prefix}-{a}");
        let target = format!("{to_prefix}-{b}");

        assert_eq!(snapshot.weight(&node), Some(1.5), "lag on node for {ty}");
        assert!(snapshot.contains_edge(&source, &node), "{ty}: {source} -> node");
        assert!(snapshot.contains_edge(&node, &target), "{ty}: node -> {target}");
        assert_eq!(snapshot.edges_touching(&node).count(), 2);

        let model = fx.model().await;
        let decoded = model.relationship(rel).ok_or("relationship not decoded")?;
        assert_eq!(decoded.relationship_type, ty);
        assert_eq!(decoded.predecessor, a);
        assert_eq!(decoded.successor, b);

        let docs = fx.engine.relationships().await?;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].relationship_type, ty);
        assert_eq!(docs[0].lag, 1.5);
    }
    Ok(())
}

#[tokio::test]
async fn negative_lag_is_a_lead() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 2.0).await;
    let b = fx.activity("B", 3.0).await;

    let rel = fx.engine.add_relationship(RelationshipType::FS, a, b, -1.0).await?;

    let model = fx.model().await;
    assert_eq!(model.relationship(rel).map(|r| r.lag), Some(-1.0));
    Ok(())
}

#[tokio::test]
async fn self_reference_is_invalid() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 1.0).await;

    match fx.engine.add_relationship(RelationshipType::FS, a, a, 0.0).await {
        Err(ScheduleError::InvalidRelationship(_)) => {}
        other => panic!("Expected InvalidRelationship, got: {other:?}"),
    }
    assert_eq!(fx.snapshot().await.node_count(), 3);
    Ok(())
}

#[tokio::test]
async fn non_finite_lag_is_a_validation_error() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 1.0).await;
    let b = fx.activity("B", 1.0).await;

    for lag in [f64::NAN, f64::INFINITY] {
        match fx.engine.add_relationship(RelationshipType::FS, a, b, lag).await {
            Err(ScheduleError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn unknown_endpoint_is_a_dangling_reference() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 1.0).await;
    let ghost = ActivityId::new();

    match fx.engine.add_relationship(RelationshipType::FS, a, ghost, 0.0).await {
        Err(ScheduleError::DanglingReference(EntityId::Activity(id))) => assert_eq!(id, ghost),
        other => panic!("Expected DanglingReference, got: {other:?}"),
    }

    let snapshot = fx.snapshot().await;
    assert_eq!(snapshot.node_count(), 3);
    assert_eq!(snapshot.edge_count(), 2);
    assert!(fx.engine.relationships().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn relationship_closing_a_cycle_is_rejected() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let ids = fx.chain(&[1.0, 1.0, 1.0]).await;
    let before = fx.snapshot().await;

    match fx
        .engine
        .add_relationship(RelationshipType::FS, ids[2], ids[0], 0.0)
        .await
    {
        Err(ScheduleError::InvalidRelationship(msg)) => assert!(msg.contains("cycle")),
        other => panic!("Expected InvalidRelationship, got: {other:?}"),
    }
    assert_eq!(fx.snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn unrelated_cycle_does_not_block_new_relationships() -> TestResult {
    init_tracing();

    let node = |id: &str| TopologyNode {
        id: id.to_string(),
        weight: 1.0,
    };
    let edge = |from: &str, to: &str| TopologyEdge {
        from: from.to_string(),
        to: to.to_string(),
    };
    let store = FaultyTopologyStore::seeded(
        vec![node("x"), node("y")],
        vec![edge("x", "y"), edge("y", "x")],
    );
    let fx = Fixture::with_topology(store);
    let a = fx.activity("A", 1.0).await;
    let b = fx.activity("B", 1.0).await;

    let rel = fx.relate(RelationshipType::FS, a, b, 0.0).await;
    assert!(fx.model().await.relationship(rel).is_some());

    match fx.engine.add_relationship(RelationshipType::SS, b, a, 0.0).await {
        Err(ScheduleError::InvalidRelationship(msg)) => assert!(msg.contains("cycle")),
        other => panic!("Expected InvalidRelationship, got: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn delete_relationship_removes_node_edges_and_doc() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 1.0).await;
    let b = fx.activity("B", 1.0).await;
    let before = fx.snapshot().await;

    let rel = fx.relate(RelationshipType::FF, a, b, 2.0).await;
    fx.engine.delete_relationship(rel).await?;

    assert_eq!(fx.snapshot().await, before);
    assert!(fx.engine.relationships().await?.is_empty());

    match fx.engine.delete_relationship(rel).await {
        Err(ScheduleError::NotFound(EntityId::Relationship(id))) => assert_eq!(id, rel),
        other => panic!("Expected NotFound, got: {other:?}"),
    }
    match fx.engine.delete_relationship(RelationshipId::new()).await {
        Err(ScheduleError::NotFound(_)) => {}
        other => panic!("Expected NotFound, got: {other:?}"),
    }
    Ok(())
}
