// tests/critical_path.rs

mod common;
use crate::common::builders::Fixture;
use crate::common::faulty::FaultyTopologyStore;
use crate::common::init_tracing;

use std::error::Error;

use schedgraph::errors::ScheduleError;
use schedgraph::model::{NodeKey, RelationshipType};
use schedgraph::store::{TopologyEdge, TopologyNode};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn three_activity_chain_has_total_six() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let ids = fx.chain(&[1.0, 2.0, 3.0]).await;

    let path = fx.engine.critical_path().await?;

    assert_eq!(path.total, 6.0);
    let expected: Vec<NodeKey> = ids
        .iter()
        .flat_map(|id| [NodeKey::Start(*id), NodeKey::Intra(*id), NodeKey::End(*id)])
        .collect();
    assert_eq!(path.sub_nodes(), expected);
    assert_eq!(path.sub_nodes().len(), 9);
    assert_eq!(path.activities(), ids);
    Ok(())
}

#[tokio::test]
async fn lags_count_towards_the_total() -> TestResult {
    init_tracing();
    let fx = Fixture::new();
    let a = fx.activity("A", 2.0).await;
    let b = fx.activity("B", 2.0).await;
    let c = fx.activity("C", 1.0).await;

    fx.relate(RelationshipType::FS, a, b, 1.5).await;
    fx.relate(RelationshipType::FS, a, c, 0.0).await;

    let path = fx.engine.critical_path().await?;
    assert_eq!(path.total, 5.5);
    assert_eq!(path.activities(), vec![a, b]);
    Ok(())
}

#[tokio::test]
async fn empty_schedule_has_empty_path() -> TestResult {
    init_tracing();
    let fx = Fixture::new();

    let path = fx.engine.critical_path().await?;
    assert!(path.is_empty());
    assert_eq!(path.total, 0.0);
    Ok(())
}

#[tokio::test]
async fn injected_cycle_is_reported() -> TestResult {
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
        vec![node("x"), node("y"), node("z")],
        vec![edge("x", "y"), edge("y", "z"), edge("z", "x")],
    );
    let fx = Fixture::with_topology(store);

    match fx.engine.critical_path().await {
        Err(ScheduleError::Cycle(msg)) => assert!(msg.contains("cycle")),
        other => panic!("Expected Cycle error, got: {other:?}"),
    }

    let graph = fx.engine.recompute().await?;
    assert!(!graph.is_acyclic());
    assert_eq!(graph.node_count(), 3);
    Ok(())
}
