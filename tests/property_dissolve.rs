// tests/property_dissolve.rs

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use schedgraph::dag::ScheduleGraph;
use schedgraph::engine::compose;
use schedgraph::model::{NodeKey, RelationshipType};
use schedgraph_test_utils::builders::Fixture;

#[derive(Debug, Clone)]
struct Schedule {
    durations: Vec<f64>,
    /// (from, to, type index, lag) with from < to, so the schedule is acyclic.
    links: Vec<(usize, usize, usize, f64)>,
    target: usize,
}

fn schedule_strategy() -> impl Strategy<Value = Schedule> {
    (3..7usize).prop_flat_map(|n| {
        let durations = proptest::collection::vec(0.0..10.0f64, n);
        let links = proptest::collection::vec(
            (0..n, 0..n, 0..4usize, -2.0..5.0f64),
            0..(n * 2),
        );
        (durations, links, 0..n).prop_map(|(durations, raw, target)| Schedule {
            durations,
            links: raw
                .into_iter()
                .filter(|(a, b, _, _)| a != b)
                .map(|(a, b, t, lag)| (a.min(b), a.max(b), t, lag))
                .collect(),
            target,
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn dissolve_preserves_precedence_and_leaves_no_trace(schedule in schedule_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let fx = Fixture::new();
            let mut ids = Vec::new();
            for (i, d) in schedule.durations.iter().enumerate() {
                ids.push(fx.activity(&format!("a{i}"), *d).await);
            }
            for (from, to, t, lag) in &schedule.links {
                fx.relate(RelationshipType::ALL[*t], ids[*from], ids[*to], *lag).await;
            }

            let target = ids[schedule.target];
            let model = fx.model().await;
            let before_preds = model.predecessors_of(target);
            let before_succs = model.successors_of(target);
            let duration = model
                .complete_activity(target)
                .and_then(|a| a.duration())
                .unwrap();
            let untouched: BTreeSet<_> = model
                .relationships()
                .filter(|r| !r.touches(target))
                .map(|r| r.id)
                .collect();

            let outcome = fx.engine.dissolve_activity(target).await.unwrap();
            assert_eq!(
                outcome.removed_relationships.len(),
                before_preds.len() + before_succs.len()
            );

            let snapshot = fx.snapshot().await;
            let needle = target.to_string();
            assert!(snapshot.nodes().all(|(n, _)| !n.contains(&needle)));

            let graph = ScheduleGraph::from_snapshot(&snapshot);
            assert!(graph.is_acyclic());

            for before in &before_preds {
                for after in &before_succs {
                    if before.predecessor == after.successor {
                        continue;
                    }
                    let from = NodeKey::anchor(
                        before.predecessor,
                        before.relationship_type.predecessor_anchor(),
                    );
                    let to = NodeKey::anchor(
                        after.successor,
                        after.relationship_type.successor_anchor(),
                    );
                    assert!(
                        graph.reachable(&from.to_string(), &to.to_string()),
                        "{from} should still reach {to}"
                    );
                }
            }

            // Smallest composed lag per (B, C, type), as the table dictates.
            let mut expected = BTreeMap::new();
            for before in &before_preds {
                for after in &before_succs {
                    if before.predecessor == after.successor {
                        continue;
                    }
                    let composition = compose(before.relationship_type, after.relationship_type);
                    let lag = composition.lag(before.lag, duration, after.lag);
                    expected
                        .entry((before.predecessor, after.successor, composition.relationship_type))
                        .and_modify(|current: &mut f64| *current = current.min(lag))
                        .or_insert(lag);
                }
            }

            let after = fx.model().await;
            assert!(after.issues().is_empty());
            for ((b, c, ty), lag) in &expected {
                let existing: Vec<f64> = model
                    .relationships()
                    .filter(|r| r.predecessor == *b && r.successor == *c && r.relationship_type == *ty)
                    .map(|r| r.lag)
                    .collect();
                let found = after
                    .find_relationship(*b, *c, *ty)
                    .unwrap_or_else(|| panic!("missing {ty} {b} -> {c}"));
                if existing.is_empty() {
                    assert_eq!(found.lag, *lag, "composed lag for {ty} {b} -> {c}");
                } else {
                    assert!(existing.contains(&found.lag), "existing {ty} {b} -> {c} was replaced");
                }
            }
            assert_eq!(
                outcome.created.len(),
                expected
                    .keys()
                    .filter(|(b, c, ty)| model.find_relationship(*b, *c, *ty).is_none())
                    .count()
            );
            for id in &untouched {
                assert!(after.relationship(*id).is_some());
            }
            assert!(fx.engine.audit().await.unwrap().is_clean());
        });
    }
}
