//! Race safety, proximity boundary, idempotence and referential integrity.

use std::sync::Arc;

use aether_engine::{DEFAULT_MERGE_THRESHOLD, Engine, MergeOutcome, MergeStart, RecipeStore, detect};
use aether_types::{KindId, Position, RecipeKey, TokenKind};

use crate::common::{Answer, StubOracle, engine, kind, mud_pie, uncached_pair};

#[test]
fn recipe_key_ignores_argument_order() {
    let ids = ["air", "earth", "fire", "water", "mud-pie", "steam"];
    for a in ids {
        for b in ids {
            let forward = RecipeKey::new(KindId::new(a).unwrap(), KindId::new(b).unwrap());
            let backward = RecipeKey::new(KindId::new(b).unwrap(), KindId::new(a).unwrap());
            assert_eq!(forward, backward);
        }
    }
}

#[test]
fn threshold_distance_does_not_merge() {
    let mut engine = engine(StubOracle::answering(Answer::Fail));
    let fire = engine.place(&kind("fire"), Position::new(0.0, 0.0)).unwrap();
    engine.place(&kind("water"), Position::new(200.0, 0.0)).unwrap();

    assert!(
        engine
            .release(fire, Position::new(200.0 - DEFAULT_MERGE_THRESHOLD, 0.0))
            .is_none()
    );
    assert_eq!(engine.instances().len(), 2);

    let just_inside = 200.0 - DEFAULT_MERGE_THRESHOLD + 1e-9;
    assert!(matches!(
        engine.release(fire, Position::new(just_inside, 0.0)),
        Some(MergeStart::Combined { .. })
    ));
}

#[test]
fn detection_prefers_iteration_order_over_distance() {
    let mut engine = engine(StubOracle::answering(Answer::Fail));
    let far = engine.place(&kind("water"), Position::new(50.0, 0.0)).unwrap();
    let near = engine.place(&kind("earth"), Position::new(5.0, 0.0)).unwrap();
    let fire = engine.place(&kind("fire"), Position::new(500.0, 0.0)).unwrap();

    let hit = detect(
        fire,
        Position::new(0.0, 0.0),
        engine.instances(),
        DEFAULT_MERGE_THRESHOLD,
    );
    assert_eq!(hit, Some(far));
    assert_ne!(hit, Some(near));
}

#[tokio::test]
async fn consumed_inputs_cannot_be_detected_again() {
    let oracle = StubOracle::held(Answer::Fail);
    let mut engine = engine(oracle.clone());
    let (mud, fire) = uncached_pair(&mut engine);
    let water = engine.place(&kind("water"), Position::new(120.0, 115.0)).unwrap();

    engine.resolve(mud, fire).unwrap();

    // Second detection pass over the same spot only sees the water.
    assert_eq!(
        detect(
            water,
            Position::new(120.0, 110.0),
            engine.instances(),
            DEFAULT_MERGE_THRESHOLD
        ),
        None
    );
    assert!(engine.resolve(water, mud).is_none());
    assert!(engine.resolve(fire, mud).is_none());
    assert!(engine.release(mud, Position::new(120.0, 115.0)).is_none());
    assert_eq!(engine.pending_count(), 1);

    oracle.open(1);
    engine.settle().await;
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn repeated_discovery_does_not_overwrite_or_duplicate() {
    let oracle = StubOracle::held(Answer::Discover(mud_pie()));
    let mut engine = engine(oracle.clone());
    let (mud_a, fire_a) = uncached_pair(&mut engine);
    let (mud_b, fire_b) = uncached_pair(&mut engine);

    engine.resolve(mud_a, fire_a).unwrap();
    engine.resolve(mud_b, fire_b).unwrap();
    oracle.open(2);
    let outcomes = engine.settle().await;

    let discovered: Vec<bool> = outcomes
        .iter()
        .map(|outcome| match outcome {
            MergeOutcome::Combined { discovered, .. } => *discovered,
            MergeOutcome::Rejected { .. } => panic!("unexpected rejection"),
        })
        .collect();
    assert_eq!(discovered, [true, false]);

    let catalog_size = engine.catalog().len();
    let recipe_count = engine.recipes().len();
    let library: Vec<_> = engine.library().map(|k| k.id.clone()).collect();
    assert_eq!(
        library.iter().filter(|id| id.as_str() == "mud-pie").count(),
        1
    );

    // Same concept reached from a different pair reuses the entry.
    let oracle = StubOracle::answering(Answer::Discover(TokenKind::new(
        KindId::known("mud-pie"),
        "Mud Pie (again)",
        "🍰",
        "#000000",
        "",
    )));
    let mut engine_b = engine_with_catalog_of(&engine, oracle);
    let (mud, fire) = uncached_pair(&mut engine_b);
    engine_b.resolve(mud, fire).unwrap();
    engine_b.settle().await;
    assert_eq!(engine_b.catalog().len(), catalog_size);
    assert_eq!(engine_b.recipes().len(), recipe_count);
    assert_eq!(
        engine_b
            .catalog()
            .get(&KindId::known("mud-pie"))
            .unwrap()
            .name,
        "Mud Pie"
    );
}

/// Fresh surface and seeded recipes, but `source`'s catalog.
fn engine_with_catalog_of(source: &Engine, oracle: Arc<StubOracle>) -> Engine {
    Engine::with_stores(
        oracle,
        source.settings().clone(),
        source.catalog().clone(),
        RecipeStore::seeded(),
    )
}

#[tokio::test]
async fn every_referenced_kind_resolves_after_merges() {
    let oracle = StubOracle::answering(Answer::Discover(mud_pie()));
    let mut engine = engine(oracle);

    let (mud, fire) = uncached_pair(&mut engine);
    engine.resolve(mud, fire).unwrap();
    let (mud, fire) = uncached_pair(&mut engine);
    engine.resolve(mud, fire).unwrap();
    engine.settle().await;

    let air = engine.place(&kind("air"), Position::new(0.0, 0.0)).unwrap();
    let air_b = engine.place(&kind("air"), Position::new(5.0, 0.0)).unwrap();
    engine.resolve(air, air_b).unwrap();
    engine.clear();

    assert!(engine.unresolved_kinds().is_empty());
}
