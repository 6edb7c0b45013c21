//! End-to-end merge scenarios through the public engine API.

use std::time::Duration;

use aether_engine::{Cue, DISCOVERY_TITLE, MergeOutcome, MergeStart};
use aether_types::{Position, RecipeKey};

use crate::common::{Answer, StubOracle, engine, kind, mud_pie, surface_kinds, uncached_pair};

#[test]
fn cached_recipe_replaces_pair_with_result_at_midpoint() {
    let oracle = StubOracle::answering(Answer::Fail);
    let mut engine = engine(oracle.clone());
    let fire = engine.place(&kind("fire"), Position::new(100.0, 100.0)).unwrap();
    let water = engine.place(&kind("water"), Position::new(200.0, 100.0)).unwrap();

    engine.move_instance(fire, Position::new(150.0, 100.0));
    engine.move_instance(fire, Position::new(170.0, 100.0));
    let start = engine.release(fire, Position::new(170.0, 100.0)).unwrap();

    let MergeStart::Combined { instance, kind: result } = start else {
        panic!("expected a cached merge, got {start:?}");
    };
    assert_eq!(result, kind("steam"));
    assert_eq!(surface_kinds(&engine), ["steam"]);
    assert!(engine.instance(fire).is_none());
    assert!(engine.instance(water).is_none());
    assert_eq!(
        engine.instance(instance).unwrap().position,
        Position::new(185.0, 100.0)
    );
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn oracle_discovery_is_memoized_and_announced() {
    let oracle = StubOracle::answering(Answer::Discover(mud_pie()));
    let mut engine = engine(oracle.clone());
    let (mud, fire) = uncached_pair(&mut engine);
    let catalog_size = engine.catalog().len();
    let key = RecipeKey::new(kind("mud"), kind("fire"));
    assert!(!engine.recipes().contains(&key));

    let start = engine.resolve(mud, fire).unwrap();
    assert!(matches!(start, MergeStart::Pending { .. }));
    assert!(engine.status().busy);

    let outcomes = engine.settle().await;
    let MergeOutcome::Combined {
        kind: result,
        instance,
        discovered: true,
        ..
    } = &outcomes[0]
    else {
        panic!("expected a discovery, got {outcomes:?}");
    };

    assert_eq!(result.as_str(), "mud-pie");
    assert_eq!(engine.recipes().get(&key), Some(result));
    assert_eq!(engine.catalog().len(), catalog_size + 1);
    assert_eq!(surface_kinds(&engine), ["mud-pie"]);
    assert_eq!(
        engine.instance(*instance).unwrap().position,
        Position::new(120.0, 110.0)
    );
    assert!(engine.library().any(|k| k.id == *result));

    let notice = engine.status().notice.unwrap();
    assert_eq!(notice.title, DISCOVERY_TITLE);
    assert_eq!(notice.subtitle, "Mud Pie");

    tokio::time::advance(Duration::from_secs(3)).await;
    engine.tick();
    assert!(engine.status().notice.is_none());
    assert!(!engine.status().busy);

    // Memoized: the same pair no longer reaches the oracle.
    let mud = engine.place(&kind("mud"), Position::new(0.0, 0.0)).unwrap();
    let fire = engine.place(&kind("fire"), Position::new(10.0, 0.0)).unwrap();
    assert!(matches!(
        engine.resolve(fire, mud),
        Some(MergeStart::Combined { .. })
    ));
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn failed_oracle_respawns_input_kinds() {
    for answer in [Answer::Fail, Answer::Nothing] {
        let oracle = StubOracle::answering(answer);
        let mut engine = engine(oracle);
        let (mud, fire) = uncached_pair(&mut engine);
        let recipes = engine.recipes().len();
        let catalog = engine.catalog().len();

        engine.resolve(mud, fire).unwrap();
        let outcomes = engine.settle().await;
        let MergeOutcome::Rejected { respawned, .. } = &outcomes[0] else {
            panic!("expected a rejection, got {outcomes:?}");
        };

        assert_eq!(engine.recipes().len(), recipes);
        assert_eq!(engine.catalog().len(), catalog);

        let left = engine.instance(respawned[0]).unwrap();
        let right = engine.instance(respawned[1]).unwrap();
        assert_eq!(left.kind, kind("mud"));
        assert_eq!(left.position, Position::new(80.0, 110.0));
        assert_eq!(right.kind, kind("fire"));
        assert_eq!(right.position, Position::new(160.0, 110.0));
        assert!(!respawned.contains(&mud) && !respawned.contains(&fire));
        assert_eq!(engine.take_cues(), [Cue::Pop, Cue::Pop, Cue::Fail]);
    }
}

#[tokio::test]
async fn clear_while_pending_still_places_result() {
    let oracle = StubOracle::held(Answer::Discover(mud_pie()));
    let mut engine = engine(oracle.clone());
    let (mud, fire) = uncached_pair(&mut engine);
    engine.place(&kind("air"), Position::new(300.0, 300.0)).unwrap();
    engine.place(&kind("water"), Position::new(400.0, 300.0)).unwrap();

    engine.resolve(mud, fire).unwrap();
    assert_eq!(engine.clear(), 2);
    assert!(engine.instances().is_empty());
    assert!(engine.status().busy);

    oracle.open(1);
    engine.settle().await;
    assert_eq!(surface_kinds(&engine), ["mud-pie"]);
    assert!(engine.unresolved_kinds().is_empty());
}

#[tokio::test]
async fn clear_while_pending_rejection_still_respawns() {
    let oracle = StubOracle::held(Answer::Fail);
    let mut engine = engine(oracle.clone());
    let (mud, fire) = uncached_pair(&mut engine);

    engine.resolve(mud, fire).unwrap();
    engine.clear();
    oracle.open(1);
    engine.settle().await;
    assert_eq!(surface_kinds(&engine), ["mud", "fire"]);
}

#[tokio::test]
async fn independent_merges_resolve_while_another_is_pending() {
    let oracle = StubOracle::held(Answer::Discover(mud_pie()));
    let mut engine = engine(oracle.clone());
    let (mud, fire) = uncached_pair(&mut engine);
    engine.resolve(mud, fire).unwrap();

    let air = engine.place(&kind("air"), Position::new(0.0, 0.0)).unwrap();
    let earth = engine.place(&kind("earth"), Position::new(300.0, 0.0)).unwrap();
    let start = engine.release(earth, Position::new(40.0, 0.0)).unwrap();
    assert!(matches!(start, MergeStart::Combined { ref kind, .. } if kind.as_str() == "dust"));
    assert!(engine.instance(air).is_none());
    assert!(engine.status().busy);
    assert!(engine.poll_merges().is_empty());

    oracle.open(1);
    engine.settle().await;
    assert_eq!(surface_kinds(&engine), ["dust", "mud-pie"]);
}
