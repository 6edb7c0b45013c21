//! Engine driven by the Gemini gateway against a mock server.

use aether_engine::{MergeOutcome, MergeStart};
use aether_types::{Position, RecipeKey};
use serde_json::json;

use crate::common::{
    engine, gemini_oracle, kind, mount_gemini_answer, mount_gemini_status, start_gemini_mock,
    surface_kinds, uncached_pair,
};

#[tokio::test]
async fn gemini_discovery_lands_in_catalog_and_recipes() {
    let server = start_gemini_mock().await;
    mount_gemini_answer(
        &server,
        json!({
            "success": true,
            "name": "Mud Pie",
            "emoji": "🥧",
            "color": "#92400e",
            "description": "A culinary mistake."
        }),
    )
    .await;

    let mut engine = engine(gemini_oracle(&server));
    let (mud, fire) = uncached_pair(&mut engine);
    engine.resolve(mud, fire).unwrap();
    let outcomes = engine.settle().await;

    assert!(matches!(
        outcomes[0],
        MergeOutcome::Combined { discovered: true, .. }
    ));
    let pie = engine.catalog().get(&kind("mud-pie")).unwrap();
    assert_eq!(pie.name, "Mud Pie");
    assert_eq!(pie.glyph, "🥧");
    assert_eq!(pie.color, "#92400e");
    assert_eq!(
        engine
            .recipes()
            .get(&RecipeKey::new(kind("fire"), kind("mud")))
            .map(|k| k.as_str()),
        Some("mud-pie")
    );
    assert_eq!(surface_kinds(&engine), ["mud-pie"]);
}

#[tokio::test]
async fn gemini_negative_answer_rejects_merge() {
    let server = start_gemini_mock().await;
    mount_gemini_answer(
        &server,
        json!({
            "success": false,
            "name": "",
            "emoji": "",
            "color": "",
            "description": ""
        }),
    )
    .await;

    let mut engine = engine(gemini_oracle(&server));
    let (mud, fire) = uncached_pair(&mut engine);
    engine.resolve(mud, fire).unwrap();
    let outcomes = engine.settle().await;

    assert!(matches!(outcomes[0], MergeOutcome::Rejected { .. }));
    assert_eq!(surface_kinds(&engine), ["mud", "fire"]);
}

#[tokio::test]
async fn gemini_server_error_rejects_merge_and_allows_retry_later() {
    let server = start_gemini_mock().await;
    mount_gemini_status(&server, 500).await;

    let mut engine = engine(gemini_oracle(&server));
    let (mud, fire) = uncached_pair(&mut engine);
    engine.resolve(mud, fire).unwrap();
    let outcomes = engine.settle().await;
    let MergeOutcome::Rejected { respawned, .. } = &outcomes[0] else {
        panic!("expected a rejection, got {outcomes:?}");
    };

    // Nothing was cached, so the same pair asks the oracle again.
    let start = engine.resolve(respawned[0], respawned[1]).unwrap();
    assert!(matches!(start, MergeStart::Pending { .. }));
    engine.settle().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn seeded_recipes_never_reach_gemini() {
    let server = start_gemini_mock().await;
    mount_gemini_status(&server, 500).await;

    let mut engine = engine(gemini_oracle(&server));
    let fire = engine.place(&kind("fire"), Position::new(0.0, 0.0)).unwrap();
    let fire_b = engine.place(&kind("fire"), Position::new(10.0, 0.0)).unwrap();
    assert!(matches!(
        engine.resolve(fire, fire_b),
        Some(MergeStart::Combined { .. })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}
