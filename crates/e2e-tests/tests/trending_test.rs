//! Trending E2E tests against the RocksDB store.

use chrono::Duration;
use pretty_assertions::assert_eq;
use rand::Rng;

use e2e_tests::{at, event, events, TestHarness};
use market_ranking::{RankingError, ReasonCode, ScoredCandidate};
use market_types::{Asset, InteractionType};

fn ids(results: &[ScoredCandidate]) -> Vec<&str> {
    results.iter().map(|r| r.asset.asset_id.as_str()).collect()
}

#[tokio::test]
async fn test_trending_weighting_regression() {
    let harness = TestHarness::new();
    harness.add_user("maker");
    harness.add_asset(Asset::new("x", "maker", at(-100)).with_counters(100, 0));
    harness.add_asset(Asset::new("y", "maker", at(-100)).with_counters(0, 20));

    let results = harness.ranker().trending_at(10, at(0)).await.unwrap();

    // X = 0.3 * 100 = 30.0, Y = 0.5 * 20 = 10.0
    assert_eq!(ids(&results), vec!["x", "y"]);
    assert!((results[0].score - 30.0).abs() < 1e-9);
    assert!((results[1].score - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_trending_sorted_by_score_then_newest() {
    let harness = TestHarness::new();
    harness.add_user("maker");
    let mut rng = rand::rng();
    for i in 0..40 {
        // Coarse counters so equal scores actually occur
        let asset = Asset::new(format!("asset-{i:02}"), "maker", at(-(i % 7) * 24))
            .with_counters(rng.random_range(0..4) * 10, rng.random_range(0..3) * 6);
        harness.add_asset(asset);
    }

    let results = harness.ranker().trending_at(40, at(0)).await.unwrap();
    assert_eq!(results.len(), 40);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
        if pair[0].score == pair[1].score {
            assert!(pair[0].asset.created_at >= pair[1].asset.created_at);
        }
    }
    assert!(results.iter().all(|r| r.reason_code == ReasonCode::Trending));
}

#[tokio::test]
async fn test_trending_recent_window_lifts_active_asset() {
    let harness = TestHarness::new();
    harness.add_user("maker");
    harness.add_user("fan");
    harness.add_asset(Asset::new("stale", "maker", at(-500)).with_counters(10, 0));
    harness.add_asset(Asset::new("fresh", "maker", at(-500)));

    let now = at(0);
    // Purchases do not bump counters, so only the window term moves
    harness.record(&events("fan", "fresh", InteractionType::Purchase, now - Duration::days(2), 20));
    // Exactly at the boundary: included
    harness.record(&[event("fan", "fresh", InteractionType::Purchase, now - Duration::days(7))]);
    // Older than the window: ignored
    harness.record(&events("fan", "stale", InteractionType::Purchase, now - Duration::days(30), 50));

    let results = harness.ranker().trending_at(2, now).await.unwrap();
    assert_eq!(ids(&results), vec!["fresh", "stale"]);
    assert!((results[0].score - 0.2 * 21.0).abs() < 1e-9);
    assert!((results[1].score - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_trending_counters_follow_recorded_views_and_likes() {
    let harness = TestHarness::new();
    harness.add_user("maker");
    harness.add_user("fan");
    harness.add_asset(Asset::new("a", "maker", at(-500)));

    harness.record(&events("fan", "a", InteractionType::View, at(-1), 3));
    harness.record(&events("fan", "a", InteractionType::Like, at(-1), 2));

    let results = harness.ranker().trending_at(1, at(0)).await.unwrap();
    let asset = &results[0].asset;
    assert_eq!((asset.views, asset.likes), (3, 2));
    // 0.3*3 + 0.5*2 + 0.2*5
    assert!((results[0].score - 2.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_trending_idempotent_without_mutation() {
    let harness = TestHarness::new();
    harness.add_user("maker");
    for i in 0..15 {
        harness.add_asset(
            Asset::new(format!("a{i}"), "maker", at(-i)).with_counters(i * 3 % 7, i % 4),
        );
    }

    let ranker = harness.ranker();
    let first = ranker.trending(10).await.unwrap();
    let second = ranker.trending(10).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 10);
}

#[tokio::test]
async fn test_trending_empty_store_is_empty_not_error() {
    let harness = TestHarness::new();
    let results = harness.ranker().trending(10).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_trending_rejects_non_positive_limit() {
    let harness = TestHarness::new();
    for limit in [0, -10] {
        let err = harness.ranker().trending(limit).await.unwrap_err();
        assert!(matches!(err, RankingError::InvalidArgument(_)));
    }
}
