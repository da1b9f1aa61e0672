//! Error path E2E tests for the ranking engine.
//!
//! Every failure must surface as its own error kind; none may collapse
//! into an empty result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use e2e_tests::{at, TestHarness};
use market_ranking::{FailingStore, InMemoryStore, Ranker, RankingError};
use market_types::{Asset, RankingConfig};

fn fast_timeout() -> RankingConfig {
    RankingConfig {
        store_timeout_ms: 100,
        ..RankingConfig::default()
    }
}

#[tokio::test]
async fn test_hanging_store_reports_unavailable_within_timeout() {
    let ranker = Ranker::new(Arc::new(FailingStore::hanging()), fast_timeout());

    let started = Instant::now();
    let err = ranker.trending(10).await.unwrap_err();
    assert!(matches!(err, RankingError::StoreUnavailable(_)));
    assert!(err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(3));

    let err = ranker.recommend("u1", 10).await.unwrap_err();
    assert!(matches!(err, RankingError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_unreachable_store_reports_unavailable() {
    let ranker = Ranker::new(Arc::new(FailingStore::unavailable()), fast_timeout());
    for result in [
        ranker.trending(5).await.map(|r| r.len()),
        ranker.recommend("u1", 5).await.map(|r| r.len()),
        ranker.top_creators(5).await.map(|r| r.len()),
    ] {
        assert!(matches!(result, Err(RankingError::StoreUnavailable(_))));
    }
}

#[tokio::test]
async fn test_invalid_arguments_are_not_retryable() {
    let harness = TestHarness::new();
    harness.add_user("u1");
    let ranker = harness.ranker();

    let err = ranker.recommend("u1", 0).await.unwrap_err();
    assert!(matches!(err, RankingError::InvalidArgument(_)));
    assert!(!err.is_retryable());

    let err = ranker.recommend("has space", 5).await.unwrap_err();
    assert!(matches!(err, RankingError::InvalidArgument(_)));

    let err = ranker.recommend("a:b", 5).await.unwrap_err();
    assert!(matches!(err, RankingError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_negative_counter_is_internal() {
    // RocksDB storage refuses such records, so feed them through the in-memory store
    let store = InMemoryStore::new()
        .with_asset(Asset::new("ok", "maker", at(-1)).with_counters(1, 1))
        .with_asset(Asset::new("bad", "maker", at(-1)).with_counters(0, -4));
    let ranker = Ranker::new(Arc::new(store), RankingConfig::default());

    let err = ranker.trending(10).await.unwrap_err();
    match err {
        RankingError::Internal(msg) => assert!(msg.contains("bad")),
        other => panic!("expected Internal, got {other:?}"),
    }
}

#[tokio::test]
async fn test_storage_rejects_corrupt_counters_at_write() {
    let harness = TestHarness::new();
    let result = harness
        .storage
        .put_asset(&Asset::new("bad", "maker", at(0)).with_counters(-1, 0));
    assert!(result.is_err());
    assert_eq!(harness.storage.get_stats().unwrap().asset_count, 0);
}
