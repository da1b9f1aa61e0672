//! End-to-end test infrastructure for the marketplace ranking engine.
//!
//! Provides a shared TestHarness over a temporary RocksDB store plus
//! fixture builders, so tests exercise the ranker through the real
//! storage backend.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use market_ranking::{Ranker, RocksStore};
use market_storage::Storage;
use market_types::{Asset, InteractionEvent, InteractionType, RankingConfig, User};

/// Fixed reference time for fixtures (2024-01-29 approx).
pub const BASE_TS_MS: i64 = 1_706_540_400_000;

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
}

impl TestHarness {
    /// Create a new test harness with temp directory and storage.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage =
            Arc::new(Storage::open(temp_dir.path()).expect("Failed to open test storage"));
        Self {
            _temp_dir: temp_dir,
            storage,
        }
    }

    /// Ranker with default configuration.
    pub fn ranker(&self) -> Ranker<RocksStore> {
        self.ranker_with(RankingConfig::default())
    }

    pub fn ranker_with(&self, config: RankingConfig) -> Ranker<RocksStore> {
        Ranker::new(Arc::new(RocksStore::new(self.storage.clone())), config)
    }

    /// Store a user with a wallet derived from the id.
    pub fn add_user(&self, user_id: &str) -> User {
        let user = User::new(user_id, &wallet_for(user_id), at(-24 * 365));
        self.storage.put_user(&user).expect("Failed to put user");
        user
    }

    pub fn add_asset(&self, asset: Asset) {
        self.storage.put_asset(&asset).expect("Failed to put asset");
    }

    /// Record events, asserting each one is new.
    pub fn record(&self, events: &[InteractionEvent]) {
        for event in events {
            let created = self
                .storage
                .record_interaction(event)
                .expect("Failed to record interaction");
            assert!(created, "event {} recorded twice", event.event_id);
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture time `hours` after [`BASE_TS_MS`] (negative for before).
pub fn at(hours: i64) -> DateTime<Utc> {
    base_time() + Duration::hours(hours)
}

pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(BASE_TS_MS).unwrap()
}

/// Deterministic hex wallet for a user id.
pub fn wallet_for(user_id: &str) -> String {
    let mut hex = String::from("0x");
    for byte in user_id.bytes() {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Build an event with a ULID whose time part matches `timestamp`.
pub fn event(
    user_id: &str,
    asset_id: &str,
    kind: InteractionType,
    timestamp: DateTime<Utc>,
) -> InteractionEvent {
    let ulid = ulid::Ulid::from_parts(timestamp.timestamp_millis() as u64, rand::random());
    InteractionEvent {
        event_id: ulid.to_string(),
        ..InteractionEvent::new(user_id, asset_id, kind, timestamp)
    }
}

/// `count` events by `user_id` on `asset_id`, one minute apart from `start`.
pub fn events(
    user_id: &str,
    asset_id: &str,
    kind: InteractionType,
    start: DateTime<Utc>,
    count: usize,
) -> Vec<InteractionEvent> {
    (0..count)
        .map(|i| event(user_id, asset_id, kind, start + Duration::minutes(i as i64)))
        .collect()
}
