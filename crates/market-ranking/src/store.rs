//! Store capability the ranking engine reads through.
//!
//! The engine never mutates the store. Each trait method is a single
//! round-trip; the [`Ranker`](crate::Ranker) bounds every call with the
//! configured timeout.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use market_types::{
    normalize_wallet, Asset, AssetId, InteractionEvent, InteractionFilter, User, UserId,
};

use crate::error::StoreError;

/// Read access to users, assets and the interaction log.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Get a user by id.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Resolve a wallet address (any case) to its user.
    async fn find_user_by_wallet(&self, wallet: &str) -> Result<Option<User>, StoreError>;

    /// All users.
    async fn fetch_users(&self) -> Result<Vec<User>, StoreError>;

    /// All assets with counters and tag sets.
    async fn fetch_assets(&self) -> Result<Vec<Asset>, StoreError>;

    /// One asset, including its owner and creator.
    async fn fetch_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError>;

    /// Interaction events matching `filter`, ordered by timestamp ascending.
    async fn fetch_interactions(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<InteractionEvent>, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    assets: BTreeMap<AssetId, Asset>,
    interactions: Vec<InteractionEvent>,
}

/// In-process store backed by ordered maps.
///
/// Used by unit tests and for embedding the engine without RocksDB.
/// Writes do not touch asset counters; set them on the asset directly.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn add_user(&self, user: User) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.users.insert(user.user_id.clone(), user);
    }

    /// Insert or replace an asset.
    pub fn add_asset(&self, asset: Asset) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.assets.insert(asset.asset_id.clone(), asset);
    }

    /// Append an interaction event. Duplicate event ids are ignored.
    pub fn add_interaction(&self, event: InteractionEvent) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state
            .interactions
            .iter()
            .any(|existing| existing.event_id == event.event_id)
        {
            return;
        }
        state.interactions.push(event);
    }

    /// Builder form of [`add_user`](Self::add_user).
    pub fn with_user(self, user: User) -> Self {
        self.add_user(user);
        self
    }

    /// Builder form of [`add_asset`](Self::add_asset).
    pub fn with_asset(self, asset: Asset) -> Self {
        self.add_asset(asset);
        self
    }

    /// Builder form of [`add_interaction`](Self::add_interaction).
    pub fn with_interaction(self, event: InteractionEvent) -> Self {
        self.add_interaction(event);
        self
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.users.get(user_id).cloned())
    }

    async fn find_user_by_wallet(&self, wallet: &str) -> Result<Option<User>, StoreError> {
        let wallet = normalize_wallet(wallet);
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .users
            .values()
            .find(|u| normalize_wallet(&u.wallet_address) == wallet)
            .cloned())
    }

    async fn fetch_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.users.values().cloned().collect())
    }

    async fn fetch_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.assets.values().cloned().collect())
    }

    async fn fetch_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.assets.get(asset_id).cloned())
    }

    async fn fetch_interactions(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<InteractionEvent>, StoreError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let mut events: Vec<InteractionEvent> = state
            .interactions
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        Ok(events)
    }
}

/// How a [`FailingStore`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Every call returns `StoreError::Unavailable`
    Unavailable,
    /// Every call blocks forever
    Hang,
}

/// Store that never answers successfully. Exercises the unavailability
/// and timeout paths.
#[derive(Debug, Clone)]
pub struct FailingStore {
    mode: FailureMode,
}

impl FailingStore {
    pub fn new(mode: FailureMode) -> Self {
        Self { mode }
    }

    pub fn unavailable() -> Self {
        Self::new(FailureMode::Unavailable)
    }

    pub fn hanging() -> Self {
        Self::new(FailureMode::Hang)
    }

    async fn fail<T>(&self, op: &str) -> Result<T, StoreError> {
        match self.mode {
            FailureMode::Unavailable => Err(StoreError::Unavailable(format!(
                "{op}: connection refused"
            ))),
            FailureMode::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl InteractionStore for FailingStore {
    async fn get_user(&self, _user_id: &str) -> Result<Option<User>, StoreError> {
        self.fail("get_user").await
    }

    async fn find_user_by_wallet(&self, _wallet: &str) -> Result<Option<User>, StoreError> {
        self.fail("find_user_by_wallet").await
    }

    async fn fetch_users(&self) -> Result<Vec<User>, StoreError> {
        self.fail("fetch_users").await
    }

    async fn fetch_assets(&self) -> Result<Vec<Asset>, StoreError> {
        self.fail("fetch_assets").await
    }

    async fn fetch_asset(&self, _asset_id: &str) -> Result<Option<Asset>, StoreError> {
        self.fail("fetch_asset").await
    }

    async fn fetch_interactions(
        &self,
        _filter: &InteractionFilter,
    ) -> Result<Vec<InteractionEvent>, StoreError> {
        self.fail("fetch_interactions").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use market_types::InteractionType;

    #[tokio::test]
    async fn test_in_memory_wallet_lookup() {
        let store = InMemoryStore::new().with_user(User::new("u1", "0xABC", Utc::now()));
        let found = store.find_user_by_wallet("0xabc").await.unwrap();
        assert_eq!(found.map(|u| u.user_id), Some("u1".to_string()));
        assert!(store.find_user_by_wallet("0xdef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_interactions_sorted_and_deduplicated() {
        let now = Utc::now();
        let late = InteractionEvent::new("u1", "a1", InteractionType::Like, now);
        let early = InteractionEvent::new(
            "u1",
            "a2",
            InteractionType::View,
            now - Duration::minutes(5),
        );
        let store = InMemoryStore::new()
            .with_interaction(late.clone())
            .with_interaction(early.clone())
            .with_interaction(late.clone());

        let events = store
            .fetch_interactions(&InteractionFilter::for_user("u1"))
            .await
            .unwrap();
        assert_eq!(events, vec![early, late]);
    }

    #[tokio::test]
    async fn test_failing_store_reports_unavailable() {
        let store = FailingStore::unavailable();
        assert!(matches!(
            store.fetch_assets().await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
