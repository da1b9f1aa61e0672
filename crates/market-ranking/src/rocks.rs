//! [`InteractionStore`] over the RocksDB-backed [`Storage`].

use std::sync::Arc;

use async_trait::async_trait;

use market_storage::{Storage, StorageError};
use market_types::{Asset, InteractionEvent, InteractionFilter, User};

use crate::error::StoreError;
use crate::store::InteractionStore;

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RocksDb(_) | StorageError::ColumnFamilyNotFound(_) => {
                StoreError::Unavailable(err.to_string())
            }
            StorageError::Key(_) | StorageError::Serialization(_) => {
                StoreError::Corrupt(err.to_string())
            }
            StorageError::NotFound(_) | StorageError::InvalidInput(_) => {
                StoreError::Invalid(err.to_string())
            }
        }
    }
}

/// RocksDB reads, each run on the blocking pool.
#[derive(Clone)]
pub struct RocksStore {
    storage: Arc<Storage>,
}

impl RocksStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    async fn blocking<T, F>(&self, read: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T, StorageError> + Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || read(&storage))
            .await
            .map_err(|e| StoreError::Unavailable(format!("storage task failed: {}", e)))?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl InteractionStore for RocksStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let user_id = user_id.to_string();
        self.blocking(move |s| s.get_user(&user_id)).await
    }

    async fn find_user_by_wallet(&self, wallet: &str) -> Result<Option<User>, StoreError> {
        let wallet = wallet.to_string();
        self.blocking(move |s| s.get_user_by_wallet(&wallet)).await
    }

    async fn fetch_users(&self) -> Result<Vec<User>, StoreError> {
        self.blocking(|s| s.list_users()).await
    }

    async fn fetch_assets(&self) -> Result<Vec<Asset>, StoreError> {
        self.blocking(|s| s.list_assets()).await
    }

    async fn fetch_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        let asset_id = asset_id.to_string();
        self.blocking(move |s| s.get_asset(&asset_id)).await
    }

    async fn fetch_interactions(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<InteractionEvent>, StoreError> {
        let filter = filter.clone();
        self.blocking(move |s| s.get_interactions(&filter)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use market_types::InteractionType;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(temp_dir.path()).unwrap();
        (RocksStore::new(Arc::new(storage)), temp_dir)
    }

    #[tokio::test]
    async fn test_reads_through_to_storage() {
        let (store, _temp) = create_test_store();
        let now = Utc::now();
        let storage = store.storage();
        storage.put_user(&User::new("u1", "0xAB", now)).unwrap();
        storage
            .put_asset(&Asset::new("a1", "u1", now).with_tags(["art"]))
            .unwrap();
        storage
            .record_interaction(&InteractionEvent::new(
                "u1",
                "a1",
                InteractionType::Like,
                now,
            ))
            .unwrap();

        let user = store.find_user_by_wallet("0xab").await.unwrap().unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(store.fetch_assets().await.unwrap().len(), 1);
        assert_eq!(store.fetch_asset("a1").await.unwrap().unwrap().likes, 1);

        let events = store
            .fetch_interactions(&InteractionFilter::for_user("u1"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(store.get_user("nobody").await.unwrap().is_none());
    }

    #[test]
    fn test_storage_error_classification() {
        assert!(matches!(
            StoreError::from(StorageError::ColumnFamilyNotFound("assets".into())),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(StorageError::Serialization("eof".into())),
            StoreError::Corrupt(_)
        ));
        assert!(matches!(
            StoreError::from(StorageError::InvalidInput("id".into())),
            StoreError::Invalid(_)
        ));
    }
}
