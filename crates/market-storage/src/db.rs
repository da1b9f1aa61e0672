//! RocksDB wrapper for marketplace storage.
//!
//! Provides:
//! - Database open/close with column family setup
//! - User and asset records with a wallet address index
//! - Atomic interaction append (log + both indexes + counter bump)
//! - Idempotent interaction writes keyed by (timestamp, event ULID)
//! - Filtered interaction reads over the cheapest index

use std::path::Path;
use std::sync::Mutex;

use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use serde::Serialize;
use tracing::{debug, info, warn};

use market_types::{
    normalize_wallet, validate_id, validate_wallet, Asset, InteractionEvent, InteractionFilter,
    InteractionType, User,
};

use crate::column_families::{
    build_cf_descriptors, CF_ASSETS, CF_ASSET_INTERACTIONS, CF_INTERACTIONS, CF_USERS,
    CF_USER_INTERACTIONS, CF_WALLETS,
};
use crate::error::StorageError;
use crate::keys::{InteractionKey, Scope, ScopedInteractionKey};

/// Main storage interface for the marketplace
pub struct Storage {
    db: DB,
    /// Serializes read-modify-write of asset counters
    counter_lock: Mutex<()>,
    /// Serializes the wallet ownership check with the index write
    wallet_lock: Mutex<()>,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            counter_lock: Mutex::new(()),
            wallet_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    // ==================== Users ====================

    /// Insert or replace a user record.
    ///
    /// The wallet index is kept in the same batch. A wallet already bound to
    /// a different user is rejected.
    pub fn put_user(&self, user: &User) -> Result<(), StorageError> {
        validate_id("user_id", &user.user_id)?;
        validate_wallet(&user.wallet_address)?;
        let wallet = normalize_wallet(&user.wallet_address);

        let users_cf = self.cf(CF_USERS)?;
        let wallets_cf = self.cf(CF_WALLETS)?;

        let _guard = self.wallet_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(owner) = self.db.get_cf(wallets_cf, wallet.as_bytes())? {
            if owner != user.user_id.as_bytes() {
                return Err(StorageError::InvalidInput(format!(
                    "wallet {} already belongs to {}",
                    wallet,
                    String::from_utf8_lossy(&owner)
                )));
            }
        }

        let mut record = user.clone();
        record.wallet_address = wallet.clone();

        let mut batch = WriteBatch::default();
        if let Some(previous) = self.get_user(&user.user_id)? {
            if previous.wallet_address != wallet {
                batch.delete_cf(wallets_cf, previous.wallet_address.as_bytes());
            }
        }
        batch.put_cf(users_cf, record.user_id.as_bytes(), record.to_bytes()?);
        batch.put_cf(wallets_cf, wallet.as_bytes(), record.user_id.as_bytes());
        self.db.write(batch)?;

        debug!(user_id = %record.user_id, "Stored user");
        Ok(())
    }

    /// Get a user by id
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        let cf = self.cf(CF_USERS)?;
        match self.db.get_cf(cf, user_id.as_bytes())? {
            Some(bytes) => Ok(Some(User::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Resolve a wallet address (any case) to its user
    pub fn get_user_by_wallet(&self, wallet: &str) -> Result<Option<User>, StorageError> {
        let cf = self.cf(CF_WALLETS)?;
        let wallet = normalize_wallet(wallet);
        match self.db.get_cf(cf, wallet.as_bytes())? {
            Some(user_id) => {
                let user_id = String::from_utf8(user_id.to_vec())
                    .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
                self.get_user(&user_id)
            }
            None => Ok(None),
        }
    }

    /// All users, ordered by id
    pub fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.scan_values(CF_USERS, |bytes| Ok(User::from_bytes(bytes)?))
    }

    // ==================== Assets ====================

    /// Insert or replace an asset record.
    ///
    /// Counters never move backwards: when the asset already exists, each
    /// counter keeps the larger of the stored and the incoming value.
    pub fn put_asset(&self, asset: &Asset) -> Result<(), StorageError> {
        validate_id("asset_id", &asset.asset_id)?;
        validate_id("creator_id", &asset.creator_id)?;
        validate_id("owner_id", &asset.owner_id)?;
        asset
            .check_invariants()
            .map_err(StorageError::InvalidInput)?;

        let _guard = self.counter_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut record = asset.clone();
        if let Some(stored) = self.get_asset(&asset.asset_id)? {
            record.views = record.views.max(stored.views);
            record.likes = record.likes.max(stored.likes);
        }
        let cf = self.cf(CF_ASSETS)?;
        self.db
            .put_cf(cf, record.asset_id.as_bytes(), record.to_bytes()?)?;
        debug!(
            asset_id = %record.asset_id,
            views = record.views,
            likes = record.likes,
            "Stored asset"
        );
        Ok(())
    }

    /// Get an asset by id
    pub fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>, StorageError> {
        let cf = self.cf(CF_ASSETS)?;
        match self.db.get_cf(cf, asset_id.as_bytes())? {
            Some(bytes) => Ok(Some(Asset::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All assets, ordered by id
    pub fn list_assets(&self) -> Result<Vec<Asset>, StorageError> {
        self.scan_values(CF_ASSETS, |bytes| Ok(Asset::from_bytes(bytes)?))
    }

    /// Increment the view counter of an asset
    pub fn increment_views(&self, asset_id: &str) -> Result<Asset, StorageError> {
        self.bump_counter(asset_id, |asset| asset.views = asset.views.saturating_add(1))
    }

    /// Increment the like counter of an asset
    pub fn increment_likes(&self, asset_id: &str) -> Result<Asset, StorageError> {
        self.bump_counter(asset_id, |asset| asset.likes = asset.likes.saturating_add(1))
    }

    fn bump_counter(
        &self,
        asset_id: &str,
        bump: impl FnOnce(&mut Asset),
    ) -> Result<Asset, StorageError> {
        let _guard = self.counter_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut asset = self
            .get_asset(asset_id)?
            .ok_or_else(|| StorageError::NotFound(format!("asset {}", asset_id)))?;
        bump(&mut asset);
        let cf = self.cf(CF_ASSETS)?;
        self.db
            .put_cf(cf, asset.asset_id.as_bytes(), asset.to_bytes()?)?;
        Ok(asset)
    }

    // ==================== Interactions ====================

    /// Append an interaction event.
    ///
    /// The log entry, both index entries and the counter bump (views for
    /// `view`, likes for `like`) are written in one batch.
    ///
    /// Returns false if the event already existed; nothing is written then.
    pub fn record_interaction(&self, event: &InteractionEvent) -> Result<bool, StorageError> {
        validate_id("user_id", &event.user_id)?;
        validate_id("asset_id", &event.asset_id)?;
        let key = InteractionKey::new(event.timestamp_ms(), &event.event_id)?;

        let log_cf = self.cf(CF_INTERACTIONS)?;
        let user_idx_cf = self.cf(CF_USER_INTERACTIONS)?;
        let asset_idx_cf = self.cf(CF_ASSET_INTERACTIONS)?;
        let assets_cf = self.cf(CF_ASSETS)?;

        let _guard = self.counter_lock.lock().unwrap_or_else(|e| e.into_inner());

        if self.db.get_cf(log_cf, key.to_bytes())?.is_some() {
            debug!("Interaction {} already exists, skipping", event.event_id);
            return Ok(false);
        }

        if self.get_user(&event.user_id)?.is_none() {
            return Err(StorageError::NotFound(format!("user {}", event.user_id)));
        }
        let mut asset = self
            .get_asset(&event.asset_id)?
            .ok_or_else(|| StorageError::NotFound(format!("asset {}", event.asset_id)))?;

        let mut batch = WriteBatch::default();
        batch.put_cf(log_cf, key.to_bytes(), event.to_bytes()?);
        batch.put_cf(
            user_idx_cf,
            ScopedInteractionKey::new(Scope::User, &event.user_id, &key).to_bytes(),
            b"",
        );
        batch.put_cf(
            asset_idx_cf,
            ScopedInteractionKey::new(Scope::Asset, &event.asset_id, &key).to_bytes(),
            b"",
        );

        let bumped = match event.interaction_type {
            InteractionType::View => {
                asset.views = asset.views.saturating_add(1);
                true
            }
            InteractionType::Like => {
                asset.likes = asset.likes.saturating_add(1);
                true
            }
            InteractionType::Purchase | InteractionType::List => false,
        };
        if bumped {
            batch.put_cf(assets_cf, asset.asset_id.as_bytes(), asset.to_bytes()?);
        }

        self.db.write(batch)?;
        debug!(
            event_id = %event.event_id,
            kind = %event.interaction_type,
            "Recorded interaction"
        );
        Ok(true)
    }

    /// Interactions matching `filter`, ordered by timestamp ascending.
    ///
    /// Reads the per-user index when a user is set, otherwise the per-asset
    /// index when an asset is set, otherwise the time-ordered log.
    pub fn get_interactions(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<InteractionEvent>, StorageError> {
        let start_ms = filter.since.map(|t| t.timestamp_millis()).unwrap_or(0);
        let end_ms = filter.until.map(|t| t.timestamp_millis()).unwrap_or(i64::MAX);
        if end_ms < start_ms {
            return Ok(Vec::new());
        }

        let events = match (&filter.user_id, &filter.asset_id) {
            (Some(user_id), _) => {
                self.scan_scoped(CF_USER_INTERACTIONS, Scope::User, user_id, start_ms, end_ms)?
            }
            (None, Some(asset_id)) => self.scan_scoped(
                CF_ASSET_INTERACTIONS,
                Scope::Asset,
                asset_id,
                start_ms,
                end_ms,
            )?,
            (None, None) => self.scan_log(start_ms, end_ms)?,
        };

        Ok(events.into_iter().filter(|e| filter.matches(e)).collect())
    }

    fn scan_log(&self, start_ms: i64, end_ms: i64) -> Result<Vec<InteractionEvent>, StorageError> {
        let cf = self.cf(CF_INTERACTIONS)?;
        let start_prefix = InteractionKey::prefix_start(start_ms);
        let end_prefix = InteractionKey::prefix_end(end_ms);

        let mut results = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&start_prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if key.as_ref() >= end_prefix.as_slice() {
                break;
            }
            results.push(InteractionEvent::from_bytes(&value)?);
        }
        Ok(results)
    }

    fn scan_scoped(
        &self,
        index_cf: &str,
        scope: Scope,
        owner_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<InteractionEvent>, StorageError> {
        let index = self.cf(index_cf)?;
        let log_cf = self.cf(CF_INTERACTIONS)?;
        let start_prefix = ScopedInteractionKey::prefix_start(scope, owner_id, start_ms);
        let end_prefix = ScopedInteractionKey::prefix_end(scope, owner_id, end_ms);

        let mut results = Vec::new();
        let iter = self
            .db
            .iterator_cf(index, IteratorMode::From(&start_prefix, Direction::Forward));
        for item in iter {
            let (key, _) = item?;
            if key.as_ref() >= end_prefix.as_slice() {
                break;
            }
            let scoped = ScopedInteractionKey::from_bytes(&key)?;
            let log_key = InteractionKey {
                timestamp_ms: scoped.timestamp_ms,
                ulid: scoped.ulid,
            };
            match self.db.get_cf(log_cf, log_key.to_bytes())? {
                Some(bytes) => results.push(InteractionEvent::from_bytes(&bytes)?),
                None => warn!(key = ?String::from_utf8_lossy(&key), "Dangling index entry"),
            }
        }
        Ok(results)
    }

    fn scan_values<T>(
        &self,
        cf_name: &str,
        decode: impl Fn(&[u8]) -> Result<T, StorageError>,
    ) -> Result<Vec<T>, StorageError> {
        let cf = self.cf(cf_name)?;
        let mut results = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            results.push(decode(&value)?);
        }
        Ok(results)
    }

    // ==================== Maintenance ====================

    /// Flush all memtables to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    /// Trigger manual compaction on all column families
    pub fn compact(&self) -> Result<(), StorageError> {
        info!("Starting full compaction");
        for cf_name in crate::column_families::ALL_CF_NAMES {
            let cf = self.cf(cf_name)?;
            self.db.compact_range_cf(cf, None::<&[u8]>, None::<&[u8]>);
        }
        info!("Compaction complete");
        Ok(())
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        Ok(StorageStats {
            user_count: self.count_cf_entries(self.cf(CF_USERS)?)?,
            asset_count: self.count_cf_entries(self.cf(CF_ASSETS)?)?,
            interaction_count: self.count_cf_entries(self.cf(CF_INTERACTIONS)?)?,
            disk_usage_bytes: self.get_disk_usage(),
        })
    }

    fn count_cf_entries(&self, cf: &ColumnFamily) -> Result<u64, StorageError> {
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn get_disk_usage(&self) -> u64 {
        let mut total_size = 0u64;
        if let Ok(entries) = std::fs::read_dir(self.db.path()) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    total_size += metadata.len();
                }
            }
        }
        total_size
    }
}

/// Statistics about the storage.
#[derive(Debug, Default, Clone, Serialize)]
pub struct StorageStats {
    /// Number of user records
    pub user_count: u64,
    /// Number of asset records
    pub asset_count: u64,
    /// Number of interaction log entries
    pub interaction_count: u64,
    /// Total size of the database directory
    pub disk_usage_bytes: u64,
}
