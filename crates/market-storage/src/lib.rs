//! Storage layer for the asset marketplace.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for users, assets and the interaction log
//! - Time-prefixed interaction keys for efficient window scans
//! - Per-user and per-asset secondary indexes over the interaction log
//! - Atomic event append + counter bump via WriteBatch
//! - Idempotent event writes keyed by event ULID

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{InteractionKey, Scope, ScopedInteractionKey};
