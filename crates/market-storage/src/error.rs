//! Storage layer error types.

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB operation failed
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Key encoding/decoding error
    #[error("Key error: {0}")]
    Key(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Referenced record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record rejected before write
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<market_types::MarketError> for StorageError {
    fn from(err: market_types::MarketError) -> Self {
        match err {
            market_types::MarketError::NotFound(msg) => StorageError::NotFound(msg),
            market_types::MarketError::Serialization(e) => StorageError::Serialization(e.to_string()),
            other => StorageError::InvalidInput(other.to_string()),
        }
    }
}
