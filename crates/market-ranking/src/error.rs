//! Error types for the ranking engine.

use thiserror::Error;

/// Failure reported by an [`InteractionStore`](crate::InteractionStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient I/O failure; the same call may succeed later
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A record could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The store rejected the request itself (e.g. malformed identifier)
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// Errors surfaced by ranking operations.
///
/// Only `StoreUnavailable` is safe to retry. The engine never retries
/// internally and never turns a failure into an empty result.
#[derive(Debug, Error)]
pub enum RankingError {
    /// Referenced user or asset does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-positive limit or malformed identifier
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Store failed or did not answer within the configured timeout
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invariant violation observed in store data
    #[error("internal error: {0}")]
    Internal(String),
}

impl RankingError {
    /// Whether a caller may retry the operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RankingError::StoreUnavailable(_))
    }
}

impl From<StoreError> for RankingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => RankingError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => RankingError::Internal(msg),
            StoreError::Invalid(msg) => RankingError::InvalidArgument(msg),
        }
    }
}

impl From<market_types::MarketError> for RankingError {
    fn from(err: market_types::MarketError) -> Self {
        match err {
            market_types::MarketError::NotFound(msg) => RankingError::NotFound(msg),
            market_types::MarketError::InvalidInput(msg) => RankingError::InvalidArgument(msg),
            other => RankingError::Internal(other.to_string()),
        }
    }
}
