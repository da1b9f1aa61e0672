//! Marketplace user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{normalize_wallet, UserId};

/// A marketplace account, keyed by wallet address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier
    pub user_id: UserId,

    /// Wallet address (lower-cased)
    pub wallet_address: String,

    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Account creation time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user for a wallet address.
    pub fn new(user_id: impl Into<UserId>, wallet_address: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            wallet_address: normalize_wallet(wallet_address),
            username: None,
            created_at,
        }
    }

    /// Set the display name.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Serialize to JSON bytes for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
