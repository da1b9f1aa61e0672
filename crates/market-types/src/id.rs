//! Identifier types and validation.
//!
//! Identifiers are opaque strings. They become part of storage keys
//! (`{prefix}:{id}:{timestamp}:{ulid}`), so they must not contain the key
//! separator or whitespace.

use crate::error::MarketError;

/// Opaque user identifier.
pub type UserId = String;

/// Opaque asset identifier.
pub type AssetId = String;

/// Maximum identifier length in bytes.
const MAX_ID_LEN: usize = 128;

/// Validate an identifier, naming `field` in the error message.
pub fn validate_id(field: &str, id: &str) -> Result<(), MarketError> {
    if id.is_empty() {
        return Err(MarketError::InvalidInput(format!("{field} must not be empty")));
    }
    if id.len() > MAX_ID_LEN {
        return Err(MarketError::InvalidInput(format!(
            "{field} exceeds {MAX_ID_LEN} bytes"
        )));
    }
    if id.contains(':') || id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(MarketError::InvalidInput(format!(
            "{field} contains a separator or whitespace: {id:?}"
        )));
    }
    Ok(())
}

/// A reference to a user as it arrives from the outside: either the opaque
/// id or the wallet address the account is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    /// Opaque user id
    Id(UserId),
    /// Wallet address, lower-cased
    Wallet(String),
}

impl UserRef {
    /// Parse a raw user reference.
    ///
    /// Strings starting with `0x` are wallet addresses and must be hex after
    /// the prefix. Anything else is validated as an opaque id.
    pub fn parse(raw: &str) -> Result<Self, MarketError> {
        let raw = raw.trim();
        if raw.starts_with("0x") || raw.starts_with("0X") {
            validate_wallet(raw)?;
            return Ok(UserRef::Wallet(normalize_wallet(raw)));
        }
        validate_id("user_id", raw)?;
        Ok(UserRef::Id(raw.to_string()))
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "{id}"),
            UserRef::Wallet(wallet) => write!(f, "{wallet}"),
        }
    }
}

/// Validate a wallet address: `0x` followed by at least one hex digit.
pub fn validate_wallet(wallet: &str) -> Result<(), MarketError> {
    let wallet = wallet.trim();
    let hex = wallet
        .strip_prefix("0x")
        .or_else(|| wallet.strip_prefix("0X"))
        .unwrap_or("");
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MarketError::InvalidInput(format!(
            "malformed wallet address: {wallet:?}"
        )));
    }
    Ok(())
}

/// Wallet addresses compare case-insensitively.
pub fn normalize_wallet(wallet: &str) -> String {
    wallet.trim().to_ascii_lowercase()
}
