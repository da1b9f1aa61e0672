//! Key encoding and decoding for storage layer.
//!
//! Interaction log keys: `ix:{timestamp_ms:013}:{ulid}`
//! Scoped index keys:    `{ux|ax}:{owner_id}:{timestamp_ms:013}:{ulid}`
//!
//! - timestamp_ms: interaction time in ms since Unix epoch, zero-padded to 13
//!   digits so lexicographic order is time order
//! - ulid: the event id, unique within the same millisecond
//! - owner_id: user id (`ux`) or asset id (`ax`); ids never contain `:`

use ulid::Ulid;

use crate::error::StorageError;

const LOG_PREFIX: &str = "ix";

fn parse_timestamp(raw: &str) -> Result<i64, StorageError> {
    raw.parse()
        .map_err(|e| StorageError::Key(format!("Invalid timestamp: {}", e)))
}

fn parse_ulid(raw: &str) -> Result<Ulid, StorageError> {
    raw.parse()
        .map_err(|e| StorageError::Key(format!("Invalid ULID: {}", e)))
}

const MAX_TIMESTAMP_MS: i64 = 9_999_999_999_999;

/// Exclusive upper bound segment for events at or before `end_ms`.
/// `~` sorts after every digit, so it closes the range past the last encodable ms.
fn end_segment(end_ms: i64) -> String {
    if end_ms >= MAX_TIMESTAMP_MS {
        "~".to_string()
    } else {
        format!("{:013}:", end_ms.saturating_add(1).max(0))
    }
}

fn check_timestamp(timestamp_ms: i64) -> Result<(), StorageError> {
    if !(0..=MAX_TIMESTAMP_MS).contains(&timestamp_ms) {
        return Err(StorageError::Key(format!(
            "timestamp out of encodable range: {}",
            timestamp_ms
        )));
    }
    Ok(())
}

/// Key for the time-ordered interaction log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionKey {
    /// Interaction timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Event id
    pub ulid: Ulid,
}

impl InteractionKey {
    /// Build a key from an event's timestamp and id.
    pub fn new(timestamp_ms: i64, event_id: &str) -> Result<Self, StorageError> {
        check_timestamp(timestamp_ms)?;
        Ok(Self {
            timestamp_ms,
            ulid: parse_ulid(event_id)?,
        })
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}:{:013}:{}", LOG_PREFIX, self.timestamp_ms, self.ulid).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != LOG_PREFIX {
            return Err(StorageError::Key(format!(
                "Invalid interaction key format: {}",
                s
            )));
        }

        Ok(Self {
            timestamp_ms: parse_timestamp(parts[1])?,
            ulid: parse_ulid(parts[2])?,
        })
    }

    /// Scan start for events at or after `start_ms`
    pub fn prefix_start(start_ms: i64) -> Vec<u8> {
        format!("{}:{:013}:", LOG_PREFIX, start_ms.clamp(0, MAX_TIMESTAMP_MS)).into_bytes()
    }

    /// Scan end (exclusive) for events at or before `end_ms`
    pub fn prefix_end(end_ms: i64) -> Vec<u8> {
        format!("{}:{}", LOG_PREFIX, end_segment(end_ms)).into_bytes()
    }
}

/// Which secondary index a scoped key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Keyed by acting user
    User,
    /// Keyed by target asset
    Asset,
}

impl Scope {
    fn prefix(self) -> &'static str {
        match self {
            Scope::User => "ux",
            Scope::Asset => "ax",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "ux" => Some(Scope::User),
            "ax" => Some(Scope::Asset),
            _ => None,
        }
    }
}

/// Key for the per-user and per-asset interaction indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedInteractionKey {
    pub scope: Scope,
    /// User id or asset id, depending on scope
    pub owner_id: String,
    pub timestamp_ms: i64,
    pub ulid: Ulid,
}

impl ScopedInteractionKey {
    /// Build a scoped key from an interaction log key.
    pub fn new(scope: Scope, owner_id: &str, key: &InteractionKey) -> Self {
        Self {
            scope,
            owner_id: owner_id.to_string(),
            timestamp_ms: key.timestamp_ms,
            ulid: key.ulid,
        }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "{}:{}:{:013}:{}",
            self.scope.prefix(),
            self.owner_id,
            self.timestamp_ms,
            self.ulid
        )
        .into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let parts: Vec<&str> = s.split(':').collect();
        let scope = parts.first().and_then(|p| Scope::from_prefix(p));
        match (scope, parts.len()) {
            (Some(scope), 4) => Ok(Self {
                scope,
                owner_id: parts[1].to_string(),
                timestamp_ms: parse_timestamp(parts[2])?,
                ulid: parse_ulid(parts[3])?,
            }),
            _ => Err(StorageError::Key(format!("Invalid scoped key format: {}", s))),
        }
    }

    /// Scan start for `owner_id`'s events at or after `start_ms`
    pub fn prefix_start(scope: Scope, owner_id: &str, start_ms: i64) -> Vec<u8> {
        format!(
            "{}:{}:{:013}:",
            scope.prefix(),
            owner_id,
            start_ms.clamp(0, MAX_TIMESTAMP_MS)
        )
        .into_bytes()
    }

    /// Scan end (exclusive) for `owner_id`'s events at or before `end_ms`
    pub fn prefix_end(scope: Scope, owner_id: &str, end_ms: i64) -> Vec<u8> {
        format!("{}:{}:{}", scope.prefix(), owner_id, end_segment(end_ms)).into_bytes()
    }
}
