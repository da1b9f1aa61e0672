//! Interaction events.
//!
//! Events are immutable records of a user acting on an asset. Ordering
//! within a user is by `timestamp`; several events per (user, asset) pair
//! are allowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::id::{AssetId, UserId};

/// Kind of interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Asset detail was viewed
    View,
    /// Asset was liked
    Like,
    /// Asset was bought
    Purchase,
    /// Asset was put up for sale
    List,
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionType::View => write!(f, "view"),
            InteractionType::Like => write!(f, "like"),
            InteractionType::Purchase => write!(f, "purchase"),
            InteractionType::List => write!(f, "list"),
        }
    }
}

impl std::str::FromStr for InteractionType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(InteractionType::View),
            "like" => Ok(InteractionType::Like),
            "purchase" => Ok(InteractionType::Purchase),
            "list" => Ok(InteractionType::List),
            other => Err(MarketError::InvalidInput(format!(
                "unknown interaction type: {other}"
            ))),
        }
    }
}

/// A single user interaction with an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Unique identifier (ULID string)
    pub event_id: String,

    /// Acting user
    pub user_id: UserId,

    /// Target asset
    pub asset_id: AssetId,

    /// What happened
    pub interaction_type: InteractionType,

    /// Free-form magnitude (price for purchases, 1.0 otherwise)
    #[serde(default = "default_value")]
    pub value: f64,

    /// When the interaction happened
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

fn default_value() -> f64 {
    1.0
}

impl InteractionEvent {
    /// Create an event with a fresh ULID whose time part matches `timestamp`.
    pub fn new(
        user_id: impl Into<UserId>,
        asset_id: impl Into<AssetId>,
        interaction_type: InteractionType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let ts_ms = timestamp.timestamp_millis().max(0) as u64;
        Self {
            event_id: ulid::Ulid::from_datetime(
                std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts_ms),
            )
            .to_string(),
            user_id: user_id.into(),
            asset_id: asset_id.into(),
            interaction_type,
            value: default_value(),
            timestamp,
        }
    }

    /// Set the interaction value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Get timestamp as milliseconds since Unix epoch
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Serialize event to JSON bytes for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize event from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Selection over the interaction log.
///
/// Every field is optional; unset fields match everything. `since` and
/// `until` are both inclusive, so a window of "the last 7 days up to now"
/// is `since = now - 7d, until = now`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionFilter {
    pub user_id: Option<UserId>,
    pub asset_id: Option<AssetId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl InteractionFilter {
    /// Filter matching every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a single user.
    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Restrict to a single asset.
    pub fn for_asset(asset_id: impl Into<AssetId>) -> Self {
        Self {
            asset_id: Some(asset_id.into()),
            ..Self::default()
        }
    }

    /// Restrict to `[since, until]`.
    pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Whether `event` satisfies every set constraint.
    pub fn matches(&self, event: &InteractionEvent) -> bool {
        if let Some(user_id) = &self.user_id {
            if &event.user_id != user_id {
                return false;
            }
        }
        if let Some(asset_id) = &self.asset_id {
            if &event.asset_id != asset_id {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp > until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_type_parse() {
        assert_eq!(
            "Purchase".parse::<InteractionType>().unwrap(),
            InteractionType::Purchase
        );
        assert!("gift".parse::<InteractionType>().is_err());
        assert_eq!(InteractionType::List.to_string(), "list");
    }

    #[test]
    fn test_event_id_carries_timestamp() {
        let ts = chrono::TimeZone::timestamp_millis_opt(&Utc, 1_706_540_400_000).unwrap();
        let event = InteractionEvent::new("u1", "a1", InteractionType::View, ts);
        let ulid: ulid::Ulid = event.event_id.parse().unwrap();
        assert_eq!(ulid.timestamp_ms(), 1_706_540_400_000);
        assert!((event.value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_event_type_serializes_snake_case() {
        let event = InteractionEvent::new("u1", "a1", InteractionType::Like, Utc::now());
        let json = String::from_utf8(event.to_bytes().unwrap()).unwrap();
        assert!(json.contains(r#""interaction_type":"like""#));
    }

    #[test]
    fn test_filter_window_is_inclusive_on_both_ends() {
        let now = Utc::now();
        let since = now - chrono::Duration::days(7);
        let filter = InteractionFilter::all().between(since, now);

        let at_boundary = InteractionEvent::new("u1", "a1", InteractionType::View, since);
        let at_now = InteractionEvent::new("u1", "a1", InteractionType::View, now);
        let before = InteractionEvent::new(
            "u1",
            "a1",
            InteractionType::View,
            since - chrono::Duration::milliseconds(1),
        );
        let future = InteractionEvent::new(
            "u1",
            "a1",
            InteractionType::View,
            now + chrono::Duration::milliseconds(1),
        );

        assert!(filter.matches(&at_boundary));
        assert!(filter.matches(&at_now));
        assert!(!filter.matches(&before));
        assert!(!filter.matches(&future));
    }

    #[test]
    fn test_filter_by_user_and_asset() {
        let event = InteractionEvent::new("u1", "a1", InteractionType::Like, Utc::now());
        assert!(InteractionFilter::for_user("u1").matches(&event));
        assert!(!InteractionFilter::for_user("u2").matches(&event));
        assert!(InteractionFilter::for_asset("a1").matches(&event));
        assert!(!InteractionFilter::for_asset("a2").matches(&event));
    }
}
