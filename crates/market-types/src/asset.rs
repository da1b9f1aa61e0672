//! Marketplace assets.
//!
//! An asset carries its owner/creator identity, a small tag set used for
//! affinity matching, and the aggregate `views`/`likes` counters that the
//! CRUD layer increments.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AssetId, UserId};

/// Upper bound on the number of tags an asset may carry.
pub const MAX_TAGS: usize = 32;

/// A marketplace item.
///
/// Counters are signed because they are read from an external store that
/// may hand back corrupted values. `check_invariants` reports those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Opaque identifier
    pub asset_id: AssetId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// User who minted the asset
    pub creator_id: UserId,

    /// Current owner
    pub owner_id: UserId,

    /// Tag set used for affinity matching
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// View counter (monotonic)
    #[serde(default)]
    pub views: i64,

    /// Like counter (monotonic)
    #[serde(default)]
    pub likes: i64,

    /// Creation time, used as the ranking tie-break
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Create an asset with zeroed counters and no tags.
    pub fn new(
        asset_id: impl Into<AssetId>,
        creator_id: impl Into<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let creator_id = creator_id.into();
        Self {
            asset_id: asset_id.into(),
            name: String::new(),
            owner_id: creator_id.clone(),
            creator_id,
            tags: BTreeSet::new(),
            views: 0,
            likes: 0,
            created_at,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the current owner.
    pub fn with_owner(mut self, owner_id: impl Into<UserId>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    /// Replace the tag set.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set both counters.
    pub fn with_counters(mut self, views: i64, likes: i64) -> Self {
        self.views = views;
        self.likes = likes;
        self
    }

    /// Whether the asset shares at least one tag with `other`.
    pub fn has_any_tag<'a>(&self, mut other: impl Iterator<Item = &'a String>) -> bool {
        other.any(|tag| self.tags.contains(tag))
    }

    /// Check the record invariants: non-negative counters, bounded tag set.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.views < 0 {
            return Err(format!(
                "asset {} has negative views counter {}",
                self.asset_id, self.views
            ));
        }
        if self.likes < 0 {
            return Err(format!(
                "asset {} has negative likes counter {}",
                self.asset_id, self.likes
            ));
        }
        if self.tags.len() > MAX_TAGS {
            return Err(format!(
                "asset {} carries {} tags (max {})",
                self.asset_id,
                self.tags.len(),
                MAX_TAGS
            ));
        }
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_asset_owned_by_creator() {
        let asset = Asset::new("a1", "creator", Utc::now());
        assert_eq!(asset.owner_id, "creator");
        assert_eq!(asset.views, 0);
        assert!(asset.tags.is_empty());
    }

    #[test]
    fn test_tags_are_a_set() {
        let asset = Asset::new("a1", "c", Utc::now()).with_tags(["art", "art", "music"]);
        assert_eq!(asset.tags.len(), 2);
        let wanted = ["music".to_string()];
        assert!(asset.has_any_tag(wanted.iter()));
    }

    #[test]
    fn test_negative_counter_violates_invariants() {
        let asset = Asset::new("a1", "c", Utc::now()).with_counters(-1, 0);
        let err = asset.check_invariants().unwrap_err();
        assert!(err.contains("negative views"));
    }

    #[test]
    fn test_too_many_tags_violates_invariants() {
        let asset =
            Asset::new("a1", "c", Utc::now()).with_tags((0..=MAX_TAGS).map(|i| format!("t{i}")));
        assert!(asset.check_invariants().is_err());
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let json = r#"{"asset_id":"a1","creator_id":"c","owner_id":"o","created_at":1706540400000}"#;
        let asset = Asset::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(asset.views, 0);
        assert_eq!(asset.likes, 0);
        assert!(asset.check_invariants().is_ok());
    }
}
