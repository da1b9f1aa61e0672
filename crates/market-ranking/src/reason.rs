//! Reason codes attached to ranked results.

use std::fmt;

use serde::{Deserialize, Serialize};

use market_types::Asset;

use crate::types::AffinityProfile;

/// Why an asset appears in a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCode {
    /// Creator is in the user's affinity profile
    CreatorAffinity,
    /// At least one tag overlaps the user's affinity profile
    TagAffinity,
    /// No affinity signal; ordered by counters only
    PopularityFallback,
    /// Global trending list
    Trending,
}

impl ReasonCode {
    /// Fixed-priority classification of a personalized candidate.
    pub fn for_candidate(asset: &Asset, profile: &AffinityProfile) -> Self {
        if profile.has_creator(&asset.creator_id) {
            ReasonCode::CreatorAffinity
        } else if profile.shares_tag(asset) {
            ReasonCode::TagAffinity
        } else {
            ReasonCode::PopularityFallback
        }
    }

    /// Stable identifier, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::CreatorAffinity => "creator-affinity",
            ReasonCode::TagAffinity => "tag-affinity",
            ReasonCode::PopularityFallback => "popularity-fallback",
            ReasonCode::Trending => "trending",
        }
    }

    /// Human-readable sentence for display.
    pub fn describe(&self) -> &'static str {
        match self {
            ReasonCode::CreatorAffinity => "From a creator you interact with",
            ReasonCode::TagAffinity => "Similar to assets you have interacted with",
            ReasonCode::PopularityFallback => "Popular on the marketplace",
            ReasonCode::Trending => "Trending this week",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn profile() -> AffinityProfile {
        AffinityProfile {
            tag_weights: BTreeMap::from([("art".to_string(), 1.0)]),
            creator_weights: BTreeMap::from([("maker".to_string(), 1.0)]),
        }
    }

    #[test]
    fn test_creator_takes_priority_over_tag() {
        let asset = Asset::new("a1", "maker", Utc::now()).with_tags(["art"]);
        assert_eq!(
            ReasonCode::for_candidate(&asset, &profile()),
            ReasonCode::CreatorAffinity
        );
    }

    #[test]
    fn test_tag_then_fallback() {
        let tagged = Asset::new("a1", "other", Utc::now()).with_tags(["art", "3d"]);
        assert_eq!(
            ReasonCode::for_candidate(&tagged, &profile()),
            ReasonCode::TagAffinity
        );

        let plain = Asset::new("a2", "other", Utc::now()).with_tags(["music"]);
        assert_eq!(
            ReasonCode::for_candidate(&plain, &profile()),
            ReasonCode::PopularityFallback
        );
    }

    #[test]
    fn test_serialized_form_matches_as_str() {
        for code in [
            ReasonCode::CreatorAffinity,
            ReasonCode::TagAffinity,
            ReasonCode::PopularityFallback,
            ReasonCode::Trending,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            assert!(!code.describe().is_empty());
        }
    }
}
