//! Derived, per-request ranking values. Never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use market_types::{Asset, UserId};

use crate::reason::ReasonCode;

/// Per-user preference weights derived from interaction history.
///
/// Weights are in `(0, 1]`, normalized against the most frequent entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityProfile {
    pub tag_weights: BTreeMap<String, f64>,
    pub creator_weights: BTreeMap<UserId, f64>,
}

impl AffinityProfile {
    /// True when the user has no usable history.
    pub fn is_empty(&self) -> bool {
        self.tag_weights.is_empty() && self.creator_weights.is_empty()
    }

    pub fn has_creator(&self, creator_id: &str) -> bool {
        self.creator_weights.contains_key(creator_id)
    }

    /// Whether `asset` carries at least one tag in the profile.
    pub fn shares_tag(&self, asset: &Asset) -> bool {
        asset.has_any_tag(self.tag_weights.keys())
    }
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub asset: Asset,
    pub score: f64,
    pub reason_code: ReasonCode,
}
