//! Scoring functions.
//!
//! Both modes are pure: the same asset, profile and mode always produce the
//! same bits. Terms are summed in a fixed order.

use market_types::{Asset, ScoringWeights};

use crate::types::AffinityProfile;

/// Which formula to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// `views*w + likes*w + recent*w`; `recent_interactions` is the number
    /// of events on the asset inside the trailing window
    Trending { recent_interactions: u64 },
    /// Creator and tag indicators plus counter tie-break terms
    Personalized,
}

/// Weighted scorer.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score `asset` under `mode`. The profile is ignored in trending mode.
    pub fn score(&self, asset: &Asset, profile: &AffinityProfile, mode: ScoreMode) -> f64 {
        match mode {
            ScoreMode::Trending {
                recent_interactions,
            } => self.trending(asset, recent_interactions),
            ScoreMode::Personalized => self.personalized(asset, profile),
        }
    }

    fn trending(&self, asset: &Asset, recent_interactions: u64) -> f64 {
        let w = &self.weights.trending;
        w.views * asset.views as f64
            + w.likes * asset.likes as f64
            + w.recent * recent_interactions as f64
    }

    fn personalized(&self, asset: &Asset, profile: &AffinityProfile) -> f64 {
        let w = &self.weights.personalized;
        let creator = if profile.has_creator(&asset.creator_id) {
            1.0
        } else {
            0.0
        };
        let tag = if profile.shares_tag(asset) { 1.0 } else { 0.0 };
        w.creator * creator
            + w.tag * tag
            + w.views * asset.views as f64
            + w.likes * asset.likes as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn asset(creator: &str, tags: &[&str], views: i64, likes: i64) -> Asset {
        Asset::new("a", creator, Utc::now())
            .with_tags(tags.iter().copied())
            .with_counters(views, likes)
    }

    fn profile() -> AffinityProfile {
        AffinityProfile {
            tag_weights: BTreeMap::from([("art".to_string(), 1.0)]),
            creator_weights: BTreeMap::from([("fav".to_string(), 1.0)]),
        }
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_trending_weights() {
        let scorer = Scorer::default();
        let empty = AffinityProfile::default();

        let x = asset("c", &[], 100, 0);
        let y = asset("c", &[], 0, 20);
        let mode = ScoreMode::Trending {
            recent_interactions: 0,
        };
        assert!(approx_eq(scorer.score(&x, &empty, mode), 30.0));
        assert!(approx_eq(scorer.score(&y, &empty, mode), 10.0));

        let busy = ScoreMode::Trending {
            recent_interactions: 5,
        };
        assert!(approx_eq(scorer.score(&y, &empty, busy), 11.0));
    }

    #[test]
    fn test_trending_ignores_profile() {
        let scorer = Scorer::default();
        let a = asset("fav", &["art"], 10, 10);
        let mode = ScoreMode::Trending {
            recent_interactions: 1,
        };
        assert_eq!(
            scorer.score(&a, &profile(), mode).to_bits(),
            scorer.score(&a, &AffinityProfile::default(), mode).to_bits()
        );
    }

    #[test]
    fn test_personalized_indicator_terms() {
        let scorer = Scorer::default();
        let p = profile();

        let both = asset("fav", &["art"], 0, 0);
        let creator_only = asset("fav", &["music"], 0, 0);
        let tag_only = asset("other", &["art"], 0, 0);
        let neither = asset("other", &["music"], 0, 0);

        assert!(approx_eq(scorer.score(&both, &p, ScoreMode::Personalized), 5.0));
        assert!(approx_eq(
            scorer.score(&creator_only, &p, ScoreMode::Personalized),
            3.0
        ));
        assert!(approx_eq(
            scorer.score(&tag_only, &p, ScoreMode::Personalized),
            2.0
        ));
        assert_eq!(scorer.score(&neither, &p, ScoreMode::Personalized), 0.0);
    }

    #[test]
    fn test_counters_only_break_ties() {
        let scorer = Scorer::default();
        let p = profile();

        let popular_tag_only = asset("other", &["art"], 1_000, 100);
        let quiet_creator = asset("fav", &[], 0, 0);
        assert!(
            scorer.score(&quiet_creator, &p, ScoreMode::Personalized)
                > scorer.score(&popular_tag_only, &p, ScoreMode::Personalized)
        );

        let empty = AffinityProfile::default();
        let pop = asset("other", &[], 5, 2);
        assert!(approx_eq(
            scorer.score(&pop, &empty, ScoreMode::Personalized),
            0.0025
        ));
    }

    #[test]
    fn test_score_is_bit_identical_across_calls() {
        let scorer = Scorer::default();
        let a = asset("fav", &["art"], 123, 45);
        let first = scorer.score(&a, &profile(), ScoreMode::Personalized);
        for _ in 0..10 {
            assert_eq!(
                scorer.score(&a, &profile(), ScoreMode::Personalized).to_bits(),
                first.to_bits()
            );
        }
    }
}
