//! Affinity extraction.
//!
//! Derives a user's tag and creator preferences from the events they
//! produced. Every event counts once per tag of the interacted asset and
//! once for its creator. The top entries by count are kept and normalized
//! against the largest count, so the favourite tag always weighs 1.0.
//!
//! Ties are broken by the earliest interaction that touched the key, then
//! by the key itself, so the result never depends on map iteration order.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use market_types::{AffinityConfig, Asset, InteractionEvent};

use crate::types::AffinityProfile;

#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u64,
    first_seen: DateTime<Utc>,
}

impl Tally {
    fn bump(&mut self, at: DateTime<Utc>) {
        self.count += 1;
        if at < self.first_seen {
            self.first_seen = at;
        }
    }
}

/// Builds [`AffinityProfile`]s from interaction history.
#[derive(Debug, Clone, Default)]
pub struct AffinityExtractor {
    config: AffinityConfig,
}

impl AffinityExtractor {
    pub fn new(config: AffinityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    /// Build a profile from `history` (one user's events, any order).
    ///
    /// Events referencing assets missing from `assets` are skipped. An
    /// empty history yields an empty profile.
    pub fn extract(
        &self,
        history: &[InteractionEvent],
        assets: &HashMap<&str, &Asset>,
    ) -> AffinityProfile {
        let mut events: Vec<&InteractionEvent> = history.iter().collect();
        if let Some(limit) = self.config.history_limit {
            events.sort_by(|a, b| {
                b.timestamp
                    .cmp(&a.timestamp)
                    .then_with(|| b.event_id.cmp(&a.event_id))
            });
            events.truncate(limit);
        }

        let mut tags: HashMap<&str, Tally> = HashMap::new();
        let mut creators: HashMap<&str, Tally> = HashMap::new();

        for event in events {
            let Some(asset) = assets.get(event.asset_id.as_str()) else {
                continue;
            };
            for tag in &asset.tags {
                tally(&mut tags, tag, event.timestamp);
            }
            tally(&mut creators, &asset.creator_id, event.timestamp);
        }

        AffinityProfile {
            tag_weights: top_normalized(tags, self.config.max_tags),
            creator_weights: top_normalized(creators, self.config.max_creators),
        }
    }
}

fn tally<'a>(counts: &mut HashMap<&'a str, Tally>, key: &'a str, at: DateTime<Utc>) {
    counts
        .entry(key)
        .and_modify(|t| t.bump(at))
        .or_insert(Tally {
            count: 1,
            first_seen: at,
        });
}

fn top_normalized(counts: HashMap<&str, Tally>, keep: usize) -> BTreeMap<String, f64> {
    let mut ranked: Vec<(&str, Tally)> = counts.into_iter().collect();
    ranked.sort_by(|(ka, a), (kb, b)| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.first_seen.cmp(&b.first_seen))
            .then_with(|| ka.cmp(kb))
    });
    ranked.truncate(keep);

    let max = ranked.first().map(|(_, t)| t.count).unwrap_or(0);
    if max == 0 {
        return BTreeMap::new();
    }
    ranked
        .into_iter()
        .map(|(key, t)| (key.to_string(), t.count as f64 / max as f64))
        .collect()
}
