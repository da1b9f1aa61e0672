//! Creator and collector leaderboards.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use market_types::{Asset, User};

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user: User,
    /// Assets created (creators) or currently owned (collectors)
    pub asset_count: u64,
    /// Likes summed over those assets
    pub total_likes: i64,
}

#[derive(Default)]
struct Totals {
    assets: u64,
    likes: i64,
}

fn totals_by<'a>(
    assets: &'a [Asset],
    key: impl Fn(&'a Asset) -> &'a str,
) -> HashMap<&'a str, Totals> {
    let mut totals: HashMap<&str, Totals> = HashMap::new();
    for asset in assets {
        let entry = totals.entry(key(asset)).or_default();
        entry.assets += 1;
        entry.likes = entry.likes.saturating_add(asset.likes);
    }
    totals
}

fn build(
    users: &[User],
    totals: &HashMap<&str, Totals>,
    limit: usize,
    order: impl Fn(&LeaderboardEntry, &LeaderboardEntry) -> Ordering,
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<LeaderboardEntry> = users
        .iter()
        .filter_map(|user| {
            totals
                .get(user.user_id.as_str())
                .filter(|t| t.assets > 0)
                .map(|t| LeaderboardEntry {
                    user: user.clone(),
                    asset_count: t.assets,
                    total_likes: t.likes,
                })
        })
        .collect();
    rows.sort_by(|a, b| order(a, b).then_with(|| a.user.user_id.cmp(&b.user.user_id)));
    rows.truncate(limit);
    rows
}

/// Users ranked by number of assets created.
pub fn rank_creators(users: &[User], assets: &[Asset], limit: usize) -> Vec<LeaderboardEntry> {
    let totals = totals_by(assets, |a| a.creator_id.as_str());
    build(users, &totals, limit, |a, b| b.asset_count.cmp(&a.asset_count))
}

/// Users ranked by number of assets owned, then by likes on those assets.
pub fn rank_collectors(users: &[User], assets: &[Asset], limit: usize) -> Vec<LeaderboardEntry> {
    let totals = totals_by(assets, |a| a.owner_id.as_str());
    build(users, &totals, limit, |a, b| {
        b.asset_count
            .cmp(&a.asset_count)
            .then_with(|| b.total_likes.cmp(&a.total_likes))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn users() -> Vec<User> {
        ["alice", "bob", "carol", "dave"]
            .iter()
            .enumerate()
            .map(|(i, id)| User::new(*id, &format!("0x{i:040x}"), Utc::now()))
            .collect()
    }

    fn ids(rows: &[LeaderboardEntry]) -> Vec<&str> {
        rows.iter().map(|r| r.user.user_id.as_str()).collect()
    }

    #[test]
    fn test_creators_by_count_then_id() {
        let now = Utc::now();
        let assets = vec![
            Asset::new("a1", "bob", now),
            Asset::new("a2", "bob", now),
            Asset::new("a3", "carol", now),
            Asset::new("a4", "alice", now),
        ];
        let rows = rank_creators(&users(), &assets, 10);
        assert_eq!(ids(&rows), vec!["bob", "alice", "carol"]);
        assert_eq!(rows[0].asset_count, 2);
    }

    #[test]
    fn test_collectors_break_ties_on_likes() {
        let now = Utc::now();
        let assets = vec![
            Asset::new("a1", "bob", now).with_owner("alice").with_counters(0, 1),
            Asset::new("a2", "bob", now).with_owner("carol").with_counters(0, 9),
            Asset::new("a3", "bob", now).with_owner("dave").with_counters(0, 9),
        ];
        let rows = rank_collectors(&users(), &assets, 2);
        assert_eq!(ids(&rows), vec!["carol", "dave"]);
        assert_eq!(rows[0].total_likes, 9);
    }

    #[test]
    fn test_collector_likes_saturate() {
        let now = Utc::now();
        let assets = vec![
            Asset::new("a1", "bob", now).with_owner("alice").with_counters(0, i64::MAX - 1),
            Asset::new("a2", "bob", now).with_owner("alice").with_counters(0, i64::MAX - 1),
        ];
        let rows = rank_collectors(&users(), &assets, 1);
        assert_eq!(rows[0].total_likes, i64::MAX);
        assert_eq!(rows[0].asset_count, 2);
    }

    #[test]
    fn test_users_without_assets_are_omitted() {
        let rows = rank_creators(&users(), &[], 10);
        assert!(rows.is_empty());
    }
}
