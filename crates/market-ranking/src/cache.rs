//! Time-bounded memoization of affinity profiles.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use market_types::{ProfileCacheConfig, UserId};

use crate::types::AffinityProfile;

/// Bounded LRU of profiles, each valid for at most `ttl`.
pub struct ProfileCache {
    entries: Mutex<LruCache<UserId, (AffinityProfile, Instant)>>,
    ttl: Duration,
}

impl ProfileCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Build from config; `None` when the cache is disabled.
    pub fn from_config(config: &ProfileCacheConfig) -> Option<Self> {
        config
            .is_enabled()
            .then(|| Self::new(config.capacity, Duration::from_secs(config.ttl_secs)))
    }

    /// Fresh profile for `user_id`, if any. Expired entries are dropped.
    pub fn get(&self, user_id: &str) -> Option<AffinityProfile> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match entries.get(user_id) {
            Some((profile, stored_at)) if stored_at.elapsed() < self.ttl => {
                return Some(profile.clone())
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(user_id);
        }
        None
    }

    pub fn insert(&self, user_id: &str, profile: AffinityProfile) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(user_id.to_string(), (profile, Instant::now()));
    }

    pub fn invalidate(&self, user_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.pop(user_id);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn profile(tag: &str) -> AffinityProfile {
        AffinityProfile {
            tag_weights: BTreeMap::from([(tag.to_string(), 1.0)]),
            creator_weights: BTreeMap::new(),
        }
    }

    #[test]
    fn test_disabled_by_default() {
        assert!(ProfileCache::from_config(&ProfileCacheConfig::default()).is_none());
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = ProfileCache::new(4, Duration::from_secs(60));
        cache.insert("u1", profile("art"));
        assert_eq!(cache.get("u1"), Some(profile("art")));
        assert_eq!(cache.get("u2"), None);
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = ProfileCache::new(4, Duration::from_millis(10));
        cache.insert("u1", profile("art"));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("u1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let cache = ProfileCache::new(2, Duration::from_secs(60));
        cache.insert("u1", profile("a"));
        cache.insert("u2", profile("b"));
        cache.insert("u3", profile("c"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("u1"), None);

        cache.invalidate("u3");
        assert_eq!(cache.get("u3"), None);
    }
}
