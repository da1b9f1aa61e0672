//! Ranking orchestration.
//!
//! The [`Ranker`] pulls records from an [`InteractionStore`], applies the
//! exclusion rules, scores every candidate and returns an ordered, capped
//! list. It holds no mutable state besides the optional profile cache, so
//! one instance may serve concurrent requests.
//!
//! Every store call is bounded by `store_timeout_ms`; a call that does not
//! finish in time is reported as [`RankingError::StoreUnavailable`].

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use market_types::{
    validate_id, Asset, InteractionEvent, InteractionFilter, InteractionType, RankingConfig, User,
    UserRef,
};

use crate::affinity::AffinityExtractor;
use crate::cache::ProfileCache;
use crate::error::{RankingError, StoreError};
use crate::leaderboard::{rank_collectors, rank_creators, LeaderboardEntry};
use crate::reason::ReasonCode;
use crate::scorer::{ScoreMode, Scorer};
use crate::store::InteractionStore;
use crate::types::{AffinityProfile, ScoredCandidate};

/// Trending and recommendation entry point.
pub struct Ranker<S: InteractionStore> {
    store: Arc<S>,
    config: RankingConfig,
    extractor: AffinityExtractor,
    scorer: Scorer,
    timeout: Duration,
    profile_cache: Option<ProfileCache>,
}

impl<S: InteractionStore> Ranker<S> {
    /// Create a ranker over `store`.
    ///
    /// `config` is expected to have passed [`RankingConfig::validate`].
    pub fn new(store: Arc<S>, config: RankingConfig) -> Self {
        Self {
            extractor: AffinityExtractor::new(config.affinity.clone()),
            scorer: Scorer::new(config.weights.clone()),
            timeout: config.store_timeout(),
            profile_cache: ProfileCache::from_config(&config.profile_cache),
            store,
            config,
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Global trending list as of now.
    pub async fn trending(&self, limit: i64) -> Result<Vec<ScoredCandidate>, RankingError> {
        self.trending_at(limit, Utc::now()).await
    }

    /// Global trending list as of `now`.
    ///
    /// Recent activity counts events in `[now - window, now]`.
    pub async fn trending_at(
        &self,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredCandidate>, RankingError> {
        let limit = check_limit(limit)?;

        let assets = self
            .bounded("fetch_assets", self.store.fetch_assets())
            .await?;
        check_assets(&assets)?;

        let since = self
            .config
            .trending_window()
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                RankingError::InvalidArgument(format!(
                    "trending window of {} days is out of range",
                    self.config.trending_window_days
                ))
            })?;
        let window = InteractionFilter::all().between(since, now);
        let recent = self
            .bounded("fetch_interactions", self.store.fetch_interactions(&window))
            .await?;

        let mut recent_counts: HashMap<&str, u64> = HashMap::new();
        for event in &recent {
            *recent_counts.entry(event.asset_id.as_str()).or_default() += 1;
        }

        let empty = AffinityProfile::default();
        let mut results: Vec<ScoredCandidate> = assets
            .into_iter()
            .map(|asset| {
                let mode = ScoreMode::Trending {
                    recent_interactions: recent_counts
                        .get(asset.asset_id.as_str())
                        .copied()
                        .unwrap_or(0),
                };
                ScoredCandidate {
                    score: self.scorer.score(&asset, &empty, mode),
                    asset,
                    reason_code: ReasonCode::Trending,
                }
            })
            .collect();

        let candidates = results.len();
        sort_candidates(&mut results);
        results.truncate(limit);

        info!(
            candidates,
            recent_events = recent.len(),
            returned = results.len(),
            "Computed trending"
        );
        Ok(results)
    }

    /// Personalized list for `user_id`.
    ///
    /// Excludes assets the user owns and assets the user has a `purchase`
    /// event for. A user with no history gets a pure popularity ordering.
    pub async fn recommend(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ScoredCandidate>, RankingError> {
        let limit = check_limit(limit)?;
        let user = self.require_user(user_id).await?;

        let history = self.user_history(&user.user_id).await?;
        let assets = self
            .bounded("fetch_assets", self.store.fetch_assets())
            .await?;
        check_assets(&assets)?;

        let profile = self.profile_from(&user.user_id, &history, &assets);

        let purchased: HashSet<&str> = history
            .iter()
            .filter(|e| e.interaction_type == InteractionType::Purchase)
            .map(|e| e.asset_id.as_str())
            .collect();

        let mut results: Vec<ScoredCandidate> = assets
            .iter()
            .filter(|a| a.owner_id != user.user_id && !purchased.contains(a.asset_id.as_str()))
            .map(|asset| ScoredCandidate {
                score: self.scorer.score(asset, &profile, ScoreMode::Personalized),
                reason_code: ReasonCode::for_candidate(asset, &profile),
                asset: asset.clone(),
            })
            .collect();

        let candidates = results.len();
        sort_candidates(&mut results);
        results.truncate(limit);

        info!(
            user_id = %user.user_id,
            history = history.len(),
            tags = profile.tag_weights.len(),
            creators = profile.creator_weights.len(),
            candidates,
            returned = results.len(),
            "Computed recommendations"
        );
        Ok(results)
    }

    /// Personalized list for a user given by id or wallet address.
    pub async fn recommend_for(
        &self,
        user_ref: &UserRef,
        limit: i64,
    ) -> Result<Vec<ScoredCandidate>, RankingError> {
        match user_ref {
            UserRef::Id(user_id) => self.recommend(user_id, limit).await,
            UserRef::Wallet(wallet) => {
                check_limit(limit)?;
                let user = self
                    .bounded(
                        "find_user_by_wallet",
                        self.store.find_user_by_wallet(wallet),
                    )
                    .await?
                    .ok_or_else(|| RankingError::NotFound(format!("wallet {}", wallet)))?;
                debug!(wallet = %wallet, user_id = %user.user_id, "Resolved wallet");
                self.recommend(&user.user_id, limit).await
            }
        }
    }

    /// Affinity profile of `user_id`.
    ///
    /// Fails with `NotFound` for an unknown user; a known user without
    /// history gets an empty profile.
    pub async fn extract_affinity(&self, user_id: &str) -> Result<AffinityProfile, RankingError> {
        let user = self.require_user(user_id).await?;
        if let Some(profile) = self.cached_profile(&user.user_id) {
            return Ok(profile);
        }

        let history = self.user_history(&user.user_id).await?;
        let assets = self
            .bounded("fetch_assets", self.store.fetch_assets())
            .await?;
        check_assets(&assets)?;
        Ok(self.profile_from(&user.user_id, &history, &assets))
    }

    /// Users ranked by number of assets created.
    pub async fn top_creators(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, RankingError> {
        let limit = check_limit(limit)?;
        let (users, assets) = self.users_and_assets().await?;
        Ok(rank_creators(&users, &assets, limit))
    }

    /// Users ranked by number of assets owned, then likes on them.
    pub async fn top_collectors(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, RankingError> {
        let limit = check_limit(limit)?;
        let (users, assets) = self.users_and_assets().await?;
        Ok(rank_collectors(&users, &assets, limit))
    }

    async fn users_and_assets(&self) -> Result<(Vec<User>, Vec<Asset>), RankingError> {
        let users = self
            .bounded("fetch_users", self.store.fetch_users())
            .await?;
        let assets = self
            .bounded("fetch_assets", self.store.fetch_assets())
            .await?;
        check_assets(&assets)?;
        Ok((users, assets))
    }

    async fn require_user(&self, user_id: &str) -> Result<User, RankingError> {
        validate_id("user_id", user_id)?;
        self.bounded("get_user", self.store.get_user(user_id))
            .await?
            .ok_or_else(|| RankingError::NotFound(format!("user {}", user_id)))
    }

    async fn user_history(&self, user_id: &str) -> Result<Vec<InteractionEvent>, RankingError> {
        self.bounded(
            "fetch_interactions",
            self.store
                .fetch_interactions(&InteractionFilter::for_user(user_id)),
        )
        .await
    }

    fn cached_profile(&self, user_id: &str) -> Option<AffinityProfile> {
        let profile = self.profile_cache.as_ref()?.get(user_id)?;
        debug!(user_id, "Profile cache hit");
        Some(profile)
    }

    fn profile_from(
        &self,
        user_id: &str,
        history: &[InteractionEvent],
        assets: &[Asset],
    ) -> AffinityProfile {
        if let Some(profile) = self.cached_profile(user_id) {
            return profile;
        }
        let by_id: HashMap<&str, &Asset> =
            assets.iter().map(|a| (a.asset_id.as_str(), a)).collect();
        let profile = self.extractor.extract(history, &by_id);
        if let Some(cache) = &self.profile_cache {
            cache.insert(user_id, profile.clone());
        }
        profile
    }

    /// Run one store call under the configured timeout.
    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, RankingError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(op, error = %e, "Store call failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out");
                Err(RankingError::StoreUnavailable(format!(
                    "{} timed out after {}ms",
                    op,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

fn check_limit(limit: i64) -> Result<usize, RankingError> {
    if limit <= 0 {
        return Err(RankingError::InvalidArgument(format!(
            "limit must be a positive integer, got {}",
            limit
        )));
    }
    usize::try_from(limit)
        .map_err(|_| RankingError::InvalidArgument(format!("limit too large: {}", limit)))
}

fn check_assets(assets: &[Asset]) -> Result<(), RankingError> {
    for asset in assets {
        if let Err(violation) = asset.check_invariants() {
            warn!(asset_id = %asset.asset_id, %violation, "Invariant violation");
            return Err(RankingError::Internal(violation));
        }
    }
    Ok(())
}

/// Score descending, then newest first, then asset id.
fn sort_candidates(results: &mut [ScoredCandidate]) {
    results.sort_by(compare_candidates);
}

fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.asset.created_at.cmp(&a.asset.created_at))
        .then_with(|| a.asset.asset_id.cmp(&b.asset.asset_id))
}
