//! # market-ranking
//!
//! Interaction-weighted ranking engine for the asset marketplace.
//!
//! Turns raw interaction events and per-asset counters into two orderings:
//!
//! - **Trending**: global, scored from counters plus activity inside a
//!   trailing window
//! - **Recommend**: per-user, scored from creator and tag affinity derived
//!   from the user's own history, excluding owned and purchased assets
//!
//! ## Core Concepts
//!
//! - [`InteractionStore`]: capability trait the engine reads through
//! - [`AffinityExtractor`]: history -> [`AffinityProfile`]
//! - [`Scorer`]: pure `(asset, profile, mode) -> f64`
//! - [`Ranker`]: orchestration, exclusion, ordering, truncation, per-call timeouts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use market_ranking::{Ranker, RocksStore};
//!
//! let store = Arc::new(RocksStore::new(storage));
//! let ranker = Ranker::new(store, settings.ranking.clone());
//!
//! let trending = ranker.trending(10).await?;
//! let picks = ranker.recommend("user-1", 5).await?;
//! ```

pub mod affinity;
pub mod cache;
pub mod error;
pub mod leaderboard;
pub mod ranker;
pub mod reason;
pub mod rocks;
pub mod scorer;
pub mod store;
pub mod types;

pub use affinity::AffinityExtractor;
pub use cache::ProfileCache;
pub use error::{RankingError, StoreError};
pub use leaderboard::{rank_collectors, rank_creators, LeaderboardEntry};
pub use ranker::Ranker;
pub use reason::ReasonCode;
pub use rocks::RocksStore;
pub use scorer::{ScoreMode, Scorer};
pub use store::{FailingStore, FailureMode, InMemoryStore, InteractionStore};
pub use types::{AffinityProfile, ScoredCandidate};
