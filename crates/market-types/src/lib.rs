//! # market-types
//!
//! Shared domain types for the asset marketplace.
//!
//! This crate defines the records every other crate agrees on:
//! - Users: accounts keyed by wallet address
//! - Assets: marketplace items with owner, creator, tags and counters
//! - Interactions: immutable view/like/purchase/list events
//! - Settings: layered configuration, including the ranking knobs
//!
//! ## Usage
//!
//! ```rust
//! use market_types::{InteractionType, UserRef};
//!
//! let kind: InteractionType = "purchase".parse().unwrap();
//! assert_eq!(kind, InteractionType::Purchase);
//! assert!(matches!(UserRef::parse("0xabc"), Ok(UserRef::Wallet(_))));
//! ```

pub mod asset;
pub mod config;
pub mod error;
pub mod id;
pub mod interaction;
pub mod user;

pub use asset::{Asset, MAX_TAGS};
pub use config::{
    AffinityConfig, PersonalizedWeights, ProfileCacheConfig, RankingConfig, ScoringWeights,
    Settings, TrendingWeights, MAX_TRENDING_WINDOW_DAYS,
};
pub use error::MarketError;
pub use id::{normalize_wallet, validate_id, validate_wallet, AssetId, UserId, UserRef};
pub use interaction::{InteractionEvent, InteractionFilter, InteractionType};
pub use user::User;
