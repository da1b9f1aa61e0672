//! Configuration loading for the marketplace ranking service.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/asset-market/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::MarketError;

/// Weights for the trending score:
/// `views * views_weight + likes * likes_weight + recent * recent_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingWeights {
    #[serde(default = "default_trending_views")]
    pub views: f64,

    #[serde(default = "default_trending_likes")]
    pub likes: f64,

    /// Weight for interactions inside the trailing window
    #[serde(default = "default_trending_recent")]
    pub recent: f64,
}

fn default_trending_views() -> f64 {
    0.3
}

fn default_trending_likes() -> f64 {
    0.5
}

fn default_trending_recent() -> f64 {
    0.2
}

impl Default for TrendingWeights {
    fn default() -> Self {
        Self {
            views: default_trending_views(),
            likes: default_trending_likes(),
            recent: default_trending_recent(),
        }
    }
}

/// Weights for the personalized score.
///
/// The indicator terms (`creator`, `tag`) must stay orders of magnitude
/// above the counter terms so counters only break ties between equally
/// affine candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedWeights {
    /// Added when the asset's creator is in the user's creator affinities
    #[serde(default = "default_creator_weight")]
    pub creator: f64,

    /// Added when the asset shares a tag with the user's tag affinities
    #[serde(default = "default_tag_weight")]
    pub tag: f64,

    #[serde(default = "default_personalized_views")]
    pub views: f64,

    #[serde(default = "default_personalized_likes")]
    pub likes: f64,
}

fn default_creator_weight() -> f64 {
    3.0
}

fn default_tag_weight() -> f64 {
    2.0
}

fn default_personalized_views() -> f64 {
    0.0001
}

fn default_personalized_likes() -> f64 {
    0.001
}

impl Default for PersonalizedWeights {
    fn default() -> Self {
        Self {
            creator: default_creator_weight(),
            tag: default_tag_weight(),
            views: default_personalized_views(),
            likes: default_personalized_likes(),
        }
    }
}

/// All scoring weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default)]
    pub trending: TrendingWeights,

    #[serde(default)]
    pub personalized: PersonalizedWeights,
}

impl ScoringWeights {
    /// Validate that every weight is finite and non-negative.
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("trending.views", self.trending.views),
            ("trending.likes", self.trending.likes),
            ("trending.recent", self.trending.recent),
            ("personalized.creator", self.personalized.creator),
            ("personalized.tag", self.personalized.tag),
            ("personalized.views", self.personalized.views),
            ("personalized.likes", self.personalized.likes),
        ];
        for (name, value) in all {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("weight {name} must be finite and >= 0, got {value}"));
            }
        }
        Ok(())
    }
}

/// Caps for affinity extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityConfig {
    /// Number of tags kept in a profile
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,

    /// Number of creators kept in a profile
    #[serde(default = "default_max_creators")]
    pub max_creators: usize,

    /// Only the most recent N interactions feed the profile (None = all)
    #[serde(default)]
    pub history_limit: Option<usize>,
}

fn default_max_tags() -> usize {
    10
}

fn default_max_creators() -> usize {
    5
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            max_tags: default_max_tags(),
            max_creators: default_max_creators(),
            history_limit: None,
        }
    }
}

/// Optional memoization of affinity profiles.
///
/// Disabled when `ttl_secs` is 0 (the default): every request recomputes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCacheConfig {
    #[serde(default)]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_capacity() -> usize {
    1024
}

impl Default for ProfileCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 0,
            capacity: default_cache_capacity(),
        }
    }
}

impl ProfileCacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.ttl_secs > 0
    }
}

/// Ranking engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Limit used when the caller does not pass one
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Trailing window for "recent" interactions in the trending score
    #[serde(default = "default_trending_window_days")]
    pub trending_window_days: u32,

    /// Per-call bound on store round-trips. Exceeding it is reported as
    /// store unavailability.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    #[serde(default)]
    pub affinity: AffinityConfig,

    #[serde(default)]
    pub weights: ScoringWeights,

    #[serde(default)]
    pub profile_cache: ProfileCacheConfig,
}

fn default_limit() -> i64 {
    10
}

fn default_trending_window_days() -> u32 {
    7
}

fn default_store_timeout_ms() -> u64 {
    3000
}

/// Upper bound for the trending window (100 years).
pub const MAX_TRENDING_WINDOW_DAYS: u32 = 36_500;

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            trending_window_days: default_trending_window_days(),
            store_timeout_ms: default_store_timeout_ms(),
            affinity: AffinityConfig::default(),
            weights: ScoringWeights::default(),
            profile_cache: ProfileCacheConfig::default(),
        }
    }
}

impl RankingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_limit <= 0 {
            return Err(format!(
                "default_limit must be > 0, got {}",
                self.default_limit
            ));
        }
        if self.trending_window_days == 0 || self.trending_window_days > MAX_TRENDING_WINDOW_DAYS {
            return Err(format!(
                "trending_window_days must be in 1..={MAX_TRENDING_WINDOW_DAYS}, got {}",
                self.trending_window_days
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err("store_timeout_ms must be > 0".to_string());
        }
        if self.affinity.max_tags == 0 || self.affinity.max_creators == 0 {
            return Err("affinity caps must be > 0".to_string());
        }
        if self.affinity.history_limit == Some(0) {
            return Err("affinity.history_limit must be > 0 when set".to_string());
        }
        if self.profile_cache.is_enabled() && self.profile_cache.capacity == 0 {
            return Err("profile_cache.capacity must be > 0 when the cache is enabled".to_string());
        }
        self.weights.validate()
    }

    /// Trailing window as a chrono duration, `None` if it does not fit.
    pub fn trending_window(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_days(i64::from(self.trending_window_days))
    }

    /// Store timeout as a std duration.
    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB storage directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Ranking engine settings
    #[serde(default)]
    pub ranking: RankingConfig,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "asset-market")
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            ranking: RankingConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/asset-market/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (MARKET_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, MarketError> {
        let config_dir = ProjectDirs::from("", "", "asset-market")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| MarketError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| MarketError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // MARKET_DB_PATH, MARKET_RANKING__STORE_TIMEOUT_MS, ...
        builder = builder.add_source(
            Environment::with_prefix("MARKET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| MarketError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| MarketError::Config(e.to_string()))?;

        settings.ranking.validate().map_err(MarketError::Config)?;
        Ok(settings)
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.ranking.default_limit, 10);
        assert_eq!(settings.ranking.trending_window_days, 7);
        assert_eq!(settings.ranking.store_timeout_ms, 3000);
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.ranking.affinity.max_tags, 10);
        assert_eq!(settings.ranking.affinity.max_creators, 5);
    }

    #[test]
    fn test_default_weights_are_source_constants() {
        let w = ScoringWeights::default();
        assert!((w.trending.views - 0.3).abs() < f64::EPSILON);
        assert!((w.trending.likes - 0.5).abs() < f64::EPSILON);
        assert!((w.trending.recent - 0.2).abs() < f64::EPSILON);
        assert!((w.personalized.creator - 3.0).abs() < f64::EPSILON);
        assert!((w.personalized.tag - 2.0).abs() < f64::EPSILON);
        assert!((w.personalized.views - 0.0001).abs() < f64::EPSILON);
        assert!((w.personalized.likes - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ranking_config_validation() {
        let mut config = RankingConfig::default();
        assert!(config.validate().is_ok());

        config.store_timeout_ms = 0;
        assert!(config.validate().is_err());

        config = RankingConfig::default();
        config.default_limit = 0;
        assert!(config.validate().is_err());

        config = RankingConfig::default();
        config.weights.trending.likes = f64::NAN;
        assert!(config.validate().is_err());

        config = RankingConfig::default();
        config.affinity.history_limit = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trending_window_is_bounded() {
        let mut config = RankingConfig::default();
        config.trending_window_days = MAX_TRENDING_WINDOW_DAYS;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.trending_window(),
            Some(chrono::Duration::days(i64::from(MAX_TRENDING_WINDOW_DAYS)))
        );

        config.trending_window_days = 200_000_000;
        assert!(config.validate().is_err());

        config.trending_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_profile_cache_disabled_by_default() {
        let config = ProfileCacheConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.capacity, 1024);
    }

    #[test]
    fn test_partial_ranking_config_deserializes_with_defaults() {
        let json = r#"{"trending_window_days": 3, "weights": {"trending": {"likes": 0.9}}}"#;
        let config: RankingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.trending_window_days, 3);
        assert!((config.weights.trending.likes - 0.9).abs() < f64::EPSILON);
        assert!((config.weights.trending.views - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.store_timeout(), std::time::Duration::from_secs(3));
    }
}
