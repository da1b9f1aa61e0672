//! Command implementations for the marketplace daemon.
//!
//! Handles:
//! - trending / recommend: run the ranker over the local store
//! - leaderboard: creator and collector rankings
//! - record: append an interaction (bumps counters)
//! - admin: stats, fixture seeding, compaction

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Serialize;
use tracing::info;

use market_ranking::{LeaderboardEntry, Ranker, RocksStore, ScoredCandidate};
use market_storage::Storage;
use market_types::{InteractionEvent, InteractionType, RankingConfig, Settings, UserRef};

use crate::cli::{AdminCommands, Cli, Commands, LeaderboardCommands};
use crate::seed::{seed, Fixture};

/// One ranked row as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct RankedRow {
    pub rank: usize,
    #[serde(flatten)]
    pub candidate: ScoredCandidate,
    pub reason: &'static str,
}

impl RankedRow {
    fn from_results(results: Vec<ScoredCandidate>) -> Vec<Self> {
        results
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| Self {
                rank: i + 1,
                reason: candidate.reason_code.describe(),
                candidate,
            })
            .collect()
    }
}

/// Result of `record`.
#[derive(Debug, Serialize)]
pub struct RecordOutcome {
    pub event_id: String,
    pub created: bool,
}

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    db_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(db_path) = db_path_override {
        settings.db_path = db_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level. Logs go to stderr so stdout stays JSON.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Open (or create) the store at the configured path.
pub fn open_storage(db_path: &Path) -> Result<Arc<Storage>> {
    info!("Opening storage at {:?}", db_path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let storage = Storage::open(db_path).context("Failed to open storage")?;
    Ok(Arc::new(storage))
}

pub fn build_ranker(storage: Arc<Storage>, config: &RankingConfig) -> Ranker<RocksStore> {
    Ranker::new(Arc::new(RocksStore::new(storage)), config.clone())
}

pub async fn handle_trending(
    ranker: &Ranker<RocksStore>,
    limit: Option<i64>,
) -> Result<Vec<RankedRow>> {
    let limit = limit.unwrap_or(ranker.config().default_limit);
    let results = ranker
        .trending(limit)
        .await
        .context("Trending query failed")?;
    Ok(RankedRow::from_results(results))
}

pub async fn handle_recommend(
    ranker: &Ranker<RocksStore>,
    user: &str,
    limit: Option<i64>,
) -> Result<Vec<RankedRow>> {
    let user_ref = UserRef::parse(user).context("Invalid user reference")?;
    let limit = limit.unwrap_or(ranker.config().default_limit);
    let results = ranker
        .recommend_for(&user_ref, limit)
        .await
        .with_context(|| format!("Recommendation for {} failed", user_ref))?;
    Ok(RankedRow::from_results(results))
}

pub async fn handle_leaderboard(
    ranker: &Ranker<RocksStore>,
    board: LeaderboardCommands,
) -> Result<Vec<LeaderboardEntry>> {
    let rows = match board {
        LeaderboardCommands::Creators { limit } => ranker.top_creators(limit).await,
        LeaderboardCommands::Collectors { limit } => ranker.top_collectors(limit).await,
    };
    rows.context("Leaderboard query failed")
}

pub fn handle_record(
    storage: &Storage,
    user: &str,
    asset: &str,
    kind: InteractionType,
    value: Option<f64>,
    at_ms: Option<i64>,
) -> Result<RecordOutcome> {
    let timestamp = match at_ms {
        Some(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .with_context(|| format!("Invalid timestamp {}", ms))?,
        None => Utc::now(),
    };
    let mut event = InteractionEvent::new(user, asset, kind, timestamp);
    if let Some(value) = value {
        event = event.with_value(value);
    }
    let created = storage
        .record_interaction(&event)
        .context("Failed to record interaction")?;
    Ok(RecordOutcome {
        event_id: event.event_id,
        created,
    })
}

pub fn handle_admin(storage: &Storage, command: AdminCommands) -> Result<serde_json::Value> {
    let output = match command {
        AdminCommands::Stats => serde_json::to_value(storage.get_stats()?)?,
        AdminCommands::Seed { file } => {
            let fixture = Fixture::from_file(&file)?;
            serde_json::to_value(seed(storage, &fixture)?)?
        }
        AdminCommands::Compact => {
            storage.compact().context("Compaction failed")?;
            serde_json::json!({ "compacted": true })
        }
    };
    Ok(output)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Entry point for a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(
        cli.config.as_deref(),
        cli.db_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings)?;

    let storage = open_storage(&settings.expanded_db_path())?;

    match cli.command {
        Commands::Trending { limit } => {
            let ranker = build_ranker(storage, &settings.ranking);
            print_json(&handle_trending(&ranker, limit).await?)
        }
        Commands::Recommend { user, limit } => {
            let ranker = build_ranker(storage, &settings.ranking);
            print_json(&handle_recommend(&ranker, &user, limit).await?)
        }
        Commands::Leaderboard { board } => {
            let ranker = build_ranker(storage, &settings.ranking);
            print_json(&handle_leaderboard(&ranker, board).await?)
        }
        Commands::Record {
            user,
            asset,
            kind,
            value,
            at,
        } => print_json(&handle_record(&storage, &user, &asset, kind, value, at)?),
        Commands::Admin { command } => print_json(&handle_admin(&storage, command)?),
    }
}
