//! CLI argument parsing for the marketplace daemon.
//!
//! CLI flags override every other config source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use market_types::InteractionType;

/// Asset marketplace ranking daemon
///
/// Trending and personalized rankings over the local interaction store.
#[derive(Parser, Debug)]
#[command(name = "marketd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/asset-market/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Globally trending assets
    Trending {
        /// Maximum results (default from config)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Personalized recommendations for a user
    Recommend {
        /// User id or wallet address (0x...)
        user: String,

        /// Maximum results (default from config)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Creator and collector leaderboards
    Leaderboard {
        #[command(subcommand)]
        board: LeaderboardCommands,
    },

    /// Record an interaction event
    Record {
        /// Acting user id
        user: String,

        /// Target asset id
        asset: String,

        /// Interaction type (view, like, purchase, list)
        #[arg(short, long, default_value = "view", value_parser = parse_interaction_type)]
        kind: InteractionType,

        /// Interaction value
        #[arg(long)]
        value: Option<f64>,

        /// Event time (Unix ms, default now)
        #[arg(long)]
        at: Option<i64>,
    },

    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

/// Leaderboard subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum LeaderboardCommands {
    /// Users with the most created assets
    Creators {
        #[arg(short = 'n', long, default_value = "10", allow_negative_numbers = true)]
        limit: i64,
    },

    /// Users with the most owned assets
    Collectors {
        #[arg(short = 'n', long, default_value = "10", allow_negative_numbers = true)]
        limit: i64,
    },
}

/// Admin subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommands {
    /// Show database statistics
    Stats,

    /// Import users, assets and interactions from a JSON fixture
    Seed {
        /// Fixture file
        file: PathBuf,
    },

    /// Trigger RocksDB compaction
    Compact,
}

fn parse_interaction_type(raw: &str) -> Result<InteractionType, String> {
    raw.parse().map_err(|e: market_types::MarketError| e.to_string())
}
