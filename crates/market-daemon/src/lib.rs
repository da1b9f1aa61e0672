//! Marketplace daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations
//! - `seed`: JSON fixture import

pub mod cli;
pub mod commands;
pub mod seed;

pub use cli::{AdminCommands, Cli, Commands, LeaderboardCommands};
pub use commands::{
    build_ranker, handle_admin, handle_leaderboard, handle_recommend, handle_record,
    handle_trending, init_logging, load_settings, open_storage, run, RankedRow, RecordOutcome,
};
pub use seed::{seed, Fixture, SeedReport};
