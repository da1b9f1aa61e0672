//! Asset Marketplace Daemon
//!
//! Trending and personalized rankings over a local interaction store.
//!
//! # Usage
//!
//! ```bash
//! marketd trending [--limit N]
//! marketd recommend <USER_ID|0xWALLET> [--limit N]
//! marketd leaderboard creators|collectors [--limit N]
//! marketd record <USER> <ASSET> [--kind view|like|purchase|list]
//! marketd admin stats|seed <FILE>|compact
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/asset-market/config.toml)
//! 3. Environment variables (MARKET_*, nested keys joined with `__`)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use market_daemon::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
