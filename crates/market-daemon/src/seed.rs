//! JSON fixture import.
//!
//! A fixture holds `users`, `assets` and `interactions` arrays in the same
//! shape the records are stored in. Asset counters in the fixture are the
//! baseline; recorded `view`/`like` events add to them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use market_storage::{Storage, StorageError};
use market_types::{Asset, InteractionEvent, User};

/// Records to import.
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub interactions: Vec<InteractionEvent>,
}

impl Fixture {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid fixture {:?}", path))
    }
}

/// What an import did.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub assets: usize,
    pub interactions_recorded: usize,
    /// Already present (same event id and timestamp)
    pub interactions_duplicate: usize,
    /// Referencing a missing user or asset
    pub interactions_rejected: usize,
}

/// Write `fixture` into `storage`. Users and assets go first so events
/// can reference them.
pub fn seed(storage: &Storage, fixture: &Fixture) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for user in &fixture.users {
        storage
            .put_user(user)
            .with_context(|| format!("Failed to store user {}", user.user_id))?;
        report.users += 1;
    }
    for asset in &fixture.assets {
        storage
            .put_asset(asset)
            .with_context(|| format!("Failed to store asset {}", asset.asset_id))?;
        report.assets += 1;
    }
    for event in &fixture.interactions {
        match storage.record_interaction(event) {
            Ok(true) => report.interactions_recorded += 1,
            Ok(false) => report.interactions_duplicate += 1,
            Err(StorageError::NotFound(what)) => {
                warn!(event_id = %event.event_id, %what, "Skipping interaction");
                report.interactions_rejected += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to record {}", event.event_id))
            }
        }
    }

    info!(
        users = report.users,
        assets = report.assets,
        interactions = report.interactions_recorded,
        "Seeded fixture"
    );
    Ok(report)
}
