//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - users: account records keyed by user id
//! - wallets: wallet address -> user id index
//! - assets: asset records keyed by asset id (counters updated in place)
//! - interactions: append-only interaction log, time-ordered
//! - user_interactions: interaction log re-keyed by user, then time
//! - asset_interactions: interaction log re-keyed by asset, then time

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for user records
pub const CF_USERS: &str = "users";

/// Column family name for the wallet address index
pub const CF_WALLETS: &str = "wallets";

/// Column family name for asset records
pub const CF_ASSETS: &str = "assets";

/// Column family name for the time-ordered interaction log
pub const CF_INTERACTIONS: &str = "interactions";

/// Column family name for the per-user interaction index
pub const CF_USER_INTERACTIONS: &str = "user_interactions";

/// Column family name for the per-asset interaction index
pub const CF_ASSET_INTERACTIONS: &str = "asset_interactions";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[
    CF_USERS,
    CF_WALLETS,
    CF_ASSETS,
    CF_INTERACTIONS,
    CF_USER_INTERACTIONS,
    CF_ASSET_INTERACTIONS,
];

/// Options for the append-only interaction column families
fn log_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_USERS, Options::default()),
        ColumnFamilyDescriptor::new(CF_WALLETS, Options::default()),
        ColumnFamilyDescriptor::new(CF_ASSETS, Options::default()),
        ColumnFamilyDescriptor::new(CF_INTERACTIONS, log_options()),
        ColumnFamilyDescriptor::new(CF_USER_INTERACTIONS, log_options()),
        ColumnFamilyDescriptor::new(CF_ASSET_INTERACTIONS, log_options()),
    ]
}
