//! # Node Configuration
//!
//! Unified configuration for the node's storage, chain, discovery and dev
//! block production.
//!
//! Defaults are usable as-is for a local dev node. Every field can be
//! overridden from the environment (see [`NodeConfig::from_env`]).

use std::path::PathBuf;
use std::str::FromStr;

use fc_02_enr_updater::EnrUpdaterConfig;
use shared_bus::DEFAULT_HEAD_CHANNEL_CAPACITY;
use tracing::{info, warn};

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Chain configuration.
    pub chain: ChainSettings,
    /// Discovery record configuration.
    pub discovery: DiscoveryConfig,
    /// Dev block production configuration.
    pub dev: DevConfig,
}

impl NodeConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FC_DATA_DIR`: Data directory (default: ./data)
    /// - `FC_DB_CACHE_MB`: Database cache in MiB (default: 256)
    /// - `FC_DB_HANDLES`: Database file handles (default: 256)
    /// - `FC_CHAIN_CONFIG`: Path to a genesis TOML file (default: built-in dev chain)
    /// - `FC_HEAD_CHANNEL_CAPACITY`: Head notification buffer (default: 10)
    /// - `FC_BLOCK_TIME_SECS`: Dev block interval, 0 disables (default: 12)
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("FC_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(cache) = parse_var(&lookup, "FC_DB_CACHE_MB") {
            config.storage.cache_mb = cache;
        }
        if let Some(handles) = parse_var(&lookup, "FC_DB_HANDLES") {
            config.storage.handles = handles;
        }
        if let Some(path) = lookup("FC_CHAIN_CONFIG") {
            info!(path = %path, "Using chain configuration file");
            config.chain.genesis_path = Some(PathBuf::from(path));
        }
        if let Some(capacity) = parse_var(&lookup, "FC_HEAD_CHANNEL_CAPACITY") {
            config.discovery.head_channel_capacity = capacity;
        }
        if let Some(secs) = parse_var(&lookup, "FC_BLOCK_TIME_SECS") {
            config.dev.block_time_secs = secs;
        }

        config
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Root data directory. The chain database lives in `chaindata/`.
    pub data_dir: PathBuf,
    /// Database block cache in MiB.
    pub cache_mb: usize,
    /// Database file handle budget.
    pub handles: usize,
}

impl StorageConfig {
    /// Directory of the chain database.
    pub fn chaindata_dir(&self) -> PathBuf {
        self.data_dir.join("chaindata")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            cache_mb: 256,
            handles: 256,
        }
    }
}

/// Chain configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSettings {
    /// Genesis TOML file. `None` selects the built-in dev chain.
    pub genesis_path: Option<PathBuf>,
}

/// Discovery record configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Buffer of the updater's head subscription.
    pub head_channel_capacity: usize,
}

impl DiscoveryConfig {
    /// Updater settings derived from this configuration.
    pub fn updater_config(&self) -> EnrUpdaterConfig {
        EnrUpdaterConfig {
            channel_capacity: self.head_channel_capacity,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            head_channel_capacity: DEFAULT_HEAD_CHANNEL_CAPACITY,
        }
    }
}

/// Dev block production configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevConfig {
    /// Seconds between produced blocks. Zero disables production.
    pub block_time_secs: u64,
}

impl DevConfig {
    /// Whether the dev producer should run.
    pub fn is_enabled(&self) -> bool {
        self.block_time_secs > 0
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self { block_time_secs: 12 }
    }
}
