//! # Genesis Configuration
//!
//! Loads the genesis file and builds the genesis header.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeader, ChainConfig};
use thiserror::Error;

/// Genesis errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// The genesis file could not be read.
    #[error("Failed to read genesis file {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The genesis file is not valid TOML for a genesis configuration.
    #[error("Invalid genesis configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The database holds a chain with a different genesis.
    #[error("Genesis mismatch: database has {stored}, configuration has {configured}")]
    Mismatch {
        /// Genesis hash found in the database.
        stored: String,
        /// Genesis hash derived from the configuration.
        configured: String,
    },
}

/// Genesis configuration.
///
/// ```toml
/// timestamp = 1700000000
///
/// [chain]
/// chain_id = 1337
///
/// [[chain.forks]]
/// name = "alpha"
/// block = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Genesis block timestamp (Unix seconds).
    #[serde(default)]
    pub timestamp: u64,

    /// Protocol upgrade schedule.
    pub chain: ChainConfig,
}

impl GenesisConfig {
    /// The built-in dev chain: two height forks early enough to watch the
    /// `eth` entry change within minutes.
    pub fn dev() -> Self {
        Self {
            timestamp: 0,
            chain: ChainConfig::new(1337)
                .with_block_fork("alpha", 10)
                .with_block_fork("beta", 50),
        }
    }

    /// Parse a genesis configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, GenesisError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a genesis configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, GenesisError> {
        let raw = std::fs::read_to_string(path).map_err(|source| GenesisError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load from `path` if given, otherwise use the dev chain.
    pub fn resolve(path: Option<&Path>) -> Result<Self, GenesisError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::dev()),
        }
    }

    /// Build the genesis header.
    pub fn header(&self) -> BlockHeader {
        BlockHeader::genesis(self.timestamp)
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self::dev()
    }
}
