//! # Chain Configuration
//!
//! The protocol upgrade schedule agreed by every node of a network.
//!
//! Upgrades activate either at a block height or at a block timestamp.
//! A schedule is plain data; ordering and deduplication are the concern of
//! whoever derives identifiers from it.

use serde::{Deserialize, Serialize};

/// When a protocol upgrade activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkCondition {
    /// Activates once the head reaches this height.
    Block(u64),
    /// Activates once the head timestamp reaches this value.
    Timestamp(u64),
}

impl ForkCondition {
    /// Whether the upgrade is active for a head at `height` / `timestamp`.
    pub fn is_active(&self, height: u64, timestamp: u64) -> bool {
        match *self {
            Self::Block(block) => block <= height,
            Self::Timestamp(time) => time <= timestamp,
        }
    }
}

/// A named protocol upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
    /// Human-readable upgrade name.
    pub name: String,
    /// Activation point.
    #[serde(flatten)]
    pub condition: ForkCondition,
}

impl Fork {
    /// A height-activated upgrade.
    pub fn at_block(name: impl Into<String>, block: u64) -> Self {
        Self {
            name: name.into(),
            condition: ForkCondition::Block(block),
        }
    }

    /// A timestamp-activated upgrade.
    pub fn at_timestamp(name: impl Into<String>, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            condition: ForkCondition::Timestamp(timestamp),
        }
    }
}

/// Protocol configuration of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChainConfig {
    /// Network chain identifier.
    pub chain_id: u64,
    /// Upgrade schedule, in any order.
    #[serde(default)]
    pub forks: Vec<Fork>,
}

impl ChainConfig {
    /// Create a configuration without any scheduled upgrade.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            forks: Vec::new(),
        }
    }

    /// Add a height-activated upgrade.
    #[must_use]
    pub fn with_block_fork(mut self, name: impl Into<String>, block: u64) -> Self {
        self.forks.push(Fork::at_block(name, block));
        self
    }

    /// Add a timestamp-activated upgrade.
    #[must_use]
    pub fn with_timestamp_fork(mut self, name: impl Into<String>, timestamp: u64) -> Self {
        self.forks.push(Fork::at_timestamp(name, timestamp));
        self
    }

    /// Activation heights of all height-activated upgrades, as configured.
    pub fn block_activations(&self) -> impl Iterator<Item = u64> + '_ {
        self.forks.iter().filter_map(|fork| match fork.condition {
            ForkCondition::Block(block) => Some(block),
            ForkCondition::Timestamp(_) => None,
        })
    }

    /// Activation timestamps of all timestamp-activated upgrades, as configured.
    pub fn timestamp_activations(&self) -> impl Iterator<Item = u64> + '_ {
        self.forks.iter().filter_map(|fork| match fork.condition {
            ForkCondition::Timestamp(time) => Some(time),
            ForkCondition::Block(_) => None,
        })
    }

    /// Names of the upgrades active for the given head.
    pub fn active_forks(&self, height: u64, timestamp: u64) -> Vec<&str> {
        self.forks
            .iter()
            .filter(|fork| fork.condition.is_active(height, timestamp))
            .map(|fork| fork.name.as_str())
            .collect()
    }
}
