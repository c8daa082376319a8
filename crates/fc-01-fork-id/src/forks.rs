//! Fork list derivation from a chain configuration.

use shared_types::ChainConfig;

/// Ordered activation points taken from a [`ChainConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GatheredForks {
    /// Height activations, ascending, unique, genesis (0) excluded.
    pub by_block: Vec<u64>,
    /// Timestamp activations, ascending, unique, those at or before the
    /// genesis timestamp excluded.
    pub by_time: Vec<u64>,
}

impl GatheredForks {
    /// Total number of activation points.
    pub fn len(&self) -> usize {
        self.by_block.len() + self.by_time.len()
    }

    /// Whether the chain schedules no upgrade at all.
    pub fn is_empty(&self) -> bool {
        self.by_block.is_empty() && self.by_time.is_empty()
    }
}

/// Collect the activation points that feed into a fork id.
///
/// Upgrades sharing an activation point count once, and upgrades active
/// from genesis are not forks: height 0, and any timestamp up to and
/// including `genesis_time`.
pub fn gather_forks(config: &ChainConfig, genesis_time: u64) -> GatheredForks {
    GatheredForks {
        by_block: normalize(config.block_activations().collect(), 0),
        by_time: normalize(config.timestamp_activations().collect(), genesis_time),
    }
}

/// Sort, dedup and drop every point at or below `genesis`.
fn normalize(mut points: Vec<u64>, genesis: u64) -> Vec<u64> {
    points.sort_unstable();
    points.dedup();
    points.retain(|&point| point > genesis);
    points
}
