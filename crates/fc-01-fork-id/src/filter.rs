//! Remote fork id validation (EIP-2124 rules).

use shared_types::{ChainConfig, Hash};
use tracing::error;

use crate::errors::ForkIdError;
use crate::fork_id::{ForkHash, ForkId};
use crate::forks::gather_forks;
use crate::TIMESTAMP_THRESHOLD;

/// Which head value a fork point is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Block,
    Time,
}

/// Validates fork ids announced by remote peers against the local chain.
///
/// Checksums for every fork prefix are computed once at construction; a
/// check only walks the precomputed table.
#[derive(Debug, Clone)]
pub struct ForkFilter {
    /// Fork points in order, closed by a never-passed sentinel.
    forks: Vec<(u64, Activation)>,
    /// `sums[i]` is the checksum after the first `i` forks passed.
    sums: Vec<ForkHash>,
}

impl ForkFilter {
    /// Build a filter for the local chain configuration.
    ///
    /// Equivalent to [`ForkFilter::with_genesis_time`] with a genesis
    /// timestamp of 0.
    pub fn new(config: &ChainConfig, genesis: &Hash) -> Self {
        Self::with_genesis_time(config, genesis, 0)
    }

    /// Build a filter for a chain whose genesis block carries
    /// `genesis_time`. Timestamp forks at or before it are not forks.
    pub fn with_genesis_time(config: &ChainConfig, genesis: &Hash, genesis_time: u64) -> Self {
        let gathered = gather_forks(config, genesis_time);

        let mut forks: Vec<(u64, Activation)> = gathered
            .by_block
            .iter()
            .map(|&fork| (fork, Activation::Block))
            .chain(gathered.by_time.iter().map(|&fork| (fork, Activation::Time)))
            .collect();

        let mut sums = Vec::with_capacity(forks.len() + 1);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(genesis);
        sums.push(ForkHash::from(hasher.clone().finalize()));
        for (fork, _) in &forks {
            hasher.update(&fork.to_be_bytes());
            sums.push(ForkHash::from(hasher.clone().finalize()));
        }

        forks.push((u64::MAX, Activation::Time));

        Self { forks, sums }
    }

    /// Check a remote fork id against the local head.
    ///
    /// Accepts when both sides agree on the passed forks, when the remote is
    /// syncing behind us on the same history, or when we are syncing behind
    /// the remote. Rejects everything else.
    pub fn validate(&self, remote: ForkId, head_height: u64, head_time: u64) -> Result<(), ForkIdError> {
        for (i, &(fork, activation)) in self.forks.iter().enumerate() {
            let head = match activation {
                Activation::Block => head_height,
                Activation::Time => head_time,
            };
            if head >= fork {
                continue;
            }

            // Same fork state as the remote. A remote `next` is a height
            // unless it lies above the timestamp threshold.
            if self.sums[i] == remote.hash {
                let passed_remote_next = remote.next > 0
                    && (head_height >= remote.next
                        || (remote.next > TIMESTAMP_THRESHOLD && head_time >= remote.next));
                if passed_remote_next {
                    return Err(ForkIdError::LocalIncompatibleOrStale);
                }
                return Ok(());
            }

            // Remote is behind on our history.
            if let Some(j) = self.sums[..i].iter().position(|sum| *sum == remote.hash) {
                if self.forks[j].0 != remote.next {
                    return Err(ForkIdError::RemoteStale);
                }
                return Ok(());
            }

            // Remote is ahead on our known future.
            if self.sums[i + 1..].contains(&remote.hash) {
                return Ok(());
            }

            return Err(ForkIdError::LocalIncompatibleOrStale);
        }

        error!(remote = %remote, "Impossible fork ID validation");
        Ok(())
    }

    /// Number of fork points the filter knows about.
    pub fn fork_count(&self) -> usize {
        self.forks.len() - 1
    }
}
