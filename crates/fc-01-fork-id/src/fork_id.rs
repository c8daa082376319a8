//! Fork ID (EIP-2124).

use std::fmt;

use shared_types::{ChainConfig, Hash};

use crate::forks::gather_forks;

/// CRC32 checksum of the genesis hash and all passed fork points.
///
/// Stored big-endian, the way it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ForkHash(pub [u8; 4]);

impl ForkHash {
    /// Checksum of a bare genesis hash.
    pub fn from_genesis(genesis: &Hash) -> Self {
        Self::from(crc32fast::hash(genesis))
    }

    /// The checksum as a number.
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<u32> for ForkHash {
    fn from(checksum: u32) -> Self {
        Self(checksum.to_be_bytes())
    }
}

impl fmt::Display for ForkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Fork ID for quick network/fork identification
///
/// Compact representation: crc32(genesis + passed fork points) + next fork
///
/// Reference: EIP-2124
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ForkId {
    /// CRC32 of genesis hash and every passed fork point
    pub hash: ForkHash,
    /// Block number or timestamp of the next fork (0 if none)
    pub next: u64,
}

impl ForkId {
    /// Create a fork id from its parts.
    pub fn new(hash: ForkHash, next: u64) -> Self {
        Self { hash, next }
    }

    /// Compute the fork id of a chain whose head is at `head_height` and
    /// `head_time`.
    ///
    /// Height forks are walked first, then timestamp forks. Each passed
    /// fork is folded into the checksum as a big-endian `u64`; the first
    /// fork not yet passed becomes `next`.
    pub fn compute(config: &ChainConfig, genesis: &Hash, head_height: u64, head_time: u64) -> Self {
        Self::compute_with_genesis_time(config, genesis, 0, head_height, head_time)
    }

    /// [`ForkId::compute`] for a chain whose genesis block carries
    /// `genesis_time`. Timestamp forks at or before it belong to the genesis
    /// rules and are not folded into the checksum.
    pub fn compute_with_genesis_time(
        config: &ChainConfig,
        genesis: &Hash,
        genesis_time: u64,
        head_height: u64,
        head_time: u64,
    ) -> Self {
        let forks = gather_forks(config, genesis_time);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(genesis);

        for &fork in &forks.by_block {
            if fork > head_height {
                return Self::new(hasher.finalize().into(), fork);
            }
            hasher.update(&fork.to_be_bytes());
        }
        for &fork in &forks.by_time {
            if fork > head_time {
                return Self::new(hasher.finalize().into(), fork);
            }
            hasher.update(&fork.to_be_bytes());
        }

        Self::new(hasher.finalize().into(), 0)
    }

    /// Whether a further upgrade is scheduled.
    pub fn has_next(&self) -> bool {
        self.next != 0
    }
}

impl fmt::Display for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{hash: {}, next: {}}}", self.hash, self.next)
    }
}
