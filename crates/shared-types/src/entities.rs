//! # Core Domain Entities
//!
//! Defines the chain entities consumed by the discovery subsystems.
//!
//! ## Clusters
//!
//! - **Chain**: `BlockHeader`, `Hash`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte hash (e.g., SHA-256 or Keccak-256).
pub type Hash = [u8; 32];

/// Format a hash as `0x`-prefixed lower-case hex.
pub fn hash_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// The header of a block, reduced to the fields peers and fork logic need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block height in the chain.
    pub height: u64,
    /// Hash of the parent block (creates the chain linkage).
    pub parent_hash: Hash,
    /// Unix timestamp when the block was proposed.
    pub timestamp: u64,
    /// Hash of this header.
    pub hash: Hash,
}

impl BlockHeader {
    /// Build a header and seal it with its computed hash.
    pub fn new(height: u64, parent_hash: Hash, timestamp: u64) -> Self {
        let mut header = Self {
            height,
            parent_hash,
            timestamp,
            hash: [0u8; 32],
        };
        header.hash = header.compute_hash();
        header
    }

    /// Build a genesis header (height 0, zero parent).
    pub fn genesis(timestamp: u64) -> Self {
        Self::new(0, [0u8; 32], timestamp)
    }

    /// Compute the header hash over height, parent and timestamp.
    pub fn compute_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.parent_hash);
        hasher.update(self.timestamp.to_be_bytes());
        hasher.finalize().into()
    }

    /// Build the child of this header at the given timestamp.
    pub fn child(&self, timestamp: u64) -> Self {
        Self::new(self.height + 1, self.hash, timestamp)
    }

    /// Whether this is the genesis header.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_header() {
        let genesis = BlockHeader::genesis(1_700_000_000);
        assert!(genesis.is_genesis());
        assert_eq!(genesis.parent_hash, [0u8; 32]);
        assert_eq!(genesis.hash, genesis.compute_hash());
    }

    #[test]
    fn test_child_links_to_parent() {
        let genesis = BlockHeader::genesis(100);
        let child = genesis.child(112);

        assert_eq!(child.height, 1);
        assert_eq!(child.parent_hash, genesis.hash);
        assert_ne!(child.hash, genesis.hash);
    }

    #[test]
    fn test_hash_depends_on_timestamp() {
        let a = BlockHeader::new(5, [1u8; 32], 10);
        let b = BlockHeader::new(5, [1u8; 32], 11);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_hash_hex() {
        let mut hash = [0u8; 32];
        hash[0] = 0xab;
        let rendered = hash_hex(&hash);
        assert!(rendered.starts_with("0xab00"));
        assert_eq!(rendered.len(), 66);
    }
}
