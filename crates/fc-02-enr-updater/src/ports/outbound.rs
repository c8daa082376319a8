//! # Outbound Ports
//!
//! Capabilities the updater consumes. The node runtime provides the chain
//! side, the discovery layer provides the record.

use shared_bus::HeadSubscription;
use shared_types::{BlockHeader, ChainConfig, Hash};

/// Read access to the local chain.
pub trait ChainReader: Send + Sync {
    /// Fork schedule of the chain.
    fn chain_config(&self) -> &ChainConfig;

    /// Hash of block 0.
    fn genesis_hash(&self) -> Hash;

    /// Timestamp of block 0.
    fn genesis_time(&self) -> u64;

    /// Header of the current head block.
    fn current_header(&self) -> BlockHeader;
}

/// Source of chain head change notifications.
pub trait ChainHeadSubscriber: Send + Sync {
    /// Register for head notifications on a channel of `capacity` slots.
    fn subscribe_chain_head(&self, capacity: usize) -> HeadSubscription;
}

/// The local discovery record.
///
/// Writes are fire-and-forget: the record replaces the value under `key`
/// and takes care of sequencing and re-signing.
pub trait DiscoveryRecord: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn set_entry(&self, key: &'static str, value: Vec<u8>);
}
