//! Test utilities for the ENR updater.
//!
//! In-memory doubles for the chain and record ports. Enable with the
//! `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use fc_02_enr_updater::test_utils::MockChain;
//! use fc_02_enr_updater::ChainReader;
//! use shared_types::ChainConfig;
//!
//! let chain = MockChain::new(ChainConfig::new(1).with_block_fork("first", 10), [0u8; 32]);
//! chain.set_height(12);
//! assert_eq!(chain.current_header().height, 12);
//! ```

use parking_lot::{Mutex, RwLock};
use shared_bus::{ChainHeadEvent, ChainHeadFeed, HeadSubscription};
use shared_types::{BlockHeader, ChainConfig, Hash};
use tokio::sync::watch;

use crate::domain::{EntryError, RecordEntry};
use crate::ports::{ChainHeadSubscriber, ChainReader, DiscoveryRecord};

/// A chain whose head is set directly by the test.
///
/// Moving the head does not notify subscribers; call [`MockChain::notify`]
/// for that. This lets a test queue notifications independently of head
/// changes.
#[derive(Debug)]
pub struct MockChain {
    config: ChainConfig,
    genesis: Hash,
    genesis_time: u64,
    head: RwLock<BlockHeader>,
    feed: ChainHeadFeed,
}

impl MockChain {
    /// Create a chain at height 0, timestamp 0.
    pub fn new(config: ChainConfig, genesis: Hash) -> Self {
        let head = BlockHeader {
            hash: genesis,
            ..BlockHeader::default()
        };
        Self {
            config,
            genesis,
            genesis_time: 0,
            head: RwLock::new(head),
            feed: ChainHeadFeed::new(),
        }
    }

    /// Give block 0 a timestamp. The head moves to that timestamp too.
    #[must_use]
    pub fn with_genesis_time(mut self, timestamp: u64) -> Self {
        self.genesis_time = timestamp;
        self.head.get_mut().timestamp = timestamp;
        self
    }

    /// Move the head to `height`, keeping the timestamp.
    pub fn set_height(&self, height: u64) {
        self.head.write().height = height;
    }

    /// Move the head to `height` at `timestamp`.
    pub fn set_head(&self, height: u64, timestamp: u64) {
        let mut head = self.head.write();
        head.height = height;
        head.timestamp = timestamp;
    }

    /// Send one notification carrying the current head.
    pub async fn notify(&self) -> usize {
        let header = self.head.read().clone();
        self.feed.send(ChainHeadEvent::new(header)).await
    }

    /// Close the head feed.
    pub fn close(&self) {
        self.feed.close();
    }

    /// Number of live head subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }
}

impl ChainReader for MockChain {
    fn chain_config(&self) -> &ChainConfig {
        &self.config
    }

    fn genesis_hash(&self) -> Hash {
        self.genesis
    }

    fn genesis_time(&self) -> u64 {
        self.genesis_time
    }

    fn current_header(&self) -> BlockHeader {
        self.head.read().clone()
    }
}

impl ChainHeadSubscriber for MockChain {
    fn subscribe_chain_head(&self, capacity: usize) -> HeadSubscription {
        self.feed.subscribe(capacity)
    }
}

/// A record that remembers every write in order.
#[derive(Debug)]
pub struct RecordingRecord {
    writes: Mutex<Vec<(String, Vec<u8>)>>,
    count: watch::Sender<usize>,
}

impl RecordingRecord {
    /// Create a record with no writes.
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            writes: Mutex::new(Vec::new()),
            count,
        }
    }

    /// Number of writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    /// Every write as `(key, value)`.
    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.lock().clone()
    }

    /// Decode every write of entry type `E`, in order.
    pub fn entries<E: RecordEntry>(&self) -> Result<Vec<E>, EntryError> {
        self.writes
            .lock()
            .iter()
            .filter(|(key, _)| key == E::ENR_KEY)
            .map(|(_, value)| E::decode_value(value))
            .collect()
    }

    /// Decode the most recent write of entry type `E`.
    pub fn last<E: RecordEntry>(&self) -> Result<E, EntryError> {
        let writes = self.writes.lock();
        let (_, value) = writes
            .iter()
            .rev()
            .find(|(key, _)| key == E::ENR_KEY)
            .ok_or(EntryError::MissingKey(E::ENR_KEY))?;
        E::decode_value(value)
    }

    /// Wait until at least `count` writes happened.
    pub async fn wait_for_writes(&self, count: usize) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|written| *written >= count).await;
    }
}

impl Default for RecordingRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryRecord for RecordingRecord {
    fn set_entry(&self, key: &'static str, value: Vec<u8>) {
        let written = {
            let mut writes = self.writes.lock();
            writes.push((key.to_string(), value));
            writes.len()
        };
        self.count.send_replace(written);
    }
}
