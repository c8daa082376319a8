//! # In-Memory Chain
//!
//! Canonical header chain held in memory, with a head notification feed.
//!
//! Implements the updater's `ChainReader` and `ChainHeadSubscriber` ports.
//! Block execution and validation are out of scope: a header is accepted
//! when it links to the canonical header at `height - 1`.

use parking_lot::RwLock;
use shared_bus::{ChainHeadEvent, ChainHeadFeed, HeadSubscription};
use shared_types::{hash_hex, BlockHeader, ChainConfig, Hash};
use thiserror::Error;
use tracing::{debug, info};

use fc_02_enr_updater::{ChainHeadSubscriber, ChainReader};

/// Header insertion errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A second genesis header.
    #[error("cannot insert a header at height 0")]
    GenesisReplacement,

    /// The header skips heights beyond the current head.
    #[error("header {height} is ahead of head {head}")]
    Gap { height: u64, head: u64 },

    /// The header's parent is not the canonical header below it.
    #[error("header {height} has unknown parent {parent}")]
    UnknownParent { height: u64, parent: String },

    /// Restored headers do not form a chain from genesis.
    #[error("stored headers are not contiguous at height {height}")]
    Broken { height: u64 },
}

/// Header chain with a head feed.
pub struct InMemoryChain {
    config: ChainConfig,
    genesis: BlockHeader,
    /// Canonical headers, index == height.
    headers: RwLock<Vec<BlockHeader>>,
    feed: ChainHeadFeed,
}

impl InMemoryChain {
    /// Create a chain holding only `genesis`.
    pub fn new(config: ChainConfig, genesis: BlockHeader) -> Self {
        Self {
            config,
            headers: RwLock::new(vec![genesis.clone()]),
            genesis,
            feed: ChainHeadFeed::new(),
        }
    }

    /// Rebuild a chain from headers ordered by height, genesis first.
    pub fn restore(config: ChainConfig, headers: Vec<BlockHeader>) -> Result<Self, ChainError> {
        let Some(genesis) = headers.first().cloned() else {
            return Err(ChainError::Broken { height: 0 });
        };
        if !genesis.is_genesis() {
            return Err(ChainError::Broken { height: 0 });
        }
        for pair in headers.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            if child.height != parent.height + 1 || child.parent_hash != parent.hash {
                return Err(ChainError::Broken {
                    height: child.height,
                });
            }
        }

        info!(
            head = headers.len() - 1,
            genesis = %hash_hex(&genesis.hash),
            "Chain restored"
        );

        Ok(Self {
            config,
            genesis,
            headers: RwLock::new(headers),
            feed: ChainHeadFeed::new(),
        })
    }

    /// Make `header` the new head and notify subscribers.
    ///
    /// A header at or below the current head replaces the canonical suffix
    /// from its height on (reorg). Waits while a subscriber's buffer is full.
    ///
    /// # Returns
    ///
    /// The number of subscribers notified.
    pub async fn insert_head(&self, header: BlockHeader) -> Result<usize, ChainError> {
        {
            let mut headers = self.headers.write();
            let head = headers.len() as u64 - 1;

            if header.height == 0 {
                return Err(ChainError::GenesisReplacement);
            }
            if header.height > head + 1 {
                return Err(ChainError::Gap {
                    height: header.height,
                    head,
                });
            }
            let parent = &headers[(header.height - 1) as usize];
            if parent.hash != header.parent_hash {
                return Err(ChainError::UnknownParent {
                    height: header.height,
                    parent: hash_hex(&header.parent_hash),
                });
            }

            if header.height <= head {
                debug!(
                    old_head = head,
                    new_head = header.height,
                    "Reorganising canonical chain"
                );
            }
            headers.truncate(header.height as usize);
            headers.push(header.clone());
        }

        Ok(self.feed.send(ChainHeadEvent::new(header)).await)
    }

    /// Close the head feed. Subscribers observe a terminal error.
    pub fn stop(&self) {
        self.feed.close();
    }

    /// Whether `stop` was called.
    pub fn is_stopped(&self) -> bool {
        self.feed.is_closed()
    }

    /// The genesis header.
    pub fn genesis(&self) -> &BlockHeader {
        &self.genesis
    }

    /// Height of the current head.
    pub fn height(&self) -> u64 {
        self.headers.read().len() as u64 - 1
    }

    /// Canonical header at `height`.
    pub fn header_by_height(&self, height: u64) -> Option<BlockHeader> {
        self.headers.read().get(height as usize).cloned()
    }

    /// Live head subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }
}

impl ChainReader for InMemoryChain {
    fn chain_config(&self) -> &ChainConfig {
        &self.config
    }

    fn genesis_hash(&self) -> Hash {
        self.genesis.hash
    }

    fn genesis_time(&self) -> u64 {
        self.genesis.timestamp
    }

    fn current_header(&self) -> BlockHeader {
        let headers = self.headers.read();
        // Never empty: genesis is always present.
        headers.last().cloned().unwrap_or_else(|| self.genesis.clone())
    }
}

impl ChainHeadSubscriber for InMemoryChain {
    fn subscribe_chain_head(&self, capacity: usize) -> HeadSubscription {
        self.feed.subscribe(capacity)
    }
}

impl std::fmt::Debug for InMemoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChain")
            .field("chain_id", &self.config.chain_id)
            .field("height", &self.height())
            .field("feed", &self.feed)
            .finish()
    }
}
