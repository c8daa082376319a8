//! # Dev Block Producer
//!
//! Extends the chain with an empty header on a fixed interval so a dev node
//! walks through its fork schedule without any network.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use shared_types::{hash_hex, BlockHeader};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fc_02_enr_updater::ChainReader;

use super::chain::InMemoryChain;
use super::store::HeaderStore;

/// Produces one header per interval on top of the current head.
pub struct DevBlockProducer {
    chain: Arc<InMemoryChain>,
    store: Arc<HeaderStore>,
    interval: Duration,
}

impl DevBlockProducer {
    /// Create a producer sealing a header every `interval`.
    pub fn new(chain: Arc<InMemoryChain>, store: Arc<HeaderStore>, interval: Duration) -> Self {
        Self {
            chain,
            store,
            interval,
        }
    }

    /// Seal, persist and import one header.
    pub async fn produce_block(&self) -> Result<BlockHeader> {
        let parent = self.chain.current_header();
        // Timestamps must move forward even when blocks come faster than 1s.
        let timestamp = unix_now().max(parent.timestamp + 1);
        let header = parent.child(timestamp);

        self.store
            .write_head(&header)
            .context("Failed to persist produced header")?;
        self.chain
            .insert_head(header.clone())
            .await
            .context("Failed to import produced header")?;

        let active = self
            .chain
            .chain_config()
            .active_forks(header.height, header.timestamp)
            .len();
        info!(
            height = header.height,
            hash = %hash_hex(&header.hash),
            active_forks = active,
            "Produced block"
        );
        Ok(header)
    }

    /// Run until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.produce_block().await {
                            warn!(error = %e, "Block production failed");
                        }
                    }
                }
            }

            info!("Dev block producer stopped");
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_03_rawdb::open_database;
    use shared_types::ChainConfig;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (Arc<InMemoryChain>, Arc<HeaderStore>) {
        let db = open_database(dir.path(), 16, 16, "test/", false).unwrap();
        let store = Arc::new(HeaderStore::new(Box::new(db)));
        let genesis = BlockHeader::genesis(0);
        store.write_head(&genesis).unwrap();
        let chain = Arc::new(InMemoryChain::new(ChainConfig::new(1), genesis));
        (chain, store)
    }

    #[tokio::test]
    async fn test_produce_block_extends_and_persists() {
        let dir = TempDir::new().unwrap();
        let (chain, store) = setup(&dir);
        let producer = DevBlockProducer::new(chain.clone(), store.clone(), Duration::from_secs(1));

        let first = producer.produce_block().await.unwrap();
        let second = producer.produce_block().await.unwrap();

        assert_eq!(first.height, 1);
        assert_eq!(second.parent_hash, first.hash);
        assert!(second.timestamp > first.timestamp);
        assert_eq!(chain.height(), 2);
        assert_eq!(store.head_height().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_spawned_producer_stops_on_cancel() {
        let dir = TempDir::new().unwrap();
        let (chain, store) = setup(&dir);
        let producer = DevBlockProducer::new(chain.clone(), store, Duration::from_millis(10));

        let cancel = CancellationToken::new();
        let task = producer.spawn(cancel.clone());

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while chain.height() < 2 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(chain.height() >= 2);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("producer did not stop")
            .unwrap();
    }
}
