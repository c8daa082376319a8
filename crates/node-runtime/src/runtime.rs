//! # Node Runtime
//!
//! Wires the chain, the chain database, the local node record and the ENR
//! updater together.
//!
//! ## Startup Sequence
//!
//! 1. Load the genesis configuration (file or built-in dev chain)
//! 2. Open the chain database
//! 3. Restore the chain from the database, or write genesis
//! 4. Start the ENR updater (publishes the `eth` entry immediately)
//! 5. Start the dev block producer if enabled
//!
//! ## Shutdown Sequence
//!
//! 1. Stop the block producer
//! 2. Close the chain head feed
//! 3. Wait for the updater to observe the closure and exit

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use fc_01_fork_id::{ForkFilter, ForkIdError};
use fc_02_enr_updater::{
    ChainReader, EnrUpdater, EnrUpdaterHandle, EntryError, EthEnrEntry, LocalNodeRecord,
    NodeRecord, UpdaterExit,
};
use fc_03_rawdb::open_database;
use shared_types::hash_hex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::{DevBlockProducer, HeaderStore, InMemoryChain};
use crate::container::NodeConfig;
use crate::genesis::{GenesisConfig, GenesisError};

/// Database namespace of the chain database.
const CHAINDATA_NAMESPACE: &str = "eth/db/chaindata/";

/// Why a remote node record was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerCheckError {
    /// The record has no usable `eth` entry.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// The advertised fork id is incompatible with the local chain.
    #[error("incompatible fork id: {0}")]
    Fork(#[from] ForkIdError),
}

/// The running node.
pub struct NodeRuntime {
    config: NodeConfig,
    chain: Arc<InMemoryChain>,
    store: Arc<HeaderStore>,
    record: Arc<LocalNodeRecord>,
    filter: ForkFilter,
    /// Parent of every task token; cancelled on drop.
    cancel: CancellationToken,
    updater: Option<EnrUpdaterHandle>,
    producer: Option<(CancellationToken, JoinHandle<()>)>,
}

impl NodeRuntime {
    /// Open storage and restore the chain. Nothing runs until `start`.
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating Forkcast node runtime");

        let genesis = GenesisConfig::resolve(config.chain.genesis_path.as_deref())
            .context("Failed to load genesis configuration")?;

        let db = open_database(
            config.storage.chaindata_dir(),
            config.storage.cache_mb,
            config.storage.handles,
            CHAINDATA_NAMESPACE,
            false,
        )
        .context("Failed to open chain database")?;
        let store = Arc::new(HeaderStore::new(Box::new(db)));

        let chain = Arc::new(Self::init_chain(&store, &genesis)?);
        let filter = ForkFilter::with_genesis_time(
            chain.chain_config(),
            &chain.genesis_hash(),
            chain.genesis_time(),
        );

        Ok(Self {
            config,
            chain,
            store,
            record: Arc::new(LocalNodeRecord::new(initial_seq())),
            filter,
            cancel: CancellationToken::new(),
            updater: None,
            producer: None,
        })
    }

    /// Restore the stored chain, or initialize it with the genesis header.
    fn init_chain(store: &HeaderStore, genesis: &GenesisConfig) -> Result<InMemoryChain> {
        let configured = genesis.header();
        let headers = store.read_chain().context("Failed to read stored chain")?;

        let Some(stored) = headers.first() else {
            info!(hash = %hash_hex(&configured.hash), "No genesis block found, writing genesis");
            store
                .write_head(&configured)
                .context("Failed to store genesis block")?;
            return Ok(InMemoryChain::new(genesis.chain.clone(), configured));
        };

        if stored.hash != configured.hash {
            return Err(GenesisError::Mismatch {
                stored: hash_hex(&stored.hash),
                configured: hash_hex(&configured.hash),
            }
            .into());
        }

        InMemoryChain::restore(genesis.chain.clone(), headers).context("Failed to restore chain")
    }

    /// Start the ENR updater and, if enabled, the dev block producer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.updater.is_some() {
            bail!("Node runtime already started");
        }

        let head = self.chain.current_header();
        info!("===========================================");
        info!("  Forkcast Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(
            chain_id = self.chain.chain_config().chain_id,
            genesis = %hash_hex(&self.chain.genesis_hash()),
            head = head.height,
            "Chain loaded"
        );

        self.updater = Some(EnrUpdater::start(
            Arc::clone(&self.chain),
            Arc::clone(&self.record),
            self.config.discovery.updater_config(),
            self.cancel.child_token(),
        ));

        if self.config.dev.is_enabled() {
            let interval = Duration::from_secs(self.config.dev.block_time_secs);
            let token = self.cancel.child_token();
            let producer =
                DevBlockProducer::new(Arc::clone(&self.chain), Arc::clone(&self.store), interval);
            self.producer = Some((token.clone(), producer.spawn(token)));
            info!(block_time_secs = self.config.dev.block_time_secs, "Dev block producer started");
        }

        info!(data_dir = %self.config.storage.data_dir.display(), "Node started");
        Ok(())
    }

    /// Shut the node down gracefully.
    ///
    /// # Returns
    ///
    /// How the updater ended, or `None` if the node was never started.
    pub async fn shutdown(mut self) -> Result<Option<UpdaterExit>> {
        info!("Initiating graceful shutdown...");

        if let Some((token, task)) = self.producer.take() {
            token.cancel();
            if let Err(e) = task.await {
                warn!(error = %e, "Block producer task failed");
            }
        }

        self.chain.stop();

        let exit = match self.updater.take() {
            Some(updater) => Some(updater.stopped().await.context("ENR updater failed")?),
            None => None,
        };

        self.cancel.cancel();
        info!(updater = ?exit, "Shutdown complete");
        Ok(exit)
    }

    /// Check a remote node's record against our chain.
    ///
    /// Accepts the node when its `eth` entry carries a fork id compatible
    /// with our current head.
    pub fn check_peer_record(&self, record: &NodeRecord) -> Result<(), PeerCheckError> {
        let entry = EthEnrEntry::from_record(record)?;
        let head = self.chain.current_header();
        self.filter
            .validate(entry.fork_id, head.height, head.timestamp)?;
        Ok(())
    }

    /// The `eth` entry currently advertised.
    pub fn local_entry(&self) -> Result<EthEnrEntry, EntryError> {
        self.record.load()
    }

    /// The chain.
    pub fn chain(&self) -> Arc<InMemoryChain> {
        Arc::clone(&self.chain)
    }

    /// The local node record.
    pub fn record(&self) -> Arc<LocalNodeRecord> {
        Arc::clone(&self.record)
    }

    /// The header store.
    pub fn store(&self) -> Arc<HeaderStore> {
        Arc::clone(&self.store)
    }

    /// Configuration the node runs with.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}

impl Drop for NodeRuntime {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for NodeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRuntime")
            .field("chain", &self.chain)
            .field("started", &self.updater.is_some())
            .finish_non_exhaustive()
    }
}

/// Sequence numbers start from wall-clock milliseconds so that a restarted
/// node never reuses a number it already published.
fn initial_seq() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{DevConfig, StorageConfig};
    use shared_types::BlockHeader;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> NodeConfig {
        NodeConfig {
            storage: StorageConfig {
                data_dir: dir.path().to_path_buf(),
                cache_mb: 16,
                handles: 16,
            },
            dev: DevConfig { block_time_secs: 0 },
            ..NodeConfig::default()
        }
    }

    async fn wait_for_next(runtime: &NodeRuntime, next: u64) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            if runtime.local_entry().map(|e| e.fork_id.next) == Ok(next) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("eth entry never reached next = {next}");
    }

    #[tokio::test]
    async fn test_start_publishes_entry() {
        let dir = TempDir::new().unwrap();
        let mut runtime = NodeRuntime::new(test_config(&dir)).unwrap();
        assert!(runtime.local_entry().is_err());

        runtime.start().unwrap();

        let entry = runtime.local_entry().unwrap();
        assert_eq!(entry.fork_id.next, 10);
        assert!(runtime.start().is_err());

        let exit = runtime.shutdown().await.unwrap();
        assert!(matches!(exit, Some(UpdaterExit::SourceClosed(_))));
    }

    #[tokio::test]
    async fn test_entry_follows_chain() {
        let dir = TempDir::new().unwrap();
        let mut runtime = NodeRuntime::new(test_config(&dir)).unwrap();
        runtime.start().unwrap();

        let chain = runtime.chain();
        let mut head = chain.current_header();
        for _ in 0..10 {
            head = head.child(head.timestamp + 12);
            chain.insert_head(head.clone()).await.unwrap();
        }
        wait_for_next(&runtime, 50).await;

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_restart_restores_head() {
        let dir = TempDir::new().unwrap();
        {
            let mut runtime = NodeRuntime::new(test_config(&dir)).unwrap();
            runtime.start().unwrap();
            let chain = runtime.chain();
            let store = runtime.store();
            let mut head = chain.current_header();
            for _ in 0..12 {
                head = head.child(head.timestamp + 12);
                store.write_head(&head).unwrap();
                chain.insert_head(head.clone()).await.unwrap();
            }
            runtime.shutdown().await.unwrap();
        }

        let mut runtime = NodeRuntime::new(test_config(&dir)).unwrap();
        assert_eq!(runtime.chain().height(), 12);
        runtime.start().unwrap();
        assert_eq!(runtime.local_entry().unwrap().fork_id.next, 50);
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_genesis_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        drop(NodeRuntime::new(test_config(&dir)).unwrap());

        let genesis_file = dir.path().join("genesis.toml");
        std::fs::write(&genesis_file, "timestamp = 99\n[chain]\nchain_id = 1337\n").unwrap();
        let mut config = test_config(&dir);
        config.chain.genesis_path = Some(genesis_file);

        let err = NodeRuntime::new(config).unwrap_err();
        assert!(err.downcast_ref::<GenesisError>().is_some());
    }

    #[tokio::test]
    async fn test_genesis_time_fork_excluded_from_entry() {
        let dir = TempDir::new().unwrap();
        let genesis_file = dir.path().join("genesis.toml");
        std::fs::write(
            &genesis_file,
            "timestamp = 1600000000\n\
             [chain]\nchain_id = 1337\n\
             [[chain.forks]]\nname = \"at-genesis\"\ntimestamp = 1600000000\n\
             [[chain.forks]]\nname = \"later\"\ntimestamp = 1700000000\n",
        )
        .unwrap();
        let mut config = test_config(&dir);
        config.chain.genesis_path = Some(genesis_file);

        let mut runtime = NodeRuntime::new(config).unwrap();
        runtime.start().unwrap();

        let entry = runtime.local_entry().unwrap();
        let genesis = runtime.chain().genesis_hash();
        assert_eq!(entry.fork_id.hash, fc_01_fork_id::ForkHash::from_genesis(&genesis));
        assert_eq!(entry.fork_id.next, 1_700_000_000);
        assert_eq!(runtime.check_peer_record(&runtime.record().node()), Ok(()));

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_check_peer_record() {
        let dir = TempDir::new().unwrap();
        let mut runtime = NodeRuntime::new(test_config(&dir)).unwrap();
        runtime.start().unwrap();

        // Our own record is compatible with us.
        let own = runtime.record().node();
        assert_eq!(runtime.check_peer_record(&own), Ok(()));

        // A record without an eth entry is not.
        let bare = LocalNodeRecord::default().node();
        assert_eq!(
            runtime.check_peer_record(&bare),
            Err(PeerCheckError::Entry(EntryError::MissingKey("eth")))
        );

        // Neither is a node on another genesis.
        let foreign = LocalNodeRecord::default();
        let other_genesis = BlockHeader::genesis(777).hash;
        foreign.set(&EthEnrEntry::new(fc_01_fork_id::ForkId::compute(
            runtime.chain().chain_config(),
            &other_genesis,
            0,
            0,
        )));
        assert_eq!(
            runtime.check_peer_record(&foreign.node()),
            Err(PeerCheckError::Fork(ForkIdError::LocalIncompatibleOrStale))
        );

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_without_start() {
        let dir = TempDir::new().unwrap();
        let runtime = NodeRuntime::new(test_config(&dir)).unwrap();
        assert_eq!(runtime.shutdown().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dev_producer_runs() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.dev.block_time_secs = 1;
        let mut runtime = NodeRuntime::new(config).unwrap();
        runtime.start().unwrap();

        let chain = runtime.chain();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while chain.height() == 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(chain.height() >= 1);

        runtime.shutdown().await.unwrap();
    }
}
