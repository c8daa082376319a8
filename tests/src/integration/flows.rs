//! # Integration Test Flows
//!
//! The chain, the ENR updater and the discovery record working together.
//!
//! ## Flows Tested:
//!
//! 1. **Chain -> Updater -> Record**: every new head republishes the `eth`
//!    entry, and the advertised fork id walks through the fork schedule
//! 2. **Record -> Peer filter**: entries advertised by one node are judged by
//!    another node's fork filter
//! 3. **Chain stop -> Updater exit**: closing the head feed ends the updater

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    use fc_01_fork_id::{ForkFilter, ForkHash, ForkId, ForkIdError};
    use fc_02_enr_updater::{
        ChainReader, EnrUpdater, EnrUpdaterConfig, EthEnrEntry, LocalNodeRecord, RecordEntry,
        RecordingRecord, UpdaterExit,
    };
    use node_runtime::adapters::InMemoryChain;
    use shared_types::{BlockHeader, ChainConfig};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Two height forks at 10 and 50.
    fn two_fork_config() -> ChainConfig {
        ChainConfig::new(1337)
            .with_block_fork("alpha", 10)
            .with_block_fork("beta", 50)
    }

    fn make_chain() -> Arc<InMemoryChain> {
        Arc::new(InMemoryChain::new(two_fork_config(), BlockHeader::genesis(0)))
    }

    /// Extend the chain by `count` headers, 12 seconds apart.
    async fn extend(chain: &InMemoryChain, count: u64) {
        let mut head = chain.current_header();
        for _ in 0..count {
            head = head.child(head.timestamp + 12);
            chain.insert_head(head.clone()).await.unwrap();
        }
    }

    fn dedup_nexts(entries: &[EthEnrEntry]) -> Vec<u64> {
        let mut nexts: Vec<u64> = entries.iter().map(|e| e.fork_id.next).collect();
        nexts.dedup();
        nexts
    }

    // =============================================================================
    // CHAIN -> UPDATER -> RECORD
    // =============================================================================

    #[tokio::test]
    async fn test_entry_walks_fork_schedule() {
        let chain = make_chain();
        let record = Arc::new(RecordingRecord::new());
        let handle = EnrUpdater::start(
            Arc::clone(&chain),
            Arc::clone(&record),
            EnrUpdaterConfig::default(),
            CancellationToken::new(),
        );

        extend(&chain, 60).await;
        timeout(Duration::from_secs(5), record.wait_for_writes(61))
            .await
            .expect("updater did not publish every head");

        let entries = record.entries::<EthEnrEntry>().unwrap();
        assert_eq!(entries.len(), 61);
        assert_eq!(dedup_nexts(&entries), vec![10, 50, 0]);

        // Three distinct checksums: genesis, after alpha, after both.
        let mut hashes: Vec<ForkHash> = entries.iter().map(|e| e.fork_id.hash).collect();
        hashes.dedup();
        assert_eq!(hashes.len(), 3);

        let last = entries.last().unwrap();
        assert_eq!(
            last.fork_id,
            ForkId::compute(&two_fork_config(), &chain.genesis_hash(), 60, 720)
        );
        assert!(last.rest.is_empty());

        chain.stop();
        let exit = handle.stopped().await.unwrap();
        assert!(matches!(exit, UpdaterExit::SourceClosed(_)));
    }

    #[tokio::test]
    async fn test_local_record_seq_tracks_changes() {
        let chain = make_chain();
        let record = Arc::new(LocalNodeRecord::new(1));
        let handle = EnrUpdater::start(
            Arc::clone(&chain),
            Arc::clone(&record),
            EnrUpdaterConfig::default(),
            CancellationToken::new(),
        );
        // Initial publish happens before `start` returns.
        assert_eq!(record.seq(), 2);

        // Heights 1..=9 republish an identical entry.
        extend(&chain, 9).await;
        chain.stop();
        handle.stopped().await.unwrap();
        assert_eq!(record.seq(), 2);
        assert_eq!(record.load::<EthEnrEntry>().unwrap().fork_id.next, 10);
    }

    #[tokio::test]
    async fn test_published_bytes_are_canonical() {
        let chain = make_chain();
        let record = Arc::new(LocalNodeRecord::new(0));
        let handle = EnrUpdater::start(
            Arc::clone(&chain),
            Arc::clone(&record),
            EnrUpdaterConfig::default(),
            CancellationToken::new(),
        );
        handle.shutdown().await.unwrap();

        let node = record.node();
        let raw = node.get_raw(EthEnrEntry::ENR_KEY).unwrap();
        let expected = ForkId::compute(&two_fork_config(), &chain.genesis_hash(), 0, 0);
        let decoded = EthEnrEntry::decode_value(raw).unwrap();

        assert_eq!(decoded.fork_id, expected);
        assert_eq!(raw, EthEnrEntry::new(expected).encode_value().as_slice());
        // [[hash, next]] with a one-byte next of 10.
        assert_eq!(hex::encode(&raw[raw.len() - 1..]), "0a");
    }

    // =============================================================================
    // RECORD -> PEER FILTER
    // =============================================================================

    #[test]
    fn test_peers_on_different_heads_accept_each_other() {
        let config = two_fork_config();
        let genesis = BlockHeader::genesis(0).hash;

        // A is past both forks, B is still before the first.
        let a = ForkId::compute(&config, &genesis, 60, 720);
        let b = ForkId::compute(&config, &genesis, 5, 60);

        let filter = ForkFilter::new(&config, &genesis);
        assert_eq!(filter.validate(b, 60, 720), Ok(()));
        assert_eq!(filter.validate(a, 5, 60), Ok(()));
    }

    #[test]
    fn test_stale_and_foreign_peers_are_rejected() {
        let config = two_fork_config();
        let genesis = BlockHeader::genesis(0).hash;
        let filter = ForkFilter::new(&config, &genesis);

        // Same genesis, but unaware of the alpha fork.
        let stale = ForkId::new(ForkHash::from_genesis(&genesis), 0);
        assert_eq!(filter.validate(stale, 60, 720), Err(ForkIdError::RemoteStale));

        // Different genesis.
        let foreign = ForkId::compute(&config, &BlockHeader::genesis(1).hash, 60, 720);
        assert_eq!(
            filter.validate(foreign, 60, 720),
            Err(ForkIdError::LocalIncompatibleOrStale)
        );
    }

    #[tokio::test]
    async fn test_advertised_record_passes_remote_filter() {
        let chain = make_chain();
        extend(&chain, 20).await;

        let record = Arc::new(LocalNodeRecord::new(0));
        let handle = EnrUpdater::start(
            Arc::clone(&chain),
            Arc::clone(&record),
            EnrUpdaterConfig::default(),
            CancellationToken::new(),
        );
        handle.shutdown().await.unwrap();

        // A remote node still at height 3 reads our record.
        let entry = EthEnrEntry::from_record(&record.node()).unwrap();
        assert_eq!(entry.fork_id.next, 50);
        let remote = ForkFilter::new(&two_fork_config(), &chain.genesis_hash());
        assert_eq!(remote.validate(entry.fork_id, 3, 36), Ok(()));
    }

    // =============================================================================
    // CHAIN STOP -> UPDATER EXIT
    // =============================================================================

    #[tokio::test]
    async fn test_chain_stop_ends_updater_and_releases_subscription() {
        let chain = make_chain();
        let record = Arc::new(RecordingRecord::new());
        let handle = EnrUpdater::start(
            Arc::clone(&chain),
            Arc::clone(&record),
            EnrUpdaterConfig::default(),
            CancellationToken::new(),
        );
        assert_eq!(chain.subscriber_count(), 1);

        chain.stop();
        let exit = timeout(Duration::from_secs(2), handle.stopped())
            .await
            .expect("updater did not exit")
            .unwrap();

        assert!(matches!(exit, UpdaterExit::SourceClosed(_)));
        assert_eq!(chain.subscriber_count(), 0);
        assert_eq!(record.write_count(), 1);
    }
}
