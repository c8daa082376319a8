//! # Runtime Restart Tests
//!
//! A node that is stopped and started again on the same data directory
//! resumes from its stored head and advertises the matching `eth` entry.

#[cfg(test)]
mod tests {
    use std::path::Path;

    use fc_01_fork_id::ForkId;
    use fc_02_enr_updater::{ChainReader, UpdaterExit};
    use fc_03_rawdb::{open_database, KeyValueStore};
    use node_runtime::container::{DevConfig, StorageConfig};
    use node_runtime::{NodeConfig, NodeRuntime};
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> NodeConfig {
        NodeConfig {
            storage: StorageConfig {
                data_dir: dir.to_path_buf(),
                cache_mb: 16,
                handles: 16,
            },
            dev: DevConfig { block_time_secs: 0 },
            ..NodeConfig::default()
        }
    }

    /// Run a node, import `count` headers, and stop it.
    async fn run_and_extend(dir: &Path, count: u64) {
        let mut runtime = NodeRuntime::new(config_for(dir)).unwrap();
        runtime.start().unwrap();

        let chain = runtime.chain();
        let store = runtime.store();
        let mut head = chain.current_header();
        for _ in 0..count {
            head = head.child(head.timestamp + 12);
            store.write_head(&head).unwrap();
            chain.insert_head(head.clone()).await.unwrap();
        }

        let exit = runtime.shutdown().await.unwrap();
        assert!(matches!(exit, Some(UpdaterExit::SourceClosed(_))));
    }

    #[tokio::test]
    async fn test_restart_resumes_fork_state() {
        let dir = TempDir::new().unwrap();
        run_and_extend(dir.path(), 30).await;

        let mut runtime = NodeRuntime::new(config_for(dir.path())).unwrap();
        let chain = runtime.chain();
        assert_eq!(chain.height(), 30);

        runtime.start().unwrap();
        let entry = runtime.local_entry().unwrap();
        let head = chain.current_header();
        assert_eq!(
            entry.fork_id,
            ForkId::compute(chain.chain_config(), &chain.genesis_hash(), head.height, head.timestamp)
        );
        assert_eq!(entry.fork_id.next, 50);

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_restarts_accumulate_headers() {
        let dir = TempDir::new().unwrap();
        run_and_extend(dir.path(), 8).await;
        run_and_extend(dir.path(), 8).await;

        let runtime = NodeRuntime::new(config_for(dir.path())).unwrap();
        assert_eq!(runtime.chain().height(), 16);
        assert_eq!(runtime.store().head_height().unwrap(), Some(16));
    }

    #[tokio::test]
    async fn test_chain_database_readable_after_shutdown() {
        let dir = TempDir::new().unwrap();
        run_and_extend(dir.path(), 3).await;

        let config = config_for(dir.path());
        let db = open_database(config.storage.chaindata_dir(), 16, 16, "inspect/", true).unwrap();
        assert!(db.is_read_only());
        let head = db.get(b"LastHeader").unwrap().unwrap();
        assert_eq!(head, 3u64.to_be_bytes().to_vec());
    }
}
