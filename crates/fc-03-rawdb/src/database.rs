//! # RocksDB Database
//!
//! RocksDB-backed implementation of the [`KeyValueStore`] port.
//!
//! ## Sizing
//!
//! - Block cache: `cache_mb` MiB, LRU
//! - Memtables: two of `cache_mb / 4` MiB each
//! - File handles: `handles`
//!
//! Both budgets have a floor of 16.

use parking_lot::RwLock;
use rocksdb::{BlockBasedOptions, Cache, DBCompressionType, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::errors::RawDbError;
use crate::ports::{BatchOperation, KeyValueStore};

/// Smallest block cache handed to the engine, in MiB.
pub const MIN_CACHE_MB: usize = 16;

/// Smallest file handle budget handed to the engine.
pub const MIN_HANDLES: usize = 16;

const MIB: usize = 1024 * 1024;

/// Open a persistent key-value database at `path`.
///
/// A read-write open creates the directory when missing. A read-only open
/// requires an existing database. `namespace` only labels the database in
/// logs.
///
/// # Errors
///
/// Engine errors are returned as [`RawDbError::Engine`] without
/// interpretation.
pub fn open_database(
    path: impl AsRef<Path>,
    cache_mb: usize,
    handles: usize,
    namespace: &str,
    read_only: bool,
) -> Result<Database, RawDbError> {
    let path = path.as_ref();
    let cache_mb = cache_mb.max(MIN_CACHE_MB);
    let handles = handles.max(MIN_HANDLES);

    info!(
        database = %path.display(),
        namespace,
        cache_mb,
        handles,
        read_only,
        "Allocated cache and file handles"
    );

    let mut opts = Options::default();
    opts.create_if_missing(!read_only);
    opts.set_max_open_files(i32::try_from(handles).unwrap_or(i32::MAX));
    opts.set_write_buffer_size(cache_mb * MIB / 4);
    opts.set_max_write_buffer_number(2);
    opts.set_compression_type(DBCompressionType::Snappy);

    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_bloom_filter(10.0, false);
    block_opts.set_block_cache(&Cache::new_lru_cache(cache_mb * MIB));
    opts.set_block_based_table_factory(&block_opts);

    let db = if read_only {
        DB::open_for_read_only(&opts, path, false)?
    } else {
        DB::open(&opts, path)?
    };

    Ok(Database {
        db: Arc::new(RwLock::new(db)),
        path: path.to_path_buf(),
        namespace: namespace.to_string(),
        read_only,
    })
}

/// An open RocksDB database.
pub struct Database {
    db: Arc<RwLock<DB>>,
    path: PathBuf,
    namespace: String,
    read_only: bool,
}

impl Database {
    /// Directory the database lives in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Label given at open time.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether writes are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn ensure_writable(&self) -> Result<(), RawDbError> {
        if self.read_only {
            return Err(RawDbError::ReadOnly);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("namespace", &self.namespace)
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RawDbError> {
        Ok(self.db.read().get(key)?)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), RawDbError> {
        self.ensure_writable()?;
        Ok(self.db.write().put(key, value)?)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), RawDbError> {
        self.ensure_writable()?;
        Ok(self.db.write().delete(key)?)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), RawDbError> {
        self.ensure_writable()?;

        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }

        Ok(self.db.write().write(batch)?)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, RawDbError> {
        Ok(self.db.read().get_pinned(key)?.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, RawDbError> {
        let db = self.db.read();
        let mut results = Vec::new();

        for item in db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }
}
