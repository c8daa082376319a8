//! # Storage Port
//!
//! The key-value surface the node writes through. `Database` is the RocksDB
//! implementation; callers hold a `Box<dyn KeyValueStore>`.

use crate::errors::RawDbError;

/// Byte-keyed storage.
///
/// `atomic_batch_write` applies all of its operations or none of them.
/// Mutating calls fail with [`RawDbError::ReadOnly`] on a read-only handle.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RawDbError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), RawDbError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&mut self, key: &[u8]) -> Result<(), RawDbError>;

    /// Apply `operations` in order as one write.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), RawDbError>;

    /// Whether `key` holds a value.
    fn exists(&self, key: &[u8]) -> Result<bool, RawDbError>;

    /// All entries whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, RawDbError>;
}

/// One step of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Store `value` under `key`.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key`.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Shorthand for [`BatchOperation::Put`].
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Shorthand for [`BatchOperation::Delete`].
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::Delete { key: key.into() }
    }
}
