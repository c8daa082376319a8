//! Database errors

use thiserror::Error;

/// Errors from the raw database.
#[derive(Debug, Error, Clone)]
pub enum RawDbError {
    /// Error reported by the storage engine, unchanged.
    #[error(transparent)]
    Engine(#[from] rocksdb::Error),

    /// A write was attempted on a database opened read-only.
    #[error("database is opened read-only")]
    ReadOnly,
}
