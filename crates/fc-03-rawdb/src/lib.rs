//! # Raw Database
//!
//! Opens the node's persistent key-value database.
//!
//! This crate is a thin constructor around RocksDB: it sizes the block
//! cache and file handle budget, picks read-write or read-only mode, and
//! hands back a [`Database`] implementing the [`KeyValueStore`] port.
//! Engine failures are passed through unchanged.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fc_03_rawdb::{open_database, KeyValueStore};
//!
//! let mut db = open_database("./data/chaindata", 512, 256, "eth/db/chaindata/", false)?;
//! db.put(b"key", b"value")?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod database;
mod errors;
pub mod ports;

pub use database::{open_database, Database, MIN_CACHE_MB, MIN_HANDLES};
pub use errors::RawDbError;
pub use ports::{BatchOperation, KeyValueStore};
