//! # Header Store
//!
//! Persists canonical headers in the chain database so a restarted node
//! resumes from its previous head.
//!
//! ## Key Layout
//!
//! - `h` + height (8 bytes, big-endian) -> header (JSON)
//! - `LastHeader` -> height of the head (8 bytes, big-endian)

use fc_03_rawdb::{BatchOperation, KeyValueStore, RawDbError};
use parking_lot::Mutex;
use shared_types::BlockHeader;
use thiserror::Error;

const HEADER_PREFIX: &[u8] = b"h";
const HEAD_KEY: &[u8] = b"LastHeader";

/// Header store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database failed.
    #[error(transparent)]
    Db(#[from] RawDbError),

    /// A stored header could not be decoded.
    #[error("corrupt header record: {0}")]
    Codec(#[from] serde_json::Error),

    /// The head pointer is not an 8-byte height.
    #[error("corrupt head pointer")]
    CorruptHead,

    /// The head pointer names a header that is not stored.
    #[error("missing header at height {0}")]
    MissingHeader(u64),
}

/// Canonical headers on top of a key-value store.
pub struct HeaderStore {
    db: Mutex<Box<dyn KeyValueStore>>,
}

impl HeaderStore {
    /// Wrap an open database.
    pub fn new(db: Box<dyn KeyValueStore>) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn header_key(height: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(HEADER_PREFIX.len() + 8);
        key.extend_from_slice(HEADER_PREFIX);
        key.extend_from_slice(&height.to_be_bytes());
        key
    }

    /// Store `header` and make it the head, atomically.
    pub fn write_head(&self, header: &BlockHeader) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(header)?;
        let ops = vec![
            BatchOperation::put(Self::header_key(header.height), encoded),
            BatchOperation::put(HEAD_KEY.to_vec(), header.height.to_be_bytes().to_vec()),
        ];
        self.db.lock().atomic_batch_write(ops)?;
        Ok(())
    }

    /// Height of the stored head, if any.
    pub fn head_height(&self) -> Result<Option<u64>, StoreError> {
        let Some(raw) = self.db.lock().get(HEAD_KEY)? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| StoreError::CorruptHead)?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    /// Header stored at `height`.
    pub fn header(&self, height: u64) -> Result<Option<BlockHeader>, StoreError> {
        match self.db.lock().get(&Self::header_key(height))? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Canonical headers from genesis up to the stored head.
    ///
    /// Headers above the head (left behind by a reorg to a shorter chain)
    /// are ignored. Empty when nothing was stored yet.
    pub fn read_chain(&self) -> Result<Vec<BlockHeader>, StoreError> {
        let Some(head) = self.head_height()? else {
            return Ok(Vec::new());
        };

        let mut headers = Vec::with_capacity(head as usize + 1);
        for (key, value) in self.db.lock().prefix_scan(HEADER_PREFIX)? {
            if key.len() != HEADER_PREFIX.len() + 8 {
                continue;
            }
            let header: BlockHeader = serde_json::from_slice(&value)?;
            if header.height > head {
                break;
            }
            headers.push(header);
        }

        if headers.len() as u64 != head + 1 {
            return Err(StoreError::MissingHeader(headers.len() as u64));
        }
        Ok(headers)
    }
}

impl std::fmt::Debug for HeaderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderStore").finish_non_exhaustive()
    }
}
