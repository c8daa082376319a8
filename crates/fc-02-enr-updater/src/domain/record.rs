//! # Local Node Record
//!
//! The key/value half of an Ethereum Node Record (EIP-778) as kept by the
//! local node. Signing and the wire envelope belong to the discovery
//! transport; this type only tracks entries and the sequence number.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::entry::RecordEntry;
use crate::domain::errors::EntryError;
use crate::ports::DiscoveryRecord;

/// Point-in-time copy of the local record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeRecord {
    /// Sequence number, bumped on every change.
    seq: u64,
    /// Entries sorted by key, as EIP-778 requires.
    entries: BTreeMap<String, Vec<u8>>,
}

impl NodeRecord {
    /// Sequence number of this snapshot.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Decode a typed entry.
    pub fn load<E: RecordEntry>(&self) -> Result<E, EntryError> {
        let raw = self
            .get_raw(E::ENR_KEY)
            .ok_or(EntryError::MissingKey(E::ENR_KEY))?;
        E::decode_value(raw)
    }

    /// Keys present, in record order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The node's own record, shared between the discovery layer and the
/// components that publish entries into it.
///
/// Writes replace the value under a key. The sequence number only moves
/// when a write actually changes the record, so republishing an unchanged
/// entry does not force peers to refetch it.
#[derive(Debug, Default)]
pub struct LocalNodeRecord {
    inner: RwLock<NodeRecord>,
}

impl LocalNodeRecord {
    /// Create an empty record starting at `seq`.
    #[must_use]
    pub fn new(seq: u64) -> Self {
        Self {
            inner: RwLock::new(NodeRecord {
                seq,
                entries: BTreeMap::new(),
            }),
        }
    }

    /// Store a typed entry under its key.
    pub fn set<E: RecordEntry>(&self, entry: &E) {
        self.set_raw(E::ENR_KEY, entry.encode_value());
    }

    /// Store raw bytes under `key`.
    ///
    /// # Returns
    ///
    /// `true` if the record changed.
    pub fn set_raw(&self, key: &str, value: Vec<u8>) -> bool {
        let mut record = self.inner.write();
        if record.entries.get(key) == Some(&value) {
            return false;
        }
        record.entries.insert(key.to_string(), value);
        record.seq += 1;
        debug!(key, seq = record.seq, "Node record entry updated");
        true
    }

    /// Remove the entry under `key`.
    pub fn delete(&self, key: &str) -> bool {
        let mut record = self.inner.write();
        if record.entries.remove(key).is_none() {
            return false;
        }
        record.seq += 1;
        debug!(key, seq = record.seq, "Node record entry removed");
        true
    }

    /// Decode a typed entry from the current record.
    pub fn load<E: RecordEntry>(&self) -> Result<E, EntryError> {
        self.inner.read().load()
    }

    /// Snapshot of the current record.
    #[must_use]
    pub fn node(&self) -> NodeRecord {
        self.inner.read().clone()
    }

    /// Current sequence number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.inner.read().seq
    }
}

impl DiscoveryRecord for LocalNodeRecord {
    fn set_entry(&self, key: &'static str, value: Vec<u8>) {
        self.set_raw(key, value);
    }
}
