//! # Record Entries
//!
//! Typed key/value pairs of a node record and the `eth` entry codec.
//!
//! The `eth` entry value is an RLP list whose first element is the fork id:
//!
//! ```text
//! [[fork_hash: 4 bytes, fork_next: u64], rest...]
//! ```
//!
//! Anything after the fork id is kept verbatim so that fields added by newer
//! protocol versions survive a decode/encode cycle.

use fc_01_fork_id::{ForkHash, ForkId};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

use crate::domain::errors::EntryError;
use crate::domain::record::NodeRecord;

/// A value that lives under a fixed key in a node record.
pub trait RecordEntry: Sized {
    /// Key the entry is stored under.
    const ENR_KEY: &'static str;

    /// Serialize the value.
    fn encode_value(&self) -> Vec<u8>;

    /// Parse a stored value.
    fn decode_value(bytes: &[u8]) -> Result<Self, EntryError>;
}

/// The `eth` entry advertising which chain and fork state we follow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EthEnrEntry {
    /// Fork fingerprint of the local chain head.
    pub fork_id: ForkId,

    /// Raw RLP items following the fork id, in order.
    pub rest: Vec<Vec<u8>>,
}

impl EthEnrEntry {
    /// Key the entry is stored under.
    pub const ENR_KEY: &'static str = "eth";

    /// An entry carrying only a fork id.
    pub fn new(fork_id: ForkId) -> Self {
        Self {
            fork_id,
            rest: Vec::new(),
        }
    }

    /// Read the entry from a record.
    pub fn from_record(record: &NodeRecord) -> Result<Self, EntryError> {
        record.load::<Self>()
    }
}

impl RecordEntry for EthEnrEntry {
    const ENR_KEY: &'static str = EthEnrEntry::ENR_KEY;

    fn encode_value(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }

    fn decode_value(bytes: &[u8]) -> Result<Self, EntryError> {
        let rlp = Rlp::new(bytes);
        let info = rlp.payload_info()?;
        let total = info.header_len.checked_add(info.value_len);
        if total != Some(bytes.len()) {
            return Err(DecoderError::RlpInconsistentLengthAndData.into());
        }
        Ok(Self::decode(&rlp)?)
    }
}

impl Encodable for EthEnrEntry {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(1 + self.rest.len());
        s.begin_list(2);
        s.append(&self.fork_id.hash.as_bytes().to_vec());
        s.append(&self.fork_id.next);
        for item in &self.rest {
            s.append_raw(item, 1);
        }
    }
}

impl Decodable for EthEnrEntry {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if !rlp.is_list() {
            return Err(DecoderError::RlpExpectedToBeList);
        }

        let fork_id = decode_fork_id(&rlp.at(0)?)?;

        // The iterator stops silently on a broken item, so compare what it
        // yielded against the declared payload length.
        let mut consumed = 0;
        let mut rest = Vec::new();
        for (index, item) in rlp.iter().enumerate() {
            consumed += item.as_raw().len();
            if index > 0 {
                rest.push(item.as_raw().to_vec());
            }
        }
        if consumed != rlp.payload_info()?.value_len {
            return Err(DecoderError::RlpInconsistentLengthAndData);
        }

        Ok(Self { fork_id, rest })
    }
}

/// Strict fork id decoding: exactly `[hash, next]`, hash of 4 bytes.
fn decode_fork_id(rlp: &Rlp) -> Result<ForkId, DecoderError> {
    if !rlp.is_list() {
        return Err(DecoderError::RlpExpectedToBeList);
    }
    if rlp.item_count()? != 2 {
        return Err(DecoderError::RlpIncorrectListLen);
    }

    let hash: Vec<u8> = rlp.val_at(0)?;
    let hash: [u8; 4] = hash
        .as_slice()
        .try_into()
        .map_err(|_| DecoderError::RlpInvalidLength)?;
    let next: u64 = rlp.val_at(1)?;

    Ok(ForkId::new(ForkHash(hash), next))
}
