//! Domain Errors for record entries

use rlp::DecoderError;
use thiserror::Error;

/// Errors reading a typed entry out of a node record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// The record carries no entry under the key.
    #[error("missing `{0}` entry in node record")]
    MissingKey(&'static str),

    /// The entry is present but structurally invalid.
    #[error("malformed record entry: {0}")]
    Malformed(#[from] DecoderError),
}
