//! # Chain Events
//!
//! Defines the notification type that flows through the feed.

use serde::{Deserialize, Serialize};
use shared_types::BlockHeader;

/// The canonical head of the chain has changed.
///
/// This is an edge trigger. The header that caused the notification is
/// attached for diagnostics only; by the time an observer handles the
/// event the chain may already have moved on, so observers must re-read
/// the current head instead of trusting this payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHeadEvent {
    /// Header that became the head when the event was emitted.
    pub header: BlockHeader,
}

impl ChainHeadEvent {
    /// Create a head event for the given header.
    pub fn new(header: BlockHeader) -> Self {
        Self { header }
    }

    /// Height of the header that triggered the event.
    pub fn height(&self) -> u64 {
        self.header.height
    }
}
