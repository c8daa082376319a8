//! # ENR Updater
//!
//! Keeps the `eth` entry of the local node record equal to the fork id of
//! the chain's current head.
//!
//! Peers read the `eth` entry from our discovery record to decide, before
//! dialing, whether we follow the same protocol upgrades. The entry must
//! therefore change as soon as the chain crosses a fork boundary.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `EthEnrEntry` codec, `LocalNodeRecord`
//! - **Ports Layer:** `ChainReader`, `ChainHeadSubscriber`, `DiscoveryRecord`
//! - **Service Layer:** `EnrUpdater` background loop
//!
//! ## Example
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let handle = EnrUpdater::start(chain, record, EnrUpdaterConfig::default(), cancel);
//! // ... node runs ...
//! handle.shutdown().await?;
//! ```

pub mod domain;
pub mod ports;
pub mod service;

/// Test doubles for the chain and record ports.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Domain
pub use domain::{EntryError, EthEnrEntry, LocalNodeRecord, NodeRecord, RecordEntry};

// Ports
pub use ports::{ChainHeadSubscriber, ChainReader, DiscoveryRecord};

// Service
pub use service::{
    current_entry, EnrUpdater, EnrUpdaterConfig, EnrUpdaterHandle, UpdaterError, UpdaterExit,
};

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::{MockChain, RecordingRecord};
