//! # Fork Identifiers
//!
//! Compact chain compatibility fingerprints (EIP-2124).
//!
//! A [`ForkId`] folds the genesis hash and every upgrade the chain has
//! already passed into a CRC32 checksum, and names the next upgrade the
//! node knows about. Two nodes can compare fork ids before connecting to
//! tell whether they follow the same rules.
//!
//! ## Example
//!
//! ```rust
//! use fc_01_fork_id::ForkId;
//! use shared_types::ChainConfig;
//!
//! let config = ChainConfig::new(1)
//!     .with_block_fork("first", 10)
//!     .with_block_fork("second", 50);
//! let genesis = [0u8; 32];
//!
//! let id = ForkId::compute(&config, &genesis, 10, 0);
//! assert_eq!(id.next, 50);
//!
//! let later = ForkId::compute(&config, &genesis, 51, 0);
//! assert!(!later.has_next());
//! ```

mod errors;
mod filter;
mod fork_id;
mod forks;

pub use errors::ForkIdError;
pub use filter::ForkFilter;
pub use fork_id::{ForkHash, ForkId};
pub use forks::{gather_forks, GatheredForks};

/// Timestamps above this value are treated as time-based activations when
/// judging a remote `next` (Ethereum mainnet genesis time).
pub const TIMESTAMP_THRESHOLD: u64 = 1_438_269_973;
