//! # Genesis Module
//!
//! Genesis configuration and chain initialization.
//!
//! The genesis file carries the genesis timestamp and the chain's protocol
//! upgrade schedule. Without a file the node runs the built-in dev chain.

pub mod builder;

pub use builder::{GenesisConfig, GenesisError};
