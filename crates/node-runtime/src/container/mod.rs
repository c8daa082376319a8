//! # Node Container
//!
//! Configuration shared by every component the runtime wires together.

pub mod config;

pub use config::{ChainSettings, DevConfig, DiscoveryConfig, NodeConfig, StorageConfig};
