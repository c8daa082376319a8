//! # Node Runtime Library
//!
//! The pieces of a Forkcast node, exposed for the binary and for tests.
//!
//! - `container` - node configuration
//! - `genesis` - genesis configuration and header
//! - `adapters` - chain, header store and dev block producer
//! - `runtime` - startup, shutdown and peer record checks
//! - `telemetry` - logging setup

#![warn(missing_docs)]

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod runtime;
pub mod telemetry;

pub use container::NodeConfig;
pub use runtime::{NodeRuntime, PeerCheckError};
pub use telemetry::{init_logging, TelemetryConfig, TelemetryError};
