//! Ports Layer - what the updater needs from the rest of the node

pub mod outbound;

pub use outbound::{ChainHeadSubscriber, ChainReader, DiscoveryRecord};
