//! # Adapters
//!
//! Concrete implementations behind the node's ports.
//!
//! - `chain` - in-memory canonical chain with head feed
//! - `store` - header persistence on the chain database
//! - `producer` - dev block production

pub mod chain;
pub mod producer;
pub mod store;

pub use chain::{ChainError, InMemoryChain};
pub use producer::DevBlockProducer;
pub use store::{HeaderStore, StoreError};
