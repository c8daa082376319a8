//! # Shared Types Crate
//!
//! This crate contains the chain entities and the protocol upgrade schedule
//! shared by every subsystem of the node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Header and fork schedule types live here.
//! - **Plain Data**: No I/O and no async; consumers bring their own runtime.

pub mod config;
pub mod entities;

pub use config::{ChainConfig, Fork, ForkCondition};
pub use entities::*;
