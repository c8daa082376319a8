//! # Integration Tests
//!
//! Flows spanning the fork id, updater, storage and runtime crates.

pub mod flows;
pub mod restart;
