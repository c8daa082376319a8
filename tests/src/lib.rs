//! # Forkcast Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks
//! └── src/integration/  # Cross-crate flows
//!     ├── flows.rs      # Chain -> updater -> record -> peer filter
//!     └── restart.rs    # Runtime persistence across restarts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fc-tests
//! cargo bench -p fc-tests
//! ```

pub mod integration;
