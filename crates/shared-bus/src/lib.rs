//! # Shared Bus - Chain Head Notification Feed
//!
//! Carries "the canonical head moved" notifications from the chain to any
//! number of observers.
//!
//! ## Delivery Model
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │    Chain     │                    │   Observer   │
//! │              │    send()          │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ChainHeadFeed │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! - Each subscriber owns a bounded channel. A full channel makes the
//!   publisher wait (backpressure), nothing is dropped.
//! - Closing the feed delivers exactly one terminal error per subscriber.
//! - Unsubscribing is idempotent and also happens on drop.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::ChainHeadEvent;
pub use publisher::ChainHeadFeed;
pub use subscriber::{HeadSubscription, HeadUpdate, SubscriptionError};

/// Default buffer for a head subscription.
pub const DEFAULT_HEAD_CHANNEL_CAPACITY: usize = 10;
