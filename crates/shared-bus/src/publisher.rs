//! # Chain Head Feed
//!
//! Defines the publishing side of the head notification channel.

use crate::events::ChainHeadEvent;
use crate::subscriber::{HeadSubscription, SubscriptionError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// One registered subscriber.
struct SubscriberSlot {
    events: mpsc::Sender<ChainHeadEvent>,
    err: Option<oneshot::Sender<SubscriptionError>>,
}

/// Shared bookkeeping between the feed and its subscriptions.
#[derive(Default)]
pub(crate) struct FeedState {
    next_id: u64,
    subscribers: HashMap<u64, SubscriberSlot>,
    closed: bool,
}

impl FeedState {
    /// Drop a subscriber slot. Unknown ids are ignored.
    pub(crate) fn remove(&mut self, id: u64) {
        self.subscribers.remove(&id);
    }
}

/// Fan-out of chain head notifications.
///
/// Every subscriber owns a bounded channel sized at subscription time.
/// `send` waits for room in each channel instead of dropping, so a slow
/// subscriber slows the publisher down rather than missing an edge.
pub struct ChainHeadFeed {
    /// Subscriber registry, shared weakly with every subscription.
    state: Arc<Mutex<FeedState>>,

    /// Total notifications sent.
    events_published: AtomicU64,
}

impl ChainHeadFeed {
    /// Create an open feed without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState::default())),
            events_published: AtomicU64::new(0),
        }
    }

    /// Register a subscriber with a channel of `capacity` notifications.
    ///
    /// A capacity of zero is raised to one. Subscribing to a closed feed
    /// yields a subscription whose terminal error is already pending.
    #[must_use]
    pub fn subscribe(&self, capacity: usize) -> HeadSubscription {
        let (events_tx, events_rx) = mpsc::channel(capacity.max(1));
        let (err_tx, err_rx) = oneshot::channel();

        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;

        if state.closed {
            // Receiver is alive, so this cannot fail.
            let _ = err_tx.send(SubscriptionError::Closed);
        } else {
            state.subscribers.insert(
                id,
                SubscriberSlot {
                    events: events_tx,
                    err: Some(err_tx),
                },
            );
        }
        drop(state);

        debug!(subscription = id, capacity, "New head subscription created");

        HeadSubscription::new(id, events_rx, err_rx, Arc::downgrade(&self.state))
    }

    /// Deliver a notification to every live subscriber.
    ///
    /// Waits while a subscriber's channel is full. Subscribers whose handle
    /// is gone are pruned.
    ///
    /// # Returns
    ///
    /// The number of subscribers that received the event. Zero once closed.
    pub async fn send(&self, event: ChainHeadEvent) -> usize {
        let targets: Vec<(u64, mpsc::Sender<ChainHeadEvent>)> = {
            let state = self.state.lock();
            if state.closed {
                debug!(height = event.height(), "Head event ignored, feed closed");
                return 0;
            }
            state
                .subscribers
                .iter()
                .map(|(id, slot)| (*id, slot.events.clone()))
                .collect()
        };

        self.events_published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0;
        for (id, sender) in targets {
            if sender.send(event.clone()).await.is_ok() {
                delivered += 1;
            } else {
                self.state.lock().remove(id);
            }
        }

        debug!(
            height = event.height(),
            receivers = delivered,
            "Head event published"
        );
        delivered
    }

    /// Close the feed permanently.
    ///
    /// Every current subscriber receives exactly one
    /// [`SubscriptionError::Closed`]. Calling `close` again does nothing.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;

        let count = state.subscribers.len();
        for (_, mut slot) in state.subscribers.drain() {
            if let Some(err) = slot.err.take() {
                let _ = err.send(SubscriptionError::Closed);
            }
        }

        info!(subscribers = count, "Chain head feed closed");
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Total number of notifications sent while open.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for ChainHeadFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChainHeadFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ChainHeadFeed")
            .field("subscribers", &state.subscribers.len())
            .field("closed", &state.closed)
            .finish()
    }
}
