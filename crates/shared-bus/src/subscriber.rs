//! # Head Subscription
//!
//! Defines the receiving side of the chain head feed.

use crate::events::ChainHeadEvent;
use crate::publisher::FeedState;
use parking_lot::Mutex;
use std::sync::Weak;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Terminal signals of a subscription.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The feed was closed permanently (node shutdown).
    #[error("Chain head feed closed")]
    Closed,

    /// The subscription was released by its owner.
    #[error("Subscription released")]
    Unsubscribed,
}

/// What a subscription produced next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadUpdate {
    /// The chain head moved.
    Changed(ChainHeadEvent),
    /// The subscription ended and will produce nothing more.
    Closed(SubscriptionError),
}

/// A registration with a [`ChainHeadFeed`](crate::ChainHeadFeed).
///
/// Exposes the notification channel, the terminal error channel and an
/// explicit `unsubscribe`. Dropping the handle unsubscribes.
pub struct HeadSubscription {
    /// Subscriber slot in the feed.
    id: u64,

    /// Bounded notification channel.
    events: mpsc::Receiver<ChainHeadEvent>,

    /// Carries at most one terminal error.
    err: oneshot::Receiver<SubscriptionError>,

    /// Terminal error once observed; the oneshot must not be polled again.
    terminal: Option<SubscriptionError>,

    /// Back-reference for removal. Weak so a dropped feed is not kept alive.
    feed: Weak<Mutex<FeedState>>,

    /// Set once `unsubscribe` ran.
    released: bool,
}

impl HeadSubscription {
    /// Create a new subscription.
    pub(crate) fn new(
        id: u64,
        events: mpsc::Receiver<ChainHeadEvent>,
        err: oneshot::Receiver<SubscriptionError>,
        feed: Weak<Mutex<FeedState>>,
    ) -> Self {
        Self {
            id,
            events,
            err,
            terminal: None,
            feed,
            released: false,
        }
    }

    /// Wait for whichever comes first: a head notification or the terminal
    /// error.
    ///
    /// When both are ready the terminal error wins, so nothing queued behind
    /// a closure is ever handed out. Once `Closed` has been returned every
    /// later call returns the same value immediately.
    ///
    /// Cancel safe: dropping the future loses no notification.
    pub async fn next(&mut self) -> HeadUpdate {
        if let Some(err) = &self.terminal {
            return HeadUpdate::Closed(err.clone());
        }

        let orphaned = self.orphaned();
        let update = tokio::select! {
            biased;
            err = &mut self.err => HeadUpdate::Closed(err.unwrap_or(orphaned)),
            event = self.events.recv() => match event {
                Some(event) => HeadUpdate::Changed(event),
                // All senders gone without a terminal error: the feed was
                // dropped outright, which is a closure as well.
                None => HeadUpdate::Closed(SubscriptionError::Closed),
            },
        };

        if let HeadUpdate::Closed(err) = &update {
            self.terminal = Some(err.clone());
        }
        update
    }

    /// Wait for the terminal error only, ignoring notifications.
    pub async fn closed(&mut self) -> SubscriptionError {
        if let Some(err) = &self.terminal {
            return err.clone();
        }
        let orphaned = self.orphaned();
        let err = (&mut self.err).await.unwrap_or(orphaned);
        self.terminal = Some(err.clone());
        err
    }

    /// Take a queued notification without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - A notification was queued
    /// - `Ok(None)` - Nothing queued right now
    /// - `Err(_)` - The subscription has ended
    pub fn try_next(&mut self) -> Result<Option<ChainHeadEvent>, SubscriptionError> {
        if let Some(err) = &self.terminal {
            return Err(err.clone());
        }
        match self.err.try_recv() {
            Ok(err) => {
                self.terminal = Some(err.clone());
                return Err(err);
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                let err = self.orphaned();
                self.terminal = Some(err.clone());
                return Err(err);
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }
        match self.events.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.terminal = Some(SubscriptionError::Closed);
                Err(SubscriptionError::Closed)
            }
        }
    }

    /// Terminal error to report when the feed went away without sending one.
    fn orphaned(&self) -> SubscriptionError {
        if self.released {
            SubscriptionError::Unsubscribed
        } else {
            SubscriptionError::Closed
        }
    }

    /// Number of notifications waiting in the channel.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Whether `unsubscribe` already ran.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release the registration with the feed.
    ///
    /// Safe to call any number of times; only the first call has an effect.
    /// Queued notifications are discarded and a publisher blocked on this
    /// subscriber is woken up.
    pub fn unsubscribe(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(feed) = self.feed.upgrade() {
            feed.lock().remove(self.id);
        }
        self.events.close();
        while self.events.try_recv().is_ok() {}

        debug!(subscription = self.id, "Head subscription released");
    }
}

impl Drop for HeadSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for HeadSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadSubscription")
            .field("id", &self.id)
            .field("pending", &self.events.len())
            .field("terminal", &self.terminal)
            .field("released", &self.released)
            .finish()
    }
}
