//! # ENR Updater
//!
//! Background task that republishes the `eth` record entry whenever the
//! chain head moves.
//!
//! ## Lifecycle
//!
//! 1. `start` subscribes to head notifications, publishes the entry for the
//!    current head and spawns the loop.
//! 2. Each notification triggers a recomputation from the chain's *current*
//!    head. The notification payload is not used, so a burst of
//!    notifications costs at most one write each and the last write always
//!    reflects the newest head.
//! 3. The loop ends when the head feed reports a terminal error or the
//!    cancellation token fires. Either way the subscription is released
//!    before the task finishes.

use std::sync::Arc;

use fc_01_fork_id::ForkId;
use shared_bus::{HeadSubscription, HeadUpdate, SubscriptionError, DEFAULT_HEAD_CHANNEL_CAPACITY};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::domain::{EthEnrEntry, RecordEntry};
use crate::ports::{ChainHeadSubscriber, ChainReader, DiscoveryRecord};

/// Updater configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrUpdaterConfig {
    /// Capacity of the head notification channel.
    pub channel_capacity: usize,
}

impl Default for EnrUpdaterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_HEAD_CHANNEL_CAPACITY,
        }
    }
}

/// Why the update loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdaterExit {
    /// The head feed ended.
    SourceClosed(SubscriptionError),
    /// Shutdown was requested through the cancellation token.
    Cancelled,
}

/// Errors reported by [`EnrUpdaterHandle`].
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// The update task panicked or was aborted.
    #[error("ENR updater task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

/// Entry point for the background updater.
pub struct EnrUpdater;

impl EnrUpdater {
    /// Start keeping the `eth` entry of `record` in sync with `chain`.
    ///
    /// The entry for the current head is written before this returns. The
    /// loop itself runs on a spawned task; cancelling `cancel` or closing
    /// the chain's head feed stops it.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<C, R>(
        chain: Arc<C>,
        record: Arc<R>,
        config: EnrUpdaterConfig,
        cancel: CancellationToken,
    ) -> EnrUpdaterHandle
    where
        C: ChainReader + ChainHeadSubscriber + ?Sized + 'static,
        R: DiscoveryRecord + ?Sized + 'static,
    {
        let subscription = chain.subscribe_chain_head(config.channel_capacity);
        let initial = publish_current(chain.as_ref(), record.as_ref());

        info!(
            fork_id = %initial,
            capacity = config.channel_capacity,
            "ENR updater started"
        );

        let task = tokio::spawn(run_update_loop(chain, record, subscription, cancel.clone()));

        EnrUpdaterHandle { cancel, task }
    }
}

/// Handle to a running updater.
#[derive(Debug)]
pub struct EnrUpdaterHandle {
    cancel: CancellationToken,
    task: JoinHandle<UpdaterExit>,
}

impl EnrUpdaterHandle {
    /// Ask the loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to finish on its own.
    pub async fn stopped(self) -> Result<UpdaterExit, UpdaterError> {
        Ok(self.task.await?)
    }

    /// Cancel the loop and wait for it to finish.
    pub async fn shutdown(self) -> Result<UpdaterExit, UpdaterError> {
        self.cancel();
        self.stopped().await
    }
}

/// The `eth` entry for the chain's current head.
pub fn current_entry<C>(chain: &C) -> EthEnrEntry
where
    C: ChainReader + ?Sized,
{
    let head = chain.current_header();
    EthEnrEntry::new(ForkId::compute_with_genesis_time(
        chain.chain_config(),
        &chain.genesis_hash(),
        chain.genesis_time(),
        head.height,
        head.timestamp,
    ))
}

/// Recompute the entry and hand it to the record.
fn publish_current<C, R>(chain: &C, record: &R) -> ForkId
where
    C: ChainReader + ?Sized,
    R: DiscoveryRecord + ?Sized,
{
    let entry = current_entry(chain);
    debug!(fork_id = %entry.fork_id, "Publishing eth record entry");
    record.set_entry(EthEnrEntry::ENR_KEY, entry.encode_value());
    entry.fork_id
}

async fn run_update_loop<C, R>(
    chain: Arc<C>,
    record: Arc<R>,
    mut subscription: HeadSubscription,
    cancel: CancellationToken,
) -> UpdaterExit
where
    C: ChainReader + ?Sized,
    R: DiscoveryRecord + ?Sized,
{
    let exit = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break UpdaterExit::Cancelled,
            update = subscription.next() => match update {
                HeadUpdate::Changed(event) => {
                    trace!(height = event.height(), "Chain head changed");
                    publish_current(chain.as_ref(), record.as_ref());
                }
                HeadUpdate::Closed(err) => break UpdaterExit::SourceClosed(err),
            },
        }
    };

    subscription.unsubscribe();
    info!(reason = ?exit, "ENR updater stopped");
    exit
}
