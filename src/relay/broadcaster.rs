//! Broadcaster
//!
//! Couples the replay cache with the subscriber registry. Publishing appends
//! to the cache and enqueues on every subscriber; subscribing registers a
//! queue and hands back the cache contents to replay.
//!
//! Both operations run under one gate. Because registration and the replay
//! snapshot happen together, and append and fan-out happen together, a new
//! subscriber sees each message exactly once: either in its replay or in its
//! queue. The cache and registry locks are taken one after the other inside
//! the gate, never nested, and no lock is held during network I/O.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::cache::ReplayCache;
use crate::registry::{SubscriberHandle, SubscriberId, SubscriberRegistry};
use crate::stats::RelayStats;

use super::message::RelayMessage;

/// A newly registered subscriber
#[derive(Debug)]
pub struct Subscription {
    /// Subscriber id, used to unsubscribe
    pub id: SubscriberId,
    /// Cached messages to send before anything from `receiver`
    pub replay: Vec<RelayMessage>,
    /// Live messages published after registration
    pub receiver: mpsc::Receiver<RelayMessage>,
}

/// Fan-out from the stream to live subscribers
#[derive(Debug)]
pub struct Broadcaster {
    cache: Arc<ReplayCache>,
    registry: SubscriberRegistry,
    stats: Arc<RelayStats>,
    queue_capacity: usize,
    /// Serializes publish against subscriber registration
    gate: Mutex<()>,
}

impl Broadcaster {
    /// Create a broadcaster over `cache`
    pub fn new(cache: Arc<ReplayCache>, queue_capacity: usize) -> Self {
        Self::with_stats(cache, queue_capacity, Arc::new(RelayStats::new()))
    }

    /// Create a broadcaster that reports into shared `stats`
    pub fn with_stats(
        cache: Arc<ReplayCache>,
        queue_capacity: usize,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            cache,
            registry: SubscriberRegistry::new(),
            stats,
            queue_capacity,
            gate: Mutex::new(()),
        }
    }

    /// The replay cache
    pub fn cache(&self) -> &Arc<ReplayCache> {
        &self.cache
    }

    /// The subscriber registry
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Relay statistics
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Register a new subscriber with its own outbound queue
    pub async fn subscribe(&self) -> Subscription {
        let id = self.registry.next_id();
        let (handle, receiver) = SubscriberHandle::channel(id, self.queue_capacity);
        let replay = self.register_handle(handle).await;

        Subscription {
            id,
            replay,
            receiver,
        }
    }

    /// Register `handle` and return the messages it should replay
    ///
    /// The caller sends the replay, outside any lock, before draining the
    /// handle's queue. If that fails it should call [`unsubscribe`].
    ///
    /// [`unsubscribe`]: Broadcaster::unsubscribe
    pub async fn register_handle(&self, handle: SubscriberHandle) -> Vec<RelayMessage> {
        let id = handle.id();

        let (added, replay) = {
            let _gate = self.gate.lock().await;
            let added = self.registry.register(handle).await;
            let replay = self.cache.snapshot().await;
            (added, replay)
        };

        if added {
            tracing::info!(
                subscriber = %id,
                replay = replay.len(),
                "Subscriber added"
            );
        }

        replay
    }

    /// Remove a subscriber; no-op if it is already gone
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.registry.unregister(id).await;

        if removed {
            tracing::debug!(subscriber = %id, "Subscriber removed");
        }

        removed
    }

    /// Append `message` to the cache and enqueue it for every subscriber
    ///
    /// Subscribers whose queue is full or closed are removed and receive
    /// nothing further. Returns the number of subscribers the message was
    /// enqueued for.
    pub async fn publish(&self, message: RelayMessage) -> usize {
        let _gate = self.gate.lock().await;

        self.cache.append(message.clone()).await;

        let mut delivered = 0;
        let failed = self
            .registry
            .for_each(|handle| {
                handle.try_send(message.clone())?;
                delivered += 1;
                Ok(())
            })
            .await;

        if !failed.is_empty() {
            for (id, reason) in &failed {
                tracing::debug!(subscriber = %id, reason = %reason, "Dropping subscriber");
            }

            let ids: Vec<SubscriberId> = failed.iter().map(|(id, _)| *id).collect();
            let removed = self.registry.remove_all(&ids).await;
            self.stats.record_dropped(removed);
        }

        self.stats.record_publish(delivered);
        delivered
    }

    /// Number of registered subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.registry.len().await
    }
}
