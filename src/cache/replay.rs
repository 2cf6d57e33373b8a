//! Replay cache for late-joiner support
//!
//! When a new subscriber connects it first receives the most recent messages
//! so it has some context before live traffic arrives. The cache holds at
//! most `capacity` messages; older ones are evicted first.
//!
//! Persistence is handled by a single background task. Every append wakes
//! it, but a burst of appends collapses into one write of the latest
//! contents, so durable state converges to the most recent append without
//! a write per message.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::error::CacheError;
use crate::relay::RelayMessage;

use super::store::CacheStore;

/// Default number of messages kept for replay
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Bounded, ordered buffer of recent messages
#[derive(Debug)]
pub struct ReplayCache {
    /// Buffered messages, oldest first
    entries: Mutex<VecDeque<RelayMessage>>,
    /// Maximum number of buffered messages
    capacity: usize,
    /// Durable storage (None = memory only)
    store: Option<CacheStore>,
    /// Wakes the persist task after an append
    dirty: Notify,
    /// Serializes writes to the store
    persist_lock: Mutex<()>,
}

impl ReplayCache {
    /// Create an empty, memory-only cache
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None, VecDeque::new())
    }

    /// Create an empty cache backed by `store`
    pub fn with_store(capacity: usize, store: CacheStore) -> Self {
        Self::build(capacity, Some(store), VecDeque::new())
    }

    /// Load the cache from `store`
    ///
    /// A missing file yields an empty cache. An unreadable or corrupt file is
    /// logged and also yields an empty cache; it never fails startup. A
    /// snapshot larger than `capacity` keeps only its newest entries.
    pub async fn load(capacity: usize, store: CacheStore) -> Self {
        let entries = match store.load().await {
            Ok(Some(messages)) => {
                let mut entries = VecDeque::from(messages);
                let excess = entries.len().saturating_sub(capacity);
                entries.drain(..excess);
                tracing::info!(
                    path = %store.path().display(),
                    entries = entries.len(),
                    "Loaded cached messages"
                );
                entries
            }
            Ok(None) => {
                tracing::debug!(path = %store.path().display(), "No cache file, starting empty");
                VecDeque::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %store.path().display(),
                    error = %e,
                    "Discarding unusable cache file"
                );
                VecDeque::new()
            }
        };

        Self::build(capacity, Some(store), entries)
    }

    fn build(capacity: usize, store: Option<CacheStore>, entries: VecDeque<RelayMessage>) -> Self {
        Self {
            entries: Mutex::new(entries),
            capacity,
            store,
            dirty: Notify::new(),
            persist_lock: Mutex::new(()),
        }
    }

    /// Maximum number of messages held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Durable store, if any
    pub fn store(&self) -> Option<&CacheStore> {
        self.store.as_ref()
    }

    /// Append a message, evicting the oldest entries beyond capacity
    ///
    /// Returns immediately; persistence happens on the background task.
    pub async fn append(&self, message: RelayMessage) {
        {
            let mut entries = self.entries.lock().await;
            entries.push_back(message);

            let excess = entries.len().saturating_sub(self.capacity);
            if excess > 0 {
                entries.drain(..excess);
                tracing::trace!(evicted = excess, "Evicted oldest cached messages");
            }
        }

        if self.store.is_some() {
            self.dirty.notify_one();
        }
    }

    /// Ordered copy of the current contents
    pub async fn snapshot(&self) -> Vec<RelayMessage> {
        self.entries.lock().await.iter().cloned().collect()
    }

    /// Number of cached messages
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Write the current contents to the store
    ///
    /// No-op for a memory-only cache.
    pub async fn persist(&self) -> Result<(), CacheError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let _guard = self.persist_lock.lock().await;
        let snapshot = self.snapshot().await;
        store.persist(&snapshot).await
    }

    /// Spawn the background persistence task
    ///
    /// Returns `None` for a memory-only cache. The task runs until aborted.
    pub fn spawn_persist_task(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.store.as_ref()?;
        let cache = Arc::clone(self);

        Some(tokio::spawn(async move {
            loop {
                cache.dirty.notified().await;
                if let Err(e) = cache.persist().await {
                    tracing::warn!(error = %e, "Cache persist failed, will retry on next append");
                }
            }
        }))
    }
}
