//! Subscriber registry implementation
//!
//! Tracks live subscribers by id. Fan-out walks a point-in-time copy of the
//! membership so registrations and removals that happen during a pass never
//! disturb it; failed members are removed after the pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::error::SendError;
use super::subscriber::{SubscriberHandle, SubscriberId};

/// Set of live subscribers
#[derive(Debug)]
pub struct SubscriberRegistry {
    /// Registered subscribers
    members: RwLock<HashMap<SubscriberId, SubscriberHandle>>,

    /// Next id handed out by `next_id`
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh subscriber id
    pub fn next_id(&self) -> SubscriberId {
        SubscriberId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a subscriber
    ///
    /// Returns false (and changes nothing) if the id is already registered.
    pub async fn register(&self, handle: SubscriberHandle) -> bool {
        let mut members = self.members.write().await;

        if members.contains_key(&handle.id()) {
            return false;
        }

        members.insert(handle.id(), handle);
        true
    }

    /// Remove a subscriber
    ///
    /// Returns false if it was not registered.
    pub async fn unregister(&self, id: SubscriberId) -> bool {
        self.members.write().await.remove(&id).is_some()
    }

    /// Remove a batch of subscribers, returning how many were present
    pub async fn remove_all(&self, ids: &[SubscriberId]) -> usize {
        if ids.is_empty() {
            return 0;
        }

        let mut members = self.members.write().await;
        ids.iter().filter(|id| members.remove(*id).is_some()).count()
    }

    /// Whether a subscriber is registered
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.members.read().await.contains_key(&id)
    }

    /// Number of registered subscribers
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether no subscribers are registered
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Point-in-time copy of the registered subscribers, ordered by id
    pub async fn members(&self) -> Vec<SubscriberHandle> {
        let mut members: Vec<SubscriberHandle> =
            self.members.read().await.values().cloned().collect();
        members.sort_by_key(SubscriberHandle::id);
        members
    }

    /// Apply `f` to every registered subscriber
    ///
    /// The lock is released before `f` runs. Returns the subscribers for
    /// which `f` failed; removing them is left to the caller.
    pub async fn for_each<F>(&self, mut f: F) -> Vec<(SubscriberId, SendError)>
    where
        F: FnMut(&SubscriberHandle) -> Result<(), SendError>,
    {
        let members = self.members().await;

        members
            .iter()
            .filter_map(|handle| f(handle).err().map(|e| (handle.id(), e)))
            .collect()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
