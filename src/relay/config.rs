//! Relay configuration

use std::path::PathBuf;

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_FILE};
use crate::registry::DEFAULT_QUEUE_CAPACITY;

/// Relay core configuration options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Number of recent messages replayed to new subscribers
    pub cache_capacity: usize,

    /// File the replay cache is persisted to (None = memory only)
    pub cache_path: Option<PathBuf>,

    /// Outbound queue capacity per subscriber
    pub subscriber_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_path: Some(PathBuf::from(DEFAULT_CACHE_FILE)),
            subscriber_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Set the replay cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Persist the replay cache to `path`
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Keep the replay cache in memory only
    pub fn memory_only(mut self) -> Self {
        self.cache_path = None;
        self
    }

    /// Set the per-subscriber queue capacity
    ///
    /// The queue must hold at least one message; 0 is raised to 1.
    pub fn subscriber_queue_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_queue_capacity = capacity.max(1);
        self
    }
}
