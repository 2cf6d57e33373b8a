//! Relay service
//!
//! Owns the replay cache, the broadcaster and the persistence task for the
//! lifetime of the process. Collaborators (the stream consumer and the
//! WebSocket server) get the broadcaster by `Arc`.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::cache::{CacheStore, ReplayCache};
use crate::error::CacheError;
use crate::stats::RelayStats;

use super::broadcaster::Broadcaster;
use super::config::RelayConfig;

/// Running relay core
#[derive(Debug)]
pub struct Relay {
    config: RelayConfig,
    broadcaster: Arc<Broadcaster>,
    persist_task: Option<JoinHandle<()>>,
}

impl Relay {
    /// Load the replay cache and start the persistence task
    pub async fn start(config: RelayConfig) -> Self {
        let cache = match &config.cache_path {
            Some(path) => ReplayCache::load(config.cache_capacity, CacheStore::new(path)).await,
            None => ReplayCache::new(config.cache_capacity),
        };
        let cache = Arc::new(cache);
        let persist_task = cache.spawn_persist_task();

        let broadcaster = Arc::new(Broadcaster::with_stats(
            cache,
            config.subscriber_queue_capacity,
            Arc::new(RelayStats::new()),
        ));

        tracing::info!(
            cache_capacity = config.cache_capacity,
            cache_path = ?config.cache_path,
            queue_capacity = config.subscriber_queue_capacity,
            "Relay started"
        );

        Self {
            config,
            broadcaster,
            persist_task,
        }
    }

    /// Configuration the relay was started with
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The broadcaster shared with the consumer and the server
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Relay statistics
    pub fn stats(&self) -> &Arc<RelayStats> {
        self.broadcaster.stats()
    }

    /// Stop the persistence task and write the cache one last time
    pub async fn shutdown(mut self) -> Result<(), CacheError> {
        if let Some(task) = self.persist_task.take() {
            task.abort();
        }

        let result = self.broadcaster.cache().persist().await;
        match &result {
            Ok(()) => tracing::info!("Relay stopped"),
            Err(e) => tracing::warn!(error = %e, "Final cache persist failed"),
        }
        result
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if let Some(task) = self.persist_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::relay::RelayMessage;

    use super::*;

    #[tokio::test]
    async fn test_memory_only_relay() {
        let relay = Relay::start(RelayConfig::default().memory_only()).await;

        relay
            .broadcaster()
            .publish(RelayMessage::from("hello"))
            .await;

        assert_eq!(relay.broadcaster().cache().len().await, 1);
        tokio_test::assert_ok!(relay.shutdown().await);
    }

    #[tokio::test]
    async fn test_restart_restores_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let config = RelayConfig::default().cache_capacity(2).cache_path(&path);

        let relay = Relay::start(config.clone()).await;
        for text in ["a", "b", "c"] {
            relay.broadcaster().publish(RelayMessage::from(text)).await;
        }
        relay.shutdown().await.unwrap();

        let restarted = Relay::start(config).await;
        let sub = restarted.broadcaster().subscribe().await;
        let replay: Vec<&str> = sub.replay.iter().map(RelayMessage::as_str).collect();

        assert_eq!(replay, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_start_with_corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"garbage").unwrap();

        let relay = Relay::start(RelayConfig::default().cache_path(&path)).await;

        assert!(relay.broadcaster().cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_shutdown_reports_persist_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cache.json");

        let relay = Relay::start(RelayConfig::default().cache_path(&path)).await;
        relay.broadcaster().publish(RelayMessage::from("x")).await;

        tokio_test::assert_err!(relay.shutdown().await);
    }
}
