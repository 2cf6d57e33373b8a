//! Statistics and metrics for the relay

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Relay-wide counters
///
/// Updated lock-free from the broadcast path and connection tasks.
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    messages_published: AtomicU64,
    messages_delivered: AtomicU64,
    subscribers_dropped: AtomicU64,
    connections_total: AtomicU64,
    connections_active: AtomicU64,
    upgrades_rejected: AtomicU64,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            messages_published: AtomicU64::new(0),
            messages_delivered: AtomicU64::new(0),
            subscribers_dropped: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            upgrades_rejected: AtomicU64::new(0),
        }
    }

    /// Record one publish and how many subscribers it reached
    pub fn record_publish(&self, delivered: usize) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        self.messages_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
    }

    /// Record subscribers removed after a failed send
    pub fn record_dropped(&self, count: usize) {
        self.subscribers_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a connection that completed the upgrade
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection ending
    pub fn connection_closed(&self) {
        // Never underflow, even if open/close calls are mismatched
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record an upgrade request that was refused
    pub fn upgrade_rejected(&self) {
        self.upgrades_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the counters were created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Copy the counters into a serializable snapshot
    ///
    /// `subscribers` and `cached_messages` come from the registry and cache,
    /// which own that state.
    pub fn snapshot(&self, subscribers: usize, cached_messages: usize) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            subscribers_dropped: self.subscribers_dropped.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            upgrades_rejected: self.upgrades_rejected.load(Ordering::Relaxed),
            subscribers,
            cached_messages,
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of [`RelayStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Seconds since start
    pub uptime_secs: u64,
    /// Messages published to the relay
    pub messages_published: u64,
    /// Per-subscriber deliveries (enqueued)
    pub messages_delivered: u64,
    /// Subscribers removed after a failed send
    pub subscribers_dropped: u64,
    /// Connections ever upgraded
    pub connections_total: u64,
    /// Connections currently open
    pub connections_active: u64,
    /// Upgrade requests refused
    pub upgrades_rejected: u64,
    /// Currently registered subscribers
    pub subscribers: usize,
    /// Messages in the replay cache
    pub cached_messages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_stats_new() {
        let snapshot = RelayStats::new().snapshot(0, 0);

        assert_eq!(snapshot.messages_published, 0);
        assert_eq!(snapshot.messages_delivered, 0);
        assert_eq!(snapshot.subscribers_dropped, 0);
        assert_eq!(snapshot.connections_total, 0);
        assert_eq!(snapshot.connections_active, 0);
        assert_eq!(snapshot.upgrades_rejected, 0);
    }

    #[test]
    fn test_record_publish() {
        let stats = RelayStats::new();

        stats.record_publish(3);
        stats.record_publish(0);

        let snapshot = stats.snapshot(3, 2);
        assert_eq!(snapshot.messages_published, 2);
        assert_eq!(snapshot.messages_delivered, 3);
        assert_eq!(snapshot.subscribers, 3);
        assert_eq!(snapshot.cached_messages, 2);
    }

    #[test]
    fn test_connection_counters() {
        let stats = RelayStats::new();

        stats.connection_opened();
        stats.connection_opened();
        stats.connection_closed();

        let snapshot = stats.snapshot(0, 0);
        assert_eq!(snapshot.connections_total, 2);
        assert_eq!(snapshot.connections_active, 1);
    }

    #[test]
    fn test_connection_closed_does_not_underflow() {
        let stats = RelayStats::new();

        stats.connection_closed();

        assert_eq!(stats.snapshot(0, 0).connections_active, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = RelayStats::new();
        stats.record_dropped(1);
        stats.upgrade_rejected();

        let json = serde_json::to_value(stats.snapshot(0, 5)).unwrap();
        assert_eq!(json["subscribers_dropped"], 1);
        assert_eq!(json["upgrades_rejected"], 1);
        assert_eq!(json["cached_messages"], 5);
    }
}
