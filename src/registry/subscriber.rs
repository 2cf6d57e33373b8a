//! Subscriber handle types

use std::fmt;

use tokio::sync::mpsc;

use crate::relay::RelayMessage;

use super::error::SendError;

/// Default capacity of a subscriber's outbound queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Process-unique subscriber identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Create an id from a raw value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Sending side of a subscriber's outbound queue
///
/// The connection's writer task owns the receiving side. Sends never block:
/// a full queue is reported as [`SendError::QueueFull`].
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    id: SubscriberId,
    tx: mpsc::Sender<RelayMessage>,
}

impl SubscriberHandle {
    /// Create a handle and the receiver for its queue
    ///
    /// A capacity of 0 is raised to 1.
    pub fn channel(id: SubscriberId, capacity: usize) -> (Self, mpsc::Receiver<RelayMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, tx }, rx)
    }

    /// Subscriber id
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Enqueue a message without waiting
    pub fn try_send(&self, message: RelayMessage) -> Result<(), SendError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::Disconnected,
        })
    }

    /// Whether the receiving side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(SubscriberId::new(7).to_string(), "sub-7");
    }

    #[tokio::test]
    async fn test_try_send_delivers_in_order() {
        let (handle, mut rx) = SubscriberHandle::channel(SubscriberId::new(1), 4);

        handle.try_send(RelayMessage::from("a")).unwrap();
        handle.try_send(RelayMessage::from("b")).unwrap();

        assert_eq!(rx.recv().await.unwrap().as_str(), "a");
        assert_eq!(rx.recv().await.unwrap().as_str(), "b");
    }

    #[test]
    fn test_try_send_full() {
        let (handle, _rx) = SubscriberHandle::channel(SubscriberId::new(1), 1);

        handle.try_send(RelayMessage::from("a")).unwrap();
        let result = handle.try_send(RelayMessage::from("b"));

        assert_eq!(result, Err(SendError::QueueFull));
    }

    #[test]
    fn test_try_send_disconnected() {
        let (handle, rx) = SubscriberHandle::channel(SubscriberId::new(1), 4);
        drop(rx);

        assert!(handle.is_closed());
        assert_eq!(
            handle.try_send(RelayMessage::from("a")),
            Err(SendError::Disconnected)
        );
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let (handle, _rx) = SubscriberHandle::channel(SubscriberId::new(1), 0);
        assert!(handle.try_send(RelayMessage::from("a")).is_ok());
    }
}
