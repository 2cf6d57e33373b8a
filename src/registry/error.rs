//! Registry error types

use thiserror::Error;

/// Why a message could not be handed to a subscriber
///
/// Either way the subscriber is dropped from the registry. These never leave
/// the broadcast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The subscriber's outbound queue is full (it is not keeping up)
    #[error("subscriber queue full")]
    QueueFull,

    /// The subscriber's connection has gone away
    #[error("subscriber disconnected")]
    Disconnected,
}
