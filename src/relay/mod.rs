//! Relay core
//!
//! ```text
//!   StreamConsumer ──► Broadcaster::publish ──┬──► ReplayCache::append ──► persist task ──► cache.json
//!                                             │
//!                                             └──► SubscriberRegistry fan-out ──► per-subscriber queues
//!
//!   RelayServer ──► Broadcaster::subscribe ──► register + snapshot ──► replay, then live queue
//! ```

pub mod broadcaster;
pub mod config;
pub mod message;
pub mod service;

pub use broadcaster::{Broadcaster, Subscription};
pub use config::RelayConfig;
pub use message::{RelayMessage, CONNECTION_ESTABLISHED};
pub use service::Relay;
