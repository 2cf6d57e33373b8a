//! Kafka to WebSocket relay
//!
//! Consumes one Kafka topic and pushes every record, as a text frame, to all
//! connected WebSocket clients. The most recent messages are kept in a
//! bounded replay cache that is persisted to disk, so a client that connects
//! late (or after a restart) first receives that recent history and then the
//! live stream, with nothing missed or repeated in between.
//!
//! ```text
//!   Kafka ──► StreamConsumer ──► Broadcaster ──┬──► ReplayCache ──► cache.json
//!                                              │
//!                                              └──► subscriber queues ──► /ws clients
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kafka_relay::consumer::{KafkaConfig, KafkaSource, StreamConsumer};
//! use kafka_relay::relay::{Relay, RelayConfig};
//! use kafka_relay::server::{RelayServer, ServerConfig};
//!
//! # async fn run() -> kafka_relay::error::Result<()> {
//! let relay = Relay::start(RelayConfig::default()).await;
//! let server = RelayServer::new(ServerConfig::default(), relay.broadcaster().clone());
//! tokio::spawn(async move { server.run().await });
//!
//! let source = KafkaSource::connect(&KafkaConfig::new("localhost:9092"))?;
//! StreamConsumer::new(source, relay.broadcaster().clone()).run().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod consumer;
pub mod error;
pub mod logging;
pub mod registry;
pub mod relay;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
pub use relay::{Broadcaster, Relay, RelayConfig, RelayMessage};
pub use server::{RelayServer, ServerConfig};
