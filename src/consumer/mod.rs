//! Stream ingestion
//!
//! ```text
//!   Kafka topic
//!       │  poll (batch)
//!       ▼
//!   RecordSource ──► StreamConsumer ──► Record::to_message ──► Broadcaster::publish
//! ```
//!
//! [`KafkaSource`] is the production source (behind the `kafka` feature).
//! [`ReplaySource`] feeds canned batches for tests.

pub mod config;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod record;
pub mod source;
pub mod stream;

pub use config::{Credentials, KafkaConfig};
#[cfg(feature = "kafka")]
pub use kafka::KafkaSource;
pub use record::Record;
pub use source::{RecordSource, ReplaySource};
pub use stream::StreamConsumer;
