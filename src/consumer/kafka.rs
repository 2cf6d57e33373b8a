//! Kafka record source
//!
//! Consumption always starts from the earliest retained offset: offsets are
//! never committed, so every start re-reads the topic's retained history and
//! the replay cache ends up holding the newest records of that history.

use futures::FutureExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer as KafkaConsumer};
use rdkafka::message::Message;

use crate::error::SourceError;

use super::config::KafkaConfig;
use super::record::Record;
use super::source::RecordSource;

/// Record source backed by an rdkafka consumer
pub struct KafkaSource {
    consumer: KafkaConsumer,
    topic: String,
    max_batch: usize,
}

impl KafkaSource {
    /// Create the consumer and subscribe to the configured topic
    pub fn connect(config: &KafkaConfig) -> Result<Self, SourceError> {
        let consumer: KafkaConsumer = client_config(config)
            .create()
            .map_err(|e| SourceError::Connect(e.to_string()))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| SourceError::Connect(e.to_string()))?;

        tracing::info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            sasl = config.credentials.is_some(),
            "Kafka consumer subscribed"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
            max_batch: config.max_batch,
        })
    }

    /// Topic being consumed
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

fn client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", &config.brokers)
        .set("group.id", &config.group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "false")
        .set("enable.auto.offset.store", "false");

    if let Some(credentials) = &config.credentials {
        client
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanisms", "SCRAM-SHA-256")
            .set("sasl.username", &credentials.username)
            .set("sasl.password", &credentials.password);
    }

    client
}

fn to_record<M: Message>(message: &M) -> Record {
    Record {
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        key: message.key().map(bytes::Bytes::copy_from_slice),
        value: message.payload().map(bytes::Bytes::copy_from_slice),
    }
}

impl RecordSource for KafkaSource {
    /// Waits for one record, then takes whatever else is already buffered
    /// (up to `max_batch`) without waiting again.
    async fn poll(&mut self) -> Result<Vec<Record>, SourceError> {
        let first = self
            .consumer
            .recv()
            .await
            .map_err(|e| SourceError::Fetch(e.to_string()))?;
        let mut batch = vec![to_record(&first)];
        drop(first);

        while batch.len() < self.max_batch {
            match self.consumer.recv().now_or_never() {
                Some(Ok(message)) => batch.push(to_record(&message)),
                Some(Err(e)) => return Err(SourceError::Fetch(e.to_string())),
                None => break,
            }
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::Credentials;

    #[test]
    fn test_client_config_plaintext() {
        let config = KafkaConfig::new("localhost:9092");
        let client = client_config(&config);

        assert_eq!(client.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(client.get("auto.offset.reset"), Some("earliest"));
        assert_eq!(client.get("enable.auto.commit"), Some("false"));
        assert_eq!(client.get("security.protocol"), None);
    }

    #[test]
    fn test_client_config_scram() {
        let config =
            KafkaConfig::new("broker:9093").credentials(Credentials::new("relay", "secret"));
        let client = client_config(&config);

        assert_eq!(client.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(client.get("sasl.mechanisms"), Some("SCRAM-SHA-256"));
        assert_eq!(client.get("sasl.username"), Some("relay"));
        assert_eq!(client.get("sasl.password"), Some("secret"));
    }
}
