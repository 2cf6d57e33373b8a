//! Kafka source configuration

use std::fmt;

/// Default topic relayed
pub const DEFAULT_TOPIC: &str = "news_fake";

/// Default consumer group id
pub const DEFAULT_GROUP_ID: &str = "kafka-relay";

/// Default maximum records per batch
pub const DEFAULT_MAX_BATCH: usize = 500;

/// SASL/SCRAM credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// SASL username
    pub username: String,
    /// SASL password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Kafka consumer configuration
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap brokers
    pub brokers: String,

    /// Topic to consume
    pub topic: String,

    /// Consumer group id (offsets are never committed)
    pub group_id: String,

    /// SASL/SCRAM-SHA-256 over TLS when set; plaintext otherwise
    pub credentials: Option<Credentials>,

    /// Maximum records gathered into one batch
    pub max_batch: usize,
}

impl KafkaConfig {
    /// Create a config for `brokers` with default topic and group
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            topic: DEFAULT_TOPIC.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            credentials: None,
            max_batch: DEFAULT_MAX_BATCH,
        }
    }

    /// Set the topic
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the consumer group id
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Authenticate with SASL/SCRAM
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the maximum batch size (at least 1)
    pub fn max_batch(mut self, max: usize) -> Self {
        self.max_batch = max.max(1);
        self
    }
}
