//! Relay message type
//!
//! A message is an opaque piece of text. It is cloned once per subscriber on
//! every publish, so it is reference counted rather than copied.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Notice published when the stream source is connected
pub const CONNECTION_ESTABLISHED: &str = "Kafka connection established";

/// An immutable text message relayed to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelayMessage(Arc<str>);

impl RelayMessage {
    /// Create a message from text
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// The startup notice sent once the stream source is connected
    pub fn connection_established() -> Self {
        Self::new(CONNECTION_ESTABLISHED)
    }

    /// Message text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the text in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RelayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RelayMessage {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for RelayMessage {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl AsRef<str> for RelayMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Persisted as a plain JSON string.
impl Serialize for RelayMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RelayMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
