//! Stream records and their display format

use bytes::Bytes;

use crate::relay::RelayMessage;

/// One record read from the broker topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Topic name
    pub topic: String,
    /// Partition the record was read from
    pub partition: i32,
    /// Offset within the partition
    pub offset: i64,
    /// Record key (None if the producer sent no key)
    pub key: Option<Bytes>,
    /// Record value (None for a tombstone)
    pub value: Option<Bytes>,
}

impl Record {
    /// Create a record with no key or value
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key: None,
            value: None,
        }
    }

    /// Set the key
    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the value
    pub fn with_value(mut self, value: impl Into<Bytes>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Format the record as the message relayed to subscribers
    ///
    /// `Message consumed: topic: {topic} ({partition}|{offset}), key: {key}, value: {value}`
    ///
    /// A missing key or value prints as empty; invalid UTF-8 is replaced.
    pub fn to_message(&self) -> RelayMessage {
        let key = lossy(self.key.as_ref());
        let value = lossy(self.value.as_ref());

        RelayMessage::from(format!(
            "Message consumed: topic: {} ({}|{}), key: {}, value: {}",
            self.topic, self.partition, self.offset, key, value
        ))
    }
}

fn lossy(bytes: Option<&Bytes>) -> std::borrow::Cow<'_, str> {
    match bytes {
        Some(b) => String::from_utf8_lossy(b),
        None => std::borrow::Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let record = Record::new("news_fake", 0, 7).with_key("k").with_value("v");

        assert_eq!(
            record.to_message().as_str(),
            "Message consumed: topic: news_fake (0|7), key: k, value: v"
        );
    }

    #[test]
    fn test_format_without_key() {
        let record = Record::new("news_fake", 3, 1024).with_value(r#"{"title":"x"}"#);

        assert_eq!(
            record.to_message().as_str(),
            r#"Message consumed: topic: news_fake (3|1024), key: , value: {"title":"x"}"#
        );
    }

    #[test]
    fn test_format_tombstone() {
        let record = Record::new("t", 1, 2).with_key("k");

        assert_eq!(
            record.to_message().as_str(),
            "Message consumed: topic: t (1|2), key: k, value: "
        );
    }

    #[test]
    fn test_format_invalid_utf8() {
        let record = Record::new("t", 0, 0)
            .with_key(Bytes::from_static(&[0xff, b'k']))
            .with_value("v");

        assert_eq!(
            record.to_message().as_str(),
            "Message consumed: topic: t (0|0), key: \u{fffd}k, value: v"
        );
    }

    #[test]
    fn test_format_is_deterministic() {
        let record = Record::new("t", 0, 9).with_key("a").with_value("b");
        assert_eq!(record.to_message(), record.to_message());
    }
}
