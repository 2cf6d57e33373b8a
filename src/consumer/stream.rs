//! Ingestion loop
//!
//! Pulls batches from a [`RecordSource`] and publishes one message per record
//! in arrival order. The loop runs on a single task, so publishes are never
//! concurrent with each other.

use std::sync::Arc;

use crate::error::SourceError;
use crate::relay::{Broadcaster, RelayMessage};

use super::source::RecordSource;

/// Feeds a record source into the broadcaster
pub struct StreamConsumer<S> {
    source: S,
    broadcaster: Arc<Broadcaster>,
    relayed: u64,
}

impl<S: RecordSource> StreamConsumer<S> {
    /// Create a consumer for an already connected source
    pub fn new(source: S, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            source,
            broadcaster,
            relayed: 0,
        }
    }

    /// Total records relayed so far
    pub fn relayed(&self) -> u64 {
        self.relayed
    }

    /// Publish the notice that the source is connected
    pub async fn announce(&self) {
        let notice = RelayMessage::connection_established();
        tracing::info!("{}", notice);
        self.broadcaster.publish(notice).await;
    }

    /// Fetch one batch and publish its records
    ///
    /// Returns the number of records relayed.
    pub async fn poll(&mut self) -> Result<usize, SourceError> {
        let batch = self.source.poll().await?;

        for record in &batch {
            let message = record.to_message();
            tracing::debug!(
                topic = %record.topic,
                partition = record.partition,
                offset = record.offset,
                "{}",
                message
            );
            self.broadcaster.publish(message).await;
        }

        self.relayed += batch.len() as u64;
        Ok(batch.len())
    }

    /// Announce the connection, then relay batches until the source fails
    ///
    /// Only returns on a source error. The caller is expected to treat it as
    /// fatal; nothing here retries.
    pub async fn run(mut self) -> Result<(), SourceError> {
        self.announce().await;

        loop {
            if let Err(e) = self.poll().await {
                tracing::error!(error = %e, relayed = self.relayed, "Stream source failed");
                return Err(e);
            }
        }
    }
}
