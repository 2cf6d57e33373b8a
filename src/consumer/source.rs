//! Record source abstraction
//!
//! The relay only needs "give me the next batch". Broker details such as
//! authentication and partition assignment stay behind this trait.

use std::collections::VecDeque;
use std::future::Future;

use crate::error::SourceError;

use super::record::Record;

/// A source of stream records
pub trait RecordSource: Send {
    /// Wait for the next batch of records
    ///
    /// Records within a batch are in arrival order. Any error is fatal to the
    /// consumer.
    fn poll(&mut self) -> impl Future<Output = Result<Vec<Record>, SourceError>> + Send;
}

/// A source that replays a fixed list of batches
///
/// Once the batches run out every poll returns [`SourceError::Closed`].
/// Useful for tests and for feeding the relay from a recorded capture.
#[derive(Debug, Default)]
pub struct ReplaySource {
    batches: VecDeque<Result<Vec<Record>, SourceError>>,
}

impl ReplaySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch of records
    pub fn batch(mut self, records: Vec<Record>) -> Self {
        self.batches.push_back(Ok(records));
        self
    }

    /// Queue a failed fetch
    pub fn error(mut self, error: SourceError) -> Self {
        self.batches.push_back(Err(error));
        self
    }

    /// Number of queued batches and errors
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl RecordSource for ReplaySource {
    async fn poll(&mut self) -> Result<Vec<Record>, SourceError> {
        self.batches.pop_front().unwrap_or(Err(SourceError::Closed))
    }
}
