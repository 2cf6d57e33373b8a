//! Error types
//!
//! Each concern has its own error enum. Only [`SourceError`] is meant to
//! terminate the process; cache and subscriber errors are logged and
//! contained where they occur.

use std::io;

use thiserror::Error;

/// Result alias for crate-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure (binding the listener, serving connections)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream source failed; fatal for the relay
    #[error("stream source failed: {0}")]
    Source(#[from] SourceError),

    /// Replay cache failure
    #[error("replay cache error: {0}")]
    Cache(#[from] CacheError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors raised by a record source
///
/// Any of these ends the ingestion loop. There is no retry.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The client could not be created or could not subscribe
    #[error("failed to connect to stream source: {0}")]
    Connect(String),

    /// A fetch from the source failed
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The source has no more records and will never produce more
    #[error("stream source closed")]
    Closed,
}

/// Errors raised while loading or persisting the replay cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The persisted file exists but could not be read
    #[error("failed to read cache file: {0}")]
    Read(#[source] io::Error),

    /// The persisted file is not a JSON array of strings
    #[error("cache file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// The cache contents could not be serialized
    #[error("failed to encode cache: {0}")]
    Encode(#[source] serde_json::Error),

    /// Writing or renaming the cache file failed
    #[error("failed to persist cache: {0}")]
    Persist(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_converts() {
        let err: Error = SourceError::Fetch("broker down".into()).into();
        assert!(matches!(err, Error::Source(SourceError::Fetch(_))));
        assert_eq!(
            err.to_string(),
            "stream source failed: fetch failed: broker down"
        );
    }

    #[test]
    fn test_cache_error_display() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = CacheError::Persist(io_err);
        assert_eq!(err.to_string(), "failed to persist cache: denied");
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = io::Error::new(io::ErrorKind::AddrInUse, "in use").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
