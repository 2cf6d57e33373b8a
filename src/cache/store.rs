//! Durable storage for the replay cache
//!
//! The cache is stored as a compact JSON array of strings. Writes go to a
//! sibling temp file which is then renamed over the target, so readers never
//! observe a half-written file.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::relay::RelayMessage;

/// Default cache file name
pub const DEFAULT_CACHE_FILE: &str = "cache.json";

/// File-backed store for cache snapshots
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Create a store writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the temp file used for atomic writes
    pub fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Read the persisted snapshot
    ///
    /// Returns `Ok(None)` when no file exists yet.
    pub async fn load(&self) -> Result<Option<Vec<RelayMessage>>, CacheError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Read(e)),
        };

        let messages = serde_json::from_slice(&data).map_err(CacheError::Corrupt)?;
        Ok(Some(messages))
    }

    /// Overwrite the persisted snapshot with `messages`
    pub async fn persist(&self, messages: &[RelayMessage]) -> Result<(), CacheError> {
        let data = serde_json::to_vec(messages).map_err(CacheError::Encode)?;
        let temp = self.temp_path();

        tokio::fs::write(&temp, &data)
            .await
            .map_err(CacheError::Persist)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(CacheError::Persist)?;

        tracing::trace!(
            path = %self.path.display(),
            entries = messages.len(),
            bytes = data.len(),
            "Cache persisted"
        );

        Ok(())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_FILE)
    }
}
