//! Replay cache
//!
//! Keeps the last N relayed messages so late subscribers get recent context,
//! and mirrors them to a JSON file so the context survives a restart.
//!
//! The file is a convenience, not the system of record: the broker is. A
//! lost write only shortens the replay after the next restart.

pub mod replay;
pub mod store;

pub use replay::{ReplayCache, DEFAULT_CACHE_CAPACITY};
pub use store::{CacheStore, DEFAULT_CACHE_FILE};
