//! WebSocket server
//!
//! ```text
//!   GET /ws ──► upgrade ──► Broadcaster::subscribe
//!                              │
//!                 ┌────────────┴────────────┐
//!                 ▼                         ▼
//!           writer task               reader loop
//!      replay, then queue       (detects close, ignores data)
//! ```

mod connection;

pub mod config;
pub mod listener;

pub use config::ServerConfig;
pub use listener::RelayServer;
