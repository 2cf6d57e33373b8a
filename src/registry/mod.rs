//! Subscriber registry
//!
//! Every live WebSocket connection is represented by a [`SubscriberHandle`]:
//! the sending half of a bounded queue drained by that connection's writer
//! task. Fan-out only ever enqueues, so a slow connection cannot hold up the
//! broadcast path; a connection whose queue fills up is dropped instead.
//!
//! ```text
//!                 Arc<Broadcaster>
//!            ┌──────────────────────────┐
//!            │ registry: HashMap<Id,    │
//!            │   SubscriberHandle {     │
//!            │     tx: mpsc::Sender,    │
//!            │   }                      │
//!            │ >                        │
//!            └────────────┬─────────────┘
//!                         │ try_send()
//!         ┌───────────────┼───────────────┐
//!         ▼               ▼               ▼
//!    [writer task]   [writer task]   [writer task]
//!     rx.recv()       rx.recv()       rx.recv()
//!         │               │               │
//!         └──► WebSocket text frame ──► client
//! ```

pub mod error;
pub mod store;
pub mod subscriber;

pub use error::SendError;
pub use store::SubscriberRegistry;
pub use subscriber::{SubscriberHandle, SubscriberId, DEFAULT_QUEUE_CAPACITY};
