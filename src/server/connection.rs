//! Per-connection WebSocket handling
//!
//! Each upgraded socket is split. A writer task sends the replay and then
//! drains the subscriber queue; the connection task reads only to notice
//! that the peer went away. Whichever side finishes first ends the
//! connection and the subscriber is removed.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

use crate::registry::SubscriberId;
use crate::relay::{Broadcaster, RelayMessage, Subscription};
use crate::stats::StatsSnapshot;

/// State shared by the HTTP handlers
#[derive(Debug, Clone)]
pub(crate) struct ConnectionState {
    pub(crate) broadcaster: Arc<Broadcaster>,
    pub(crate) limiter: Option<Arc<Semaphore>>,
    pub(crate) max_message_size: usize,
}

/// `GET /ws`
pub(crate) async fn ws_handler(
    State(state): State<ConnectionState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            state.broadcaster.stats().upgrade_rejected();
            tracing::warn!(error = %rejection, "WebSocket upgrade rejected");
            return rejection.into_response();
        }
    };

    let permit = match &state.limiter {
        Some(sem) => match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                state.broadcaster.stats().upgrade_rejected();
                tracing::warn!("Connection rejected: limit reached");
                return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached")
                    .into_response();
            }
        },
        None => None,
    };

    let broadcaster = state.broadcaster;
    upgrade
        .max_message_size(state.max_message_size)
        .on_failed_upgrade(|error| {
            tracing::warn!(error = %error, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| handle_socket(socket, broadcaster, permit))
}

/// `GET /stats`
pub(crate) async fn stats_handler(State(state): State<ConnectionState>) -> Json<StatsSnapshot> {
    let broadcaster = &state.broadcaster;
    let subscribers = broadcaster.subscriber_count().await;
    let cached = broadcaster.cache().len().await;

    Json(broadcaster.stats().snapshot(subscribers, cached))
}

async fn handle_socket(
    socket: WebSocket,
    broadcaster: Arc<Broadcaster>,
    _permit: Option<OwnedSemaphorePermit>,
) {
    let stats = Arc::clone(broadcaster.stats());
    stats.connection_opened();

    let Subscription {
        id,
        replay,
        receiver,
    } = broadcaster.subscribe().await;

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(id, sink, replay, receiver));

    let reader = async {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Close(_)) => break,
                Ok(_) => {} // Inbound data is ignored
                Err(e) => {
                    tracing::debug!(subscriber = %id, error = %e, "WebSocket read error");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = reader => {
            writer.abort();
        }
        result = &mut writer => {
            if let Ok(Err(e)) = result {
                tracing::debug!(subscriber = %id, error = %e, "WebSocket write error");
            }
        }
    }

    broadcaster.unsubscribe(id).await;
    stats.connection_closed();
    tracing::debug!(subscriber = %id, "Connection closed");
}

/// Send the replay, then everything published to this subscriber
///
/// The queue closes when the broadcaster drops the subscriber, in which case
/// a Close frame is sent before returning.
async fn write_loop(
    id: SubscriberId,
    mut sink: SplitSink<WebSocket, Message>,
    replay: Vec<RelayMessage>,
    mut receiver: mpsc::Receiver<RelayMessage>,
) -> Result<(), axum::Error> {
    for message in &replay {
        sink.send(text_frame(message)).await?;
    }

    while let Some(message) = receiver.recv().await {
        sink.send(text_frame(&message)).await?;
    }

    tracing::debug!(subscriber = %id, "Subscriber queue closed");
    sink.send(Message::Close(None)).await?;
    Ok(())
}

fn text_frame(message: &RelayMessage) -> Message {
    Message::Text(message.as_str().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_frame() {
        let frame = text_frame(&RelayMessage::from("hello"));

        match frame {
            Message::Text(text) => assert_eq!(text.as_str(), "hello"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
