//! End-to-end relay behavior over a real socket

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;

use kafka_relay::cache::ReplayCache;
use kafka_relay::relay::{Broadcaster, RelayMessage};
use kafka_relay::server::{RelayServer, ServerConfig};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    addr: SocketAddr,
    broadcaster: Arc<Broadcaster>,
    _shutdown: oneshot::Sender<()>,
}

async fn start(config: ServerConfig) -> Harness {
    let broadcaster = Arc::new(Broadcaster::new(Arc::new(ReplayCache::new(50)), 64));
    let server = RelayServer::new(config, Arc::clone(&broadcaster));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    Harness {
        addr,
        broadcaster,
        _shutdown: tx,
    }
}

/// Minimal WebSocket client: handshake, then read unmasked text frames
struct WsClient {
    reader: BufReader<TcpStream>,
}

async fn connect(addr: SocketAddr) -> (String, WsClient) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = "GET /ws HTTP/1.1\r\n\
                   Host: localhost\r\n\
                   Upgrade: websocket\r\n\
                   Connection: Upgrade\r\n\
                   Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
                   Sec-WebSocket-Version: 13\r\n\r\n";
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut reader = BufReader::new(stream);
    let mut status = String::new();
    timeout(WAIT, reader.read_line(&mut status))
        .await
        .unwrap()
        .unwrap();

    // Skip the remaining headers
    loop {
        let mut line = String::new();
        timeout(WAIT, reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        if line == "\r\n" || line.is_empty() {
            break;
        }
    }

    (status, WsClient { reader })
}

impl WsClient {
    async fn next_text(&mut self) -> String {
        let mut header = [0u8; 2];
        timeout(WAIT, self.reader.read_exact(&mut header))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(header[0], 0x81, "expected a final text frame");
        assert_eq!(header[1] & 0x80, 0, "server frames are unmasked");
        let len = (header[1] & 0x7f) as usize;
        assert!(len < 126, "test messages use the short length form");

        let mut payload = vec![0u8; len];
        timeout(WAIT, self.reader.read_exact(&mut payload))
            .await
            .unwrap()
            .unwrap();
        String::from_utf8(payload).unwrap()
    }
}

async fn wait_for_subscribers(broadcaster: &Broadcaster, expected: usize) {
    timeout(WAIT, async {
        while broadcaster.subscriber_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_late_joiner_gets_replay_then_live() {
    let harness = start(ServerConfig::default()).await;
    harness.broadcaster.publish(RelayMessage::from("first")).await;
    harness.broadcaster.publish(RelayMessage::from("second")).await;

    let (status, mut client) = connect(harness.addr).await;
    assert!(status.starts_with("HTTP/1.1 101"), "{status}");

    harness.broadcaster.publish(RelayMessage::from("third")).await;

    assert_eq!(client.next_text().await, "first");
    assert_eq!(client.next_text().await, "second");
    assert_eq!(client.next_text().await, "third");
}

#[tokio::test]
async fn test_two_clients_receive_same_stream() {
    let harness = start(ServerConfig::default()).await;

    let (_, mut a) = connect(harness.addr).await;
    let (_, mut b) = connect(harness.addr).await;
    wait_for_subscribers(&harness.broadcaster, 2).await;

    harness.broadcaster.publish(RelayMessage::from("x")).await;
    harness.broadcaster.publish(RelayMessage::from("y")).await;

    for client in [&mut a, &mut b] {
        assert_eq!(client.next_text().await, "x");
        assert_eq!(client.next_text().await, "y");
    }
}

#[tokio::test]
async fn test_disconnect_removes_subscriber() {
    let harness = start(ServerConfig::default()).await;

    let (_, client) = connect(harness.addr).await;
    wait_for_subscribers(&harness.broadcaster, 1).await;

    drop(client);
    wait_for_subscribers(&harness.broadcaster, 0).await;

    // Publishing with nobody connected still feeds the cache
    assert_eq!(harness.broadcaster.publish(RelayMessage::from("z")).await, 0);
    assert_eq!(harness.broadcaster.cache().len().await, 1);
}

#[tokio::test]
async fn test_connection_limit() {
    let harness = start(ServerConfig::default().max_connections(1)).await;

    let (status, _first) = connect(harness.addr).await;
    assert!(status.starts_with("HTTP/1.1 101"), "{status}");

    let (status, _second) = connect(harness.addr).await;
    assert!(status.starts_with("HTTP/1.1 503"), "{status}");

    let snapshot = harness.broadcaster.stats().snapshot(0, 0);
    assert_eq!(snapshot.upgrades_rejected, 1);
}
