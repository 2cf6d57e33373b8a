use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use kafka_relay::consumer::{Credentials, KafkaConfig, KafkaSource, StreamConsumer};
use kafka_relay::logging::{init_logging, LogFormat};
use kafka_relay::relay::{Relay, RelayConfig};
use kafka_relay::server::{RelayServer, ServerConfig};
use kafka_relay::Error;

/// How long the HTTP server gets to wind down after shutdown is requested
const SERVER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Relay a Kafka topic to WebSocket clients
#[derive(Parser, Debug)]
#[command(name = "kafka-relay")]
#[command(about = "Relay a Kafka topic to WebSocket clients with a persistent replay cache", long_about = None)]
struct Args {
    /// Kafka bootstrap brokers (comma-separated)
    #[arg(long, env = "KAFKA_BROKERS")]
    brokers: String,

    /// Topic to relay
    #[arg(long, env = "KAFKA_TOPIC", default_value = "news_fake")]
    topic: String,

    /// Consumer group id
    #[arg(long, env = "KAFKA_GROUP_ID", default_value = "kafka-relay")]
    group_id: String,

    /// SASL/SCRAM username (enables SASL_SSL together with --password)
    #[arg(long, env = "KAFKA_USERNAME")]
    username: Option<String>,

    /// SASL/SCRAM password
    #[arg(long, env = "KAFKA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// WebSocket listen address
    #[arg(long, env = "RELAY_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Replay cache file
    #[arg(long, env = "RELAY_CACHE_PATH", default_value = "cache.json")]
    cache_path: PathBuf,

    /// Number of recent messages replayed to new clients
    #[arg(long, env = "RELAY_CACHE_CAPACITY", default_value = "50")]
    cache_capacity: usize,

    /// Outbound queue length per client before it is disconnected
    #[arg(long, env = "RELAY_QUEUE_CAPACITY", default_value = "256")]
    queue_capacity: usize,

    /// Maximum concurrent WebSocket clients (0 = unlimited)
    #[arg(long, env = "RELAY_MAX_CONNECTIONS", default_value = "0")]
    max_connections: usize,

    /// Log filter directive (RUST_LOG overrides)
    #[arg(long, env = "RELAY_LOG", default_value = "info")]
    log: String,

    /// Log format: pretty, compact or json
    #[arg(long, env = "RELAY_LOG_FORMAT", default_value = "compact")]
    log_format: LogFormat,
}

impl Args {
    fn relay_config(&self) -> RelayConfig {
        RelayConfig::default()
            .cache_capacity(self.cache_capacity)
            .cache_path(&self.cache_path)
            .subscriber_queue_capacity(self.queue_capacity)
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig::with_addr(self.bind).max_connections(self.max_connections)
    }

    fn kafka_config(&self) -> Result<KafkaConfig, Error> {
        let config = KafkaConfig::new(&self.brokers)
            .topic(&self.topic)
            .group_id(&self.group_id);

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Ok(config.credentials(Credentials::new(username, password)))
            }
            (None, None) => Ok(config),
            _ => Err(Error::Config(
                "KAFKA_USERNAME and KAFKA_PASSWORD must be set together".to_string(),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log, args.log_format)?;

    info!("kafka-relay starting");

    let kafka_config = args.kafka_config()?;
    let relay = Relay::start(args.relay_config()).await;

    let source = match KafkaSource::connect(&kafka_config) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "Kafka connection failed");
            let _ = relay.shutdown().await;
            return Err(e).context("connecting to Kafka");
        }
    };

    let server = RelayServer::new(args.server_config(), Arc::clone(relay.broadcaster()));
    let listener = server
        .bind()
        .await
        .with_context(|| format!("binding {}", args.bind))?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server_task = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = shutdown_rx.await;
            })
            .await
    });
    let mut server_done = false;

    let consumer = StreamConsumer::new(source, Arc::clone(relay.broadcaster()));

    let outcome = tokio::select! {
        result = consumer.run() => result.context("Kafka consumer stopped"),
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                Ok(())
            }
            Err(e) => Err(e).context("listening for Ctrl-C"),
        },
        joined = &mut server_task => {
            server_done = true;
            match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("WebSocket server failed"),
                Err(e) => Err(e).context("WebSocket server task panicked"),
            }
        }
    };

    let _ = shutdown_tx.send(());
    if !server_done && tokio::time::timeout(SERVER_SHUTDOWN_GRACE, &mut server_task).await.is_err() {
        warn!("WebSocket server did not stop in time");
        server_task.abort();
    }

    // A failed final persist is logged by the relay and is not fatal
    let _ = relay.shutdown().await;

    if let Err(e) = &outcome {
        error!(error = %format!("{e:#}"), "kafka-relay exiting");
    }
    outcome
}
