//! WebSocket relay server
//!
//! Wires the upgrade endpoint and the stats endpoint into an axum router and
//! serves it until shutdown.

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::relay::Broadcaster;
use crate::server::config::{ServerConfig, DEFAULT_STATS_PATH};
use crate::server::connection::{stats_handler, ws_handler, ConnectionState};

/// Relay server
pub struct RelayServer {
    config: ServerConfig,
    broadcaster: Arc<Broadcaster>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl RelayServer {
    /// Create a new server that subscribes connections to `broadcaster`
    pub fn new(config: ServerConfig, broadcaster: Arc<Broadcaster>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            broadcaster,
            connection_semaphore,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router
    pub fn router(&self) -> Router {
        let state = ConnectionState {
            broadcaster: Arc::clone(&self.broadcaster),
            limiter: self.connection_semaphore.clone(),
            max_message_size: self.config.max_message_size,
        };

        Router::new()
            .route(&self.config.ws_path, get(ws_handler))
            .route(DEFAULT_STATS_PATH, get(stats_handler))
            .with_state(state)
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind(self.config.bind_addr).await?)
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Bind and run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, path = %self.config.ws_path, "WebSocket relay listening");
        tracing::warn!("Origin checks are disabled: WebSocket upgrades are accepted from any origin");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        Ok(())
    }
}
