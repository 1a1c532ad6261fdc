//! TCP listener and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::GateError;

use super::{router, AppState, RequestMetrics};

/// HTTP server bound to a TCP address.
pub struct HttpServer {
    listener: TcpListener,
    app: Router,
    metrics: Arc<RequestMetrics>,
}

impl HttpServer {
    /// Bind to the configured address.
    ///
    /// # Arguments
    ///
    /// * `config` - Listen address and request timeout
    /// * `state` - Issuer, validator and resource shared by all handlers
    ///
    /// # Errors
    ///
    /// Returns `GateError::Config` if `bind_addr` does not parse, or
    /// `GateError::Server` if the address cannot be bound.
    pub async fn bind(config: &ServerConfig, state: AppState) -> Result<Self, GateError> {
        let addr = config.socket_addr()?;
        Self::bind_addr(addr, config, state).await
    }

    /// Bind to an explicit address, e.g. `127.0.0.1:0` in tests.
    pub async fn bind_addr(
        addr: SocketAddr,
        config: &ServerConfig,
        state: AppState,
    ) -> Result<Self, GateError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GateError::Server {
                message: format!("Failed to bind to {}: {}", addr, e),
            })?;

        let metrics = Arc::clone(&state.metrics);
        let app = router(state, config.request_timeout());

        info!(addr = %addr, "HTTP listener bound");

        Ok(Self {
            listener,
            app,
            metrics,
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, GateError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Serve until `shutdown` is notified, then drain in-flight requests.
    pub async fn run(self, shutdown: Arc<Notify>) -> Result<(), GateError> {
        info!("Server Started");

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { shutdown.notified().await })
            .await
            .map_err(|e| GateError::Server {
                message: format!("HTTP server failed: {}", e),
            })?;

        info!(
            issued = self.metrics.issued(),
            accepted = self.metrics.accepted(),
            rejected = self.metrics.rejected(),
            "HTTP server stopped"
        );
        Ok(())
    }
}
