//! HTTP transport: REST API plus Streamable HTTP MCP.
//!
//! The REST routes live at the root. The MCP service is mounted on the
//! configured endpoint (default `/mcp`) and uses SSE streaming responses.

use crate::api::{self, AppState};
use crate::db::ConnectionFactory;
use crate::error::{DbError, DbResult};
use crate::mcp::SingleStoreService;
use crate::transport::{Transport, wait_for_signal};
use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// HTTP transport implementation.
///
/// This transport provides:
/// - The REST API (`/resources`, `/query`, `/health`)
/// - HTTP endpoints for MCP protocol messages, with SSE streaming
/// - Session management for stateful MCP connections
pub struct HttpTransport {
    factory: Arc<ConnectionFactory>,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `factory` - Connection factory shared by all requests
    /// * `host` - Host address to bind to
    /// * `port` - Port to bind to
    /// * `endpoint` - MCP endpoint path (e.g., "/mcp")
    pub fn new(
        factory: Arc<ConnectionFactory>,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the MCP endpoint path.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the full application: REST routes with the MCP service mounted.
    pub fn router(&self) -> Router {
        let factory = self.factory.clone();

        // Each MCP session gets its own service instance over the shared factory
        let mcp_service = StreamableHttpService::new(
            move || Ok(SingleStoreService::new(factory.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        let app = api::create_router(AppState::new(self.factory.clone()));

        // Note: nest_service doesn't support root path "/", use fallback_service instead
        if self.endpoint == "/" {
            app.fallback_service(mcp_service)
        } else {
            app.nest_service(&self.endpoint, mcp_service)
        }
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting server with HTTP transport on {}", bind_addr);

        let app = self.router();

        // Create TCP listener
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            DbError::internal(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        info!(
            database = %self.factory.endpoint(),
            mcp_endpoint = %self.endpoint,
            "REST API and MCP endpoint ready"
        );

        // Graceful shutdown: SSE connections may keep the server alive indefinitely,
        // so we force exit after a timeout once shutdown signal is received
        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

        // Use a notify to coordinate shutdown timing
        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        // Create shutdown signal that triggers on SIGINT or SIGTERM
        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        // Race between: server completing normally vs forced timeout/second signal after shutdown
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(DbError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {
                // Timeout or second signal reached - server will be dropped
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn factory() -> Arc<ConnectionFactory> {
        let config = Config::default();
        Arc::new(ConnectionFactory::new(
            &config.database_settings().unwrap(),
            config.connect_timeout_duration(),
        ))
    }

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new(factory(), "127.0.0.1", 8080, "/mcp");
        assert_eq!(transport.name(), "http");
        assert_eq!(transport.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_http_transport_custom_endpoint() {
        let transport = HttpTransport::new(factory(), "127.0.0.1", 8080, "/custom/path");
        assert_eq!(transport.endpoint(), "/custom/path");
    }

    #[tokio::test]
    async fn test_router_builds_for_root_and_nested_endpoint() {
        let _nested = HttpTransport::new(factory(), "127.0.0.1", 8080, "/mcp").router();
        let _root = HttpTransport::new(factory(), "127.0.0.1", 8080, "/").router();
    }
}
