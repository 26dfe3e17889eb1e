//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::db::ConnectionFactory;
use crate::error::{DbError, DbResult};
use crate::mcp::SingleStoreService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::info;

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    factory: Arc<ConnectionFactory>,
}

impl StdioTransport {
    /// Create a new stdio transport opening connections through `factory`.
    pub fn new(factory: Arc<ConnectionFactory>) -> Self {
        Self { factory }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = SingleStoreService::new(self.factory.clone());

        // Create the stdio transport and run the service
        let running_service = service.serve(stdio()).await.map_err(|e| {
            DbError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stdio transport error");
                        return Err(DbError::internal(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received");
                true
            }
        };

        if shutdown_requested {
            // No connections outlive a request, so there is nothing to drain.
            // Exit directly: tokio::select! cannot interrupt blocking stdin reads.
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_stdio_transport_creation() {
        let config = Config::default();
        let factory = Arc::new(ConnectionFactory::new(
            &config.database_settings().unwrap(),
            config.connect_timeout_duration(),
        ));
        let transport = StdioTransport::new(factory);
        assert_eq!(transport.name(), "stdio");
    }
}
