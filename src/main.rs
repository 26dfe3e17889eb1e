//! SingleStore MCP Server - Main entry point.
//!
//! This server exposes a SingleStore database's tables and ad-hoc SQL to AI
//! assistants over MCP (stdio or Streamable HTTP) and to plain HTTP clients
//! over a small REST API.

use clap::Parser;
use singlestore_mcp_server::config::{Config, TransportMode};
use singlestore_mcp_server::db::ConnectionFactory;
use singlestore_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout stays reserved for the stdio MCP channel.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting SingleStore MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let settings = config.database_settings().inspect_err(|e| {
        error!(error = %e, "Invalid database configuration");
    })?;

    info!(
        host = %settings.host,
        port = settings.port,
        user = %settings.user,
        database = settings.database.as_deref().unwrap_or("<none>"),
        "Database target configured"
    );

    // Connections are opened per request; nothing is dialled at startup
    let factory = Arc::new(ConnectionFactory::new(
        &settings,
        config.connect_timeout_duration(),
    ));

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(factory);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                factory,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
