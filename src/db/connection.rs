//! Per-request connection management.
//!
//! There is no pool: every operation opens a fresh connection, uses it, and
//! closes it. [`ConnectionFactory::with_connection`] owns the lifecycle so no
//! caller can forget the close.

use crate::config::DatabaseSettings;
use crate::error::{DbError, DbResult};
use futures_util::future::BoxFuture;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Opens connections from immutable connect options.
///
/// Shared between requests behind an `Arc`; holds no connection itself.
#[derive(Clone)]
pub struct ConnectionFactory {
    options: MySqlConnectOptions,
    connect_timeout: Duration,
    /// host:port, for log lines
    endpoint: String,
}

impl ConnectionFactory {
    pub fn new(settings: &DatabaseSettings, connect_timeout: Duration) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .charset("utf8mb4");

        if let Some(database) = &settings.database {
            options = options.database(database);
        }

        Self {
            options,
            connect_timeout,
            endpoint: format!("{}:{}", settings.host, settings.port),
        }
    }

    /// The configured host:port.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open a new connection.
    ///
    /// Every failure here, including authentication errors reported by the
    /// server, is a connection failure.
    pub async fn connect(&self) -> DbResult<MySqlConnection> {
        let start = Instant::now();
        match timeout(self.connect_timeout, self.options.connect()).await {
            Ok(Ok(conn)) => {
                debug!(
                    endpoint = %self.endpoint,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Connected to database"
                );
                Ok(conn)
            }
            Ok(Err(e)) => Err(DbError::connection(e.to_string())),
            Err(_) => Err(DbError::connection(format!(
                "timed out after {}s connecting to {}",
                self.connect_timeout.as_secs(),
                self.endpoint
            ))),
        }
    }

    /// Run `op` on a fresh connection and close it afterwards.
    ///
    /// The connection is closed whether `op` succeeds or fails. If the
    /// returned future is dropped mid-flight, dropping the connection
    /// releases the socket.
    pub async fn with_connection<T, F>(&self, op: F) -> DbResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut MySqlConnection) -> BoxFuture<'c, DbResult<T>>,
    {
        let mut conn = self.connect().await.inspect_err(|e| {
            warn!(endpoint = %self.endpoint, error = %e, "Database connection failed");
        })?;

        let result = op(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!(endpoint = %self.endpoint, error = %e, "Failed to close connection cleanly");
        }

        result
    }
}

// MySqlConnectOptions' Debug includes the password.
impl std::fmt::Debug for ConnectionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFactory")
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(port: u16) -> DatabaseSettings {
        DatabaseSettings {
            host: "127.0.0.1".to_string(),
            port,
            user: "root".to_string(),
            password: "secret".to_string(),
            database: Some("app".to_string()),
        }
    }

    #[test]
    fn test_endpoint() {
        let factory = ConnectionFactory::new(&settings(3307), Duration::from_secs(5));
        assert_eq!(factory.endpoint(), "127.0.0.1:3307");
    }

    #[test]
    fn test_debug_does_not_leak_password() {
        let factory = ConnectionFactory::new(&settings(3306), Duration::from_secs(5));
        let debug = format!("{:?}", factory);
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connection_error() {
        // Port 1 on loopback refuses immediately
        let factory = ConnectionFactory::new(&settings(1), Duration::from_secs(2));
        let err = factory
            .with_connection(|_conn| Box::pin(async { Ok::<_, DbError>(()) }))
            .await
            .unwrap_err();
        assert!(err.is_connection());
    }
}
