//! Query execution tool.
//!
//! This module implements the `execute_query` operation shared by the MCP
//! tool and the `POST /query` route. Any statement is accepted.

use crate::db::{ConnectionFactory, executor, translate_placeholders};
use crate::error::DbResult;
use crate::models::{QueryParam, QueryRequest, QueryResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Handler for ad-hoc SQL execution.
#[derive(Debug, Clone)]
pub struct QueryToolHandler {
    factory: Arc<ConnectionFactory>,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    pub fn new(factory: Arc<ConnectionFactory>) -> Self {
        Self { factory }
    }

    /// Run the request's statement and return rows or an affected-row count.
    ///
    /// Placeholder mismatches are reported before a connection is opened.
    pub async fn execute(&self, request: QueryRequest) -> DbResult<QueryResult> {
        let start = Instant::now();

        let (sql, params): (String, Vec<QueryParam>) = match request.effective_parameters() {
            Some(parameters) => {
                let translated = translate_placeholders(&request.query, parameters)?;
                (translated.sql, translated.params)
            }
            None => (request.query, Vec::new()),
        };

        let result = self
            .factory
            .with_connection(move |conn| {
                Box::pin(async move { executor::execute(conn, &sql, &params).await })
            })
            .await?;

        info!(
            rows = result.row_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSettings;
    use crate::error::DbError;
    use crate::models::QueryParameters;
    use std::time::Duration;

    fn unreachable_handler() -> QueryToolHandler {
        let settings = DatabaseSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "root".to_string(),
            password: String::new(),
            database: None,
        };
        QueryToolHandler::new(Arc::new(ConnectionFactory::new(
            &settings,
            Duration::from_secs(2),
        )))
    }

    #[tokio::test]
    async fn test_placeholder_mismatch_reported_before_connecting() {
        let handler = unreachable_handler();
        let request = QueryRequest::new("SELECT %s, %s")
            .with_parameters(QueryParameters::Positional(vec![serde_json::json!(1)]));

        let err = handler.execute(request).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_database() {
        let handler = unreachable_handler();
        let err = handler
            .execute(QueryRequest::new("SELECT 1"))
            .await
            .unwrap_err();
        assert!(err.is_connection());
    }
}
