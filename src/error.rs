//! Error types for the SingleStore MCP Server.
//!
//! Every failure is one of a small set of kinds. Each front-end translates
//! the kind into its own vocabulary: MCP error codes for the tool front-end,
//! HTTP status codes for the REST API.

use axum::http::StatusCode;
use thiserror::Error;

/// Fixed message returned to HTTP callers when the database is unreachable.
pub const CONNECTION_FAILED_DETAIL: &str = "Database connection failed";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("{message}")]
    Execution {
        message: String,
        /// MySQL error code or SQLSTATE, when the driver reports one
        code: Option<String>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a not-found error for a table name.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an execution error with an optional driver code.
    pub fn execution(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            code,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for failures that happened before a statement reached the database.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// HTTP status for this error on the `POST /query` route.
    ///
    /// Execution failures are the caller's SQL, so they map to 400 here.
    /// The resource routes use [`DbError::resource_status_code`] instead.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Connection { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Execution { .. } | Self::InvalidInput { .. } | Self::UnknownTool { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// HTTP status for this error on the `/resources` routes.
    pub fn resource_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to HTTP callers. Connection details stay in the logs.
    pub fn detail(&self) -> String {
        match self {
            Self::Connection { .. } => CONNECTION_FAILED_DETAIL.to_string(),
            other => other.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// Transport-level failures (I/O, TLS, protocol, bad configuration) count as
/// connection failures; everything else is reported as an execution failure
/// carrying the driver's message unchanged.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(msg.to_string()),
            sqlx::Error::Io(io_err) => DbError::connection(format!("I/O error: {}", io_err)),
            sqlx::Error::Tls(tls_err) => DbError::connection(format!("TLS error: {}", tls_err)),
            sqlx::Error::Protocol(msg) => DbError::connection(format!("Protocol error: {}", msg)),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                DbError::connection(err.to_string())
            }
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution(db_err.message(), code)
            }
            other => DbError::execution(other.to_string(), None),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Convert DbError to MCP ErrorData for semantic error categorization.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { .. } => rmcp::ErrorData::resource_not_found(err.to_string(), None),

            DbError::Execution { code, .. } => {
                let data = code
                    .as_ref()
                    .map(|c| serde_json::json!({ "code": c }));
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }
            DbError::InvalidInput { .. } | DbError::UnknownTool { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }

            DbError::Connection { .. } | DbError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("refused");
        assert!(err.to_string().contains("Connection failed"));
        assert_eq!(DbError::not_found("users").to_string(), "Resource not found: users");
        assert_eq!(DbError::unknown_tool("drop_all").to_string(), "Unknown tool: drop_all");
    }

    #[test]
    fn test_execution_error_keeps_driver_message() {
        let err = DbError::execution("Table 'db.nope' doesn't exist", Some("1146".to_string()));
        assert_eq!(err.to_string(), "Table 'db.nope' doesn't exist");
    }

    #[test]
    fn test_query_route_status_codes() {
        assert_eq!(
            DbError::connection("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DbError::execution("syntax", None).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DbError::invalid_input("missing").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_resource_route_status_codes() {
        assert_eq!(
            DbError::not_found("t").resource_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DbError::execution("boom", None).resource_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DbError::connection("x").resource_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_connection_detail_is_masked() {
        let err = DbError::connection("Access denied for user 'admin'@'10.0.0.1'");
        assert_eq!(err.detail(), CONNECTION_FAILED_DETAIL);
        assert!(err.is_connection());
    }

    #[test]
    fn test_sqlx_io_error_is_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: DbError = sqlx::Error::Io(io).into();
        assert!(err.is_connection());
    }

    #[test]
    fn test_sqlx_row_not_found_is_execution() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Execution { .. }));
    }

    // Tests for From<DbError> for rmcp::ErrorData

    #[test]
    fn test_not_found_maps_to_resource_not_found() {
        let mcp_err: rmcp::ErrorData = DbError::not_found("users").into();
        // resource_not_found uses -32002 in rmcp
        assert_eq!(mcp_err.code.0, -32002);
    }

    #[test]
    fn test_unknown_tool_maps_to_invalid_params() {
        let mcp_err: rmcp::ErrorData = DbError::unknown_tool("nope").into();
        assert_eq!(mcp_err.code.0, -32602);
        assert!(mcp_err.message.contains("Unknown tool: nope"));
    }

    #[test]
    fn test_execution_maps_to_invalid_params_with_code() {
        let err = DbError::execution("syntax error", Some("1064".to_string()));
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32602);
        let data = mcp_err.data.unwrap();
        assert_eq!(data["code"], "1064");
    }

    #[test]
    fn test_connection_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DbError::connection("refused").into();
        assert_eq!(mcp_err.code.0, -32603);
    }
}
