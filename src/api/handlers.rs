//! REST API handlers

use super::state::AppState;
use crate::error::DbError;
use crate::models::{QueryRequest, QueryResult, Resource, Row};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Log the full error and build the response with the given status.
fn error_response(err: DbError, status: StatusCode) -> ApiError {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), error = %err, "Request failed");
    } else {
        tracing::warn!(status = status.as_u16(), error = %err, "Request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            detail: err.detail(),
        }),
    )
}

fn resource_error(err: DbError) -> ApiError {
    let status = err.resource_status_code();
    error_response(err, status)
}

fn query_error(err: DbError) -> ApiError {
    let status = err.status_code();
    error_response(err, status)
}

/// Table rows wrapper
#[derive(Debug, Serialize)]
pub struct TableData {
    pub data: Vec<Row>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint. Does not touch the database.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// List all tables as resources
pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    state
        .resources
        .list_resources()
        .await
        .map(Json)
        .map_err(resource_error)
}

/// Read every row of one table
pub async fn read_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
) -> Result<Json<TableData>, ApiError> {
    state
        .resources
        .read_resource(&resource_id)
        .await
        .map(|data| Json(TableData { data }))
        .map_err(resource_error)
}

/// Execute an arbitrary SQL statement
pub async fn execute_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    state
        .queries
        .execute(request)
        .await
        .map(Json)
        .map_err(query_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CONNECTION_FAILED_DETAIL;

    #[test]
    fn test_connection_error_response_is_masked() {
        let (status, Json(body)) =
            resource_error(DbError::connection("Access denied for user 'root'"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.detail, CONNECTION_FAILED_DETAIL);
    }

    #[test]
    fn test_not_found_response() {
        let (status, Json(body)) = resource_error(DbError::not_found("ghost"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.detail, "Resource not found: ghost");
    }

    #[test]
    fn test_execution_error_status_differs_by_route() {
        let (status, _) = resource_error(DbError::execution("boom", None));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, Json(body)) = query_error(DbError::execution("You have an error", None));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.detail, "You have an error");
    }
}
