//! REST API front-end.
//!
//! Exposes the same operations as the MCP service over plain HTTP:
//! `GET /resources`, `GET /resources/{resource_id}`, `POST /query` and
//! `GET /health`.

pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Create the router with all REST routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Tables
        .route("/resources", get(handlers::list_resources))
        .route("/resources/{resource_id}", get(handlers::read_resource))
        // Ad-hoc SQL
        .route("/query", post(handlers::execute_query))
        // Health
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
