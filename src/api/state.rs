//! Shared application state

use crate::db::ConnectionFactory;
use crate::tools::{QueryToolHandler, ResourceToolHandler};
use std::sync::Arc;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub resources: ResourceToolHandler,
    pub queries: QueryToolHandler,
}

impl AppState {
    pub fn new(factory: Arc<ConnectionFactory>) -> Self {
        Self {
            resources: ResourceToolHandler::new(factory.clone()),
            queries: QueryToolHandler::new(factory),
        }
    }
}
