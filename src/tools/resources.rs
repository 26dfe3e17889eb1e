//! Table resource operations.
//!
//! Listing maps each table of the current schema to a [`Resource`]; reading
//! returns every row of one table.

use crate::db::{ConnectionFactory, catalog, executor};
use crate::error::DbResult;
use crate::models::{Resource, Row};
use std::sync::Arc;
use tracing::info;

/// Handler for listing and reading table resources.
#[derive(Debug, Clone)]
pub struct ResourceToolHandler {
    factory: Arc<ConnectionFactory>,
}

impl ResourceToolHandler {
    pub fn new(factory: Arc<ConnectionFactory>) -> Self {
        Self { factory }
    }

    /// One resource per table visible in the current schema.
    pub async fn list_resources(&self) -> DbResult<Vec<Resource>> {
        let tables = self
            .factory
            .with_connection(|conn| Box::pin(async move { catalog::list_tables(conn).await }))
            .await?;

        info!(count = tables.len(), "Listed table resources");
        Ok(tables.into_iter().map(Resource::from).collect())
    }

    /// All rows of `table`. Fails with not-found when the table is absent.
    pub async fn read_resource(&self, table: &str) -> DbResult<Vec<Row>> {
        let name = table.to_string();
        let rows = self
            .factory
            .with_connection(move |conn| {
                Box::pin(async move { executor::read_table(conn, &name).await })
            })
            .await?;

        info!(table = %table, row_count = rows.len(), "Read table resource");
        Ok(rows)
    }
}
