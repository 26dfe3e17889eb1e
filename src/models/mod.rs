//! Data models for the SingleStore MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod resource;

// Re-export commonly used types
pub use query::{QueryParam, QueryParameters, QueryRequest, QueryResult, Row};
pub use resource::{RESOURCE_TYPE_TABLE, Resource, TableAttributes, TableInfo};
