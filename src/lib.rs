//! SingleStore MCP Server Library
//!
//! A thin adapter exposing a SingleStore database's tables as resources and
//! arbitrary SQL as a tool, over MCP and over a REST API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::SingleStoreService;
