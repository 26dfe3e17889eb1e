//! Database access layer.
//!
//! This module provides database access functionality:
//! - Per-request connections
//! - Table catalog lookups
//! - Query execution and placeholder binding
//! - Statement classification
//! - Type mappings

pub mod catalog;
pub mod connection;
pub mod executor;
pub mod params;
pub mod statement;
pub mod types;

pub use connection::ConnectionFactory;
pub use params::{TranslatedQuery, translate_placeholders};
