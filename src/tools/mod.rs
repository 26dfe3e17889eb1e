//! Operation handlers shared by the MCP and HTTP front-ends.
//!
//! - `resources`: list tables as resources, read a table
//! - `query`: execute an arbitrary SQL statement

pub mod query;
pub mod resources;

pub use query::QueryToolHandler;
pub use resources::ResourceToolHandler;
