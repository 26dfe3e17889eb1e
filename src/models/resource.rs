//! Table resource models.

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Resource type reported for every table.
pub const RESOURCE_TYPE_TABLE: &str = "table";

/// One row of `information_schema.TABLES` for the current schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,
    /// e.g. "BASE TABLE", "VIEW"
    pub table_type: String,
    pub comment: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Adapter-level descriptor for a database table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Resource {
    /// Table name
    pub id: String,
    /// Always "table"
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: TableAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableAttributes {
    pub name: String,
    /// Declared table type, e.g. "BASE TABLE"
    #[serde(rename = "type")]
    pub table_type: String,
    pub comment: Option<String>,
    /// ISO-8601 creation time, null when the database does not track it
    pub created_at: Option<String>,
}

impl From<TableInfo> for Resource {
    fn from(table: TableInfo) -> Self {
        Self {
            id: table.name.clone(),
            kind: RESOURCE_TYPE_TABLE.to_string(),
            attributes: TableAttributes {
                name: table.name,
                table_type: table.table_type,
                comment: table.comment,
                created_at: table.created_at.map(|t| format_iso8601(&t)),
            },
        }
    }
}

/// Format a timestamp as ISO-8601 without timezone.
///
/// Fractional seconds are printed only when non-zero.
pub fn format_iso8601(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}
