//! Query-related data models.
//!
//! This module defines types for SQL query requests and results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One result row: column name → JSON value, in column order.
pub type Row = serde_json::Map<String, JsonValue>;

/// Request to execute an arbitrary SQL statement.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryRequest {
    /// SQL statement to execute. Placeholders (%s, %(name)s or ?) are bound from `parameters`.
    pub query: String,
    /// Optional parameters: an object for named placeholders (%(name)s) or
    /// positional placeholders in key order, or an array for positional placeholders.
    #[serde(default)]
    pub parameters: Option<QueryParameters>,
}

impl QueryRequest {
    /// Create a request without parameters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: None,
        }
    }

    /// Attach parameters to this request.
    pub fn with_parameters(mut self, parameters: QueryParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Parameters, or None when absent or empty.
    pub fn effective_parameters(&self) -> Option<&QueryParameters> {
        self.parameters.as_ref().filter(|p| !p.is_empty())
    }
}

/// Caller-supplied parameter set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParameters {
    /// Ordered name → value mapping
    Named(serde_json::Map<String, JsonValue>),
    /// Positional values
    Positional(Vec<JsonValue>),
}

impl QueryParameters {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Named(map) => map.is_empty(),
            Self::Positional(values) => values.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Named(map) => map.len(),
            Self::Positional(values) => values.len(),
        }
    }
}

/// A parameter value ready to be bound by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer value
    Int(i64),
    /// Unsigned integer too large for i64
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Nested array or object, bound as JSON
    Json(JsonValue),
}

impl From<&JsonValue> for QueryParam {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::String(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Json(value.clone()),
        }
    }
}

/// Outcome of a statement: rows for data-returning statements, a count otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryResult {
    Rows { data: Vec<Row> },
    Affected { affected_rows: u64 },
}

impl QueryResult {
    pub fn rows(data: Vec<Row>) -> Self {
        Self::Rows { data }
    }

    pub fn affected(affected_rows: u64) -> Self {
        Self::Affected { affected_rows }
    }

    /// Number of rows returned, or affected.
    pub fn row_count(&self) -> u64 {
        match self {
            Self::Rows { data } => data.len() as u64,
            Self::Affected { affected_rows } => *affected_rows,
        }
    }
}
