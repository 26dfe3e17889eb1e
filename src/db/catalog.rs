//! Table catalog lookups against `information_schema`.

use crate::error::DbResult;
use crate::models::TableInfo;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::Row;
use std::collections::HashSet;
use tracing::{debug, warn};

mod queries {
    // CONVERT(... USING utf8mb4): some servers report information_schema text
    // columns as VARBINARY.
    pub const LIST_TABLES: &str = r#"
        SELECT
            CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
            CONVERT(TABLE_TYPE USING utf8mb4) AS TABLE_TYPE,
            CONVERT(TABLE_COMMENT USING utf8mb4) AS TABLE_COMMENT,
            CREATE_TIME
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = DATABASE()
        "#;

    pub const BINARY_COLUMNS: &str = r#"
        SELECT CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
          AND LOWER(DATA_TYPE) IN
            ('binary', 'varbinary', 'tinyblob', 'blob', 'mediumblob', 'longblob', 'bit', 'bson')
        "#;

    pub const TABLE_EXISTS: &str = r#"
        SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
        "#;
}

/// List the tables of the connection's current schema, in server order.
pub async fn list_tables(conn: &mut MySqlConnection) -> DbResult<Vec<TableInfo>> {
    let rows = sqlx::query(queries::LIST_TABLES).fetch_all(&mut *conn).await?;

    let tables = rows
        .iter()
        .filter_map(|row| {
            let name = get_string(row, "TABLE_NAME");
            if name.is_empty() {
                return None;
            }
            let created_at = get_create_time(row, &name);
            Some(TableInfo {
                name,
                table_type: get_string(row, "TABLE_TYPE"),
                comment: get_optional_string(row, "TABLE_COMMENT"),
                created_at,
            })
        })
        .collect::<Vec<_>>();

    debug!(count = tables.len(), "Listed tables");
    Ok(tables)
}

/// True if `table` exists in the connection's current schema.
pub async fn table_exists(conn: &mut MySqlConnection, table: &str) -> DbResult<bool> {
    let row = sqlx::query(queries::TABLE_EXISTS)
        .bind(table)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

/// Columns of `table` declared with a binary data type.
///
/// A string column with a `_bin` collation carries the same wire flag as a
/// true binary column, so the declared type decides.
pub async fn binary_columns(
    conn: &mut MySqlConnection,
    table: &str,
) -> DbResult<HashSet<String>> {
    let rows = sqlx::query(queries::BINARY_COLUMNS)
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .iter()
        .map(|row| get_string(row, "COLUMN_NAME"))
        .filter(|name| !name.is_empty())
        .collect())
}

/// Quote a table name as a backtick identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// CREATE_TIME is DATETIME on some servers and TIMESTAMP on others.
fn get_create_time(row: &MySqlRow, table: &str) -> Option<NaiveDateTime> {
    match row.try_get::<Option<NaiveDateTime>, _>("CREATE_TIME") {
        Ok(created) => created,
        Err(_) => match row.try_get::<Option<DateTime<Utc>>, _>("CREATE_TIME") {
            Ok(created) => created.map(|t| t.naive_utc()),
            Err(e) => {
                warn!(table = %table, error = %e, "Failed to decode CREATE_TIME");
                None
            }
        },
    }
}

/// Safely get a string from a MySQL row.
/// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
fn get_string(row: &MySqlRow, column: &str) -> String {
    get_optional_string(row, column).unwrap_or_default()
}

fn get_optional_string(row: &MySqlRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .or_else(|| {
            row.try_get::<Option<Vec<u8>>, _>(column)
                .ok()
                .flatten()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
}
