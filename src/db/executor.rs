//! Query execution engine.
//!
//! Statements without parameters go over the text protocol verbatim, which
//! also accepts statements the server refuses to prepare. Parameterized
//! statements are prepared and bound through the driver.

use crate::db::catalog::{binary_columns, quote_identifier, table_exists};
use crate::db::params::bind_param;
use crate::db::statement::returns_rows;
use crate::db::types::{BinaryColumns, RowToJson};
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryResult, Row};
use futures_util::TryStreamExt;
use futures_util::stream::BoxStream;
use sqlx::{Either, Executor};
use sqlx::mysql::{MySqlConnection, MySqlQueryResult, MySqlRow};
use std::time::Instant;
use tracing::debug;

type ResultStream<'e> = BoxStream<'e, Result<Either<MySqlQueryResult, MySqlRow>, sqlx::Error>>;

/// Execute one statement and shape its outcome.
///
/// `params` must already be in `?` marker order. The result is rows when the
/// statement produced any or is a row-returning kind, otherwise the
/// affected-row count.
pub async fn execute(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[QueryParam],
) -> DbResult<QueryResult> {
    let start = Instant::now();

    debug!(sql = %sql, params = params.len(), "Executing query");

    let (rows, affected_rows) = if params.is_empty() {
        collect_results((&mut *conn).fetch_many(sql)).await?
    } else {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }
        collect_results((&mut *conn).fetch_many(query)).await?
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;

    if !rows.is_empty() || returns_rows(sql) {
        debug!(row_count = rows.len(), elapsed_ms, "Query returned rows");
        Ok(QueryResult::rows(rows))
    } else {
        debug!(affected_rows, elapsed_ms, "Statement executed");
        Ok(QueryResult::affected(affected_rows))
    }
}

/// Read every row of `table`, after checking it exists in the current schema.
pub async fn read_table(conn: &mut MySqlConnection, table: &str) -> DbResult<Vec<Row>> {
    let start = Instant::now();

    if !table_exists(&mut *conn, table).await? {
        return Err(DbError::not_found(table));
    }

    let declared = binary_columns(&mut *conn, table).await?;

    let sql = format!("SELECT * FROM {}", quote_identifier(table));
    let rows = (&mut *conn).fetch_all(sql.as_str()).await?;

    let binary = BinaryColumns::Declared(&declared);
    let data: Vec<Row> = rows.iter().map(|r| r.to_json_map(binary)).collect();

    debug!(
        table = %table,
        row_count = data.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Read table"
    );
    Ok(data)
}

/// Drain a result stream into converted rows and the summed affected count.
///
/// Ad-hoc result sets carry no declared types, so binary columns are inferred.
async fn collect_results(mut stream: ResultStream<'_>) -> DbResult<(Vec<Row>, u64)> {
    let mut rows = Vec::new();
    let mut affected_rows = 0u64;

    while let Some(item) = stream.try_next().await.map_err(DbError::from)? {
        match item {
            Either::Left(done) => affected_rows += done.rows_affected(),
            Either::Right(row) => rows.push(row.to_json_map(BinaryColumns::Inferred)),
        }
    }

    Ok((rows, affected_rows))
}
