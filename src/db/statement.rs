//! Statement classification.
//!
//! Decides whether a statement is expected to produce a result set, so an
//! empty SELECT still answers `{"data": []}` rather than an affected-row count.

use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

/// Leading keywords of statements that return rows.
const ROW_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "VALUES", "TABLE", "SHOW", "DESCRIBE", "DESC", "EXPLAIN",
];

/// True if the statement returns a result set.
///
/// Parsed with the MySQL dialect. SingleStore-specific syntax that the parser
/// rejects falls back to the leading keyword.
pub fn returns_rows(sql: &str) -> bool {
    match Parser::parse_sql(&MySqlDialect {}, sql) {
        Ok(statements) => match statements.last() {
            Some(stmt) if is_select_into(stmt) => false,
            Some(stmt) => is_row_statement(stmt) || leading_keyword_returns_rows(sql),
            None => false,
        },
        Err(e) => {
            tracing::debug!(error = %e, "Statement did not parse, classifying by keyword");
            leading_keyword_returns_rows(sql)
        }
    }
}

fn is_row_statement(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::Query(_) | Statement::Explain { .. } | Statement::ExplainTable { .. }
    )
}

/// `SELECT ... INTO @var` stores its result instead of returning it.
fn is_select_into(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(query) => {
            matches!(query.body.as_ref(), SetExpr::Select(select) if select.into.is_some())
        }
        _ => false,
    }
}

/// SHOW has many parsed forms; the keyword covers all of them.
fn leading_keyword_returns_rows(sql: &str) -> bool {
    leading_keyword(sql)
        .map(|kw| ROW_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(&kw)))
        .unwrap_or(false)
}

/// First word of the statement, skipping whitespace, comments and opening parens.
fn leading_keyword(sql: &str) -> Option<String> {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, tail)| tail).unwrap_or("");
        } else if rest.starts_with("--") || rest.starts_with('#') {
            rest = rest.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
        } else {
            break;
        }
    }

    let word: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    (!word.is_empty()).then_some(word)
}
