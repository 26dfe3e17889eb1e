//! Parameter binding utilities for database queries.
//!
//! Callers write placeholders in the `%s` / `%(name)s` style (or plain `?`).
//! The driver only understands `?`, so the statement is rewritten and the
//! values are collected in marker order before binding. Values are never
//! spliced into SQL text.

use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryParameters};
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::types::Json;
use std::collections::HashSet;

/// A statement rewritten to `?` markers with its ordered bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

/// Rewrite caller placeholders to `?` markers and collect the bind values.
///
/// Placeholders inside quoted strings, quoted identifiers and comments are
/// left alone. `%%` becomes a literal `%`; any other `%x` is copied as is.
pub fn translate_placeholders(
    sql: &str,
    parameters: &QueryParameters,
) -> DbResult<TranslatedQuery> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut binder = Binder::new(parameters);

    // `seg` marks the start of text not yet copied to `out`. It only ever
    // lands on ASCII bytes, so slicing stays on char boundaries.
    let mut seg = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            q @ (b'\'' | b'"' | b'`') => i = skip_quoted(bytes, i, q),
            b'#' => i = skip_line(bytes, i),
            b'-' if is_line_comment(bytes, i) => i = skip_line(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'?' => {
                out.push_str(&sql[seg..i]);
                binder.positional()?;
                out.push('?');
                i += 1;
                seg = i;
            }
            b'%' => match bytes.get(i + 1) {
                Some(b'%') => {
                    out.push_str(&sql[seg..i]);
                    out.push('%');
                    i += 2;
                    seg = i;
                }
                Some(b's') => {
                    out.push_str(&sql[seg..i]);
                    binder.positional()?;
                    out.push('?');
                    i += 2;
                    seg = i;
                }
                Some(b'(') => match named_placeholder_end(bytes, i) {
                    Some(close) => {
                        out.push_str(&sql[seg..i]);
                        binder.named(&sql[i + 2..close])?;
                        out.push('?');
                        // skip ")s"
                        i = close + 2;
                        seg = i;
                    }
                    None => i += 1,
                },
                _ => i += 1,
            },
            _ => i += 1,
        }
    }
    out.push_str(&sql[seg..]);

    Ok(TranslatedQuery {
        sql: out,
        params: binder.finish()?,
    })
}

/// For `%(name)s` starting at `start`, the index of the closing `)`.
fn named_placeholder_end(bytes: &[u8], start: usize) -> Option<usize> {
    let close = start + 2 + bytes[start + 2..].iter().position(|&b| b == b')')?;
    if close == start + 2 || bytes.get(close + 1) != Some(&b's') {
        return None;
    }
    Some(close)
}

/// Index just past the closing quote. Unterminated quotes run to the end.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && quote != b'`' {
            i += 2;
        } else if b == quote {
            // doubled quote is an escaped quote
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// MySQL only treats `--` as a comment when followed by whitespace.
fn is_line_comment(bytes: &[u8], i: usize) -> bool {
    bytes.get(i + 1) == Some(&b'-')
        && bytes
            .get(i + 2)
            .is_none_or(|b| b.is_ascii_whitespace())
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| start + p + 1)
        .unwrap_or(bytes.len())
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map(|p| start + 2 + p + 2)
        .unwrap_or(bytes.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Positional,
    Named,
}

/// Resolves placeholders to values in marker order.
struct Binder<'a> {
    parameters: &'a QueryParameters,
    style: Option<Style>,
    next: usize,
    used: HashSet<&'a str>,
    bound: Vec<QueryParam>,
}

impl<'a> Binder<'a> {
    fn new(parameters: &'a QueryParameters) -> Self {
        Self {
            parameters,
            style: None,
            next: 0,
            used: HashSet::new(),
            bound: Vec::new(),
        }
    }

    fn set_style(&mut self, style: Style) -> DbResult<()> {
        match self.style {
            Some(current) if current != style => Err(DbError::invalid_input(
                "Cannot mix named (%(name)s) and positional (%s, ?) placeholders",
            )),
            _ => {
                self.style = Some(style);
                Ok(())
            }
        }
    }

    fn positional(&mut self) -> DbResult<()> {
        self.set_style(Style::Positional)?;
        let value = match self.parameters {
            QueryParameters::Positional(values) => values.get(self.next),
            QueryParameters::Named(map) => map.values().nth(self.next),
        };
        let value = value.ok_or_else(|| {
            DbError::invalid_input(format!(
                "Not enough parameters: statement needs more than {} value(s)",
                self.parameters.len()
            ))
        })?;
        self.bound.push(QueryParam::from(value));
        self.next += 1;
        Ok(())
    }

    fn named(&mut self, name: &str) -> DbResult<()> {
        self.set_style(Style::Named)?;
        let QueryParameters::Named(map) = self.parameters else {
            return Err(DbError::invalid_input(format!(
                "Named placeholder %({name})s requires parameters given as an object"
            )));
        };
        let (key, value) = map
            .get_key_value(name)
            .ok_or_else(|| DbError::invalid_input(format!("Missing parameter: {name}")))?;
        self.used.insert(key.as_str());
        self.bound.push(QueryParam::from(value));
        Ok(())
    }

    fn finish(self) -> DbResult<Vec<QueryParam>> {
        match (self.style, self.parameters) {
            (Some(Style::Named), QueryParameters::Named(map)) => {
                if let Some(unused) = map.keys().find(|k| !self.used.contains(k.as_str())) {
                    return Err(DbError::invalid_input(format!(
                        "Unused parameter: {unused}"
                    )));
                }
            }
            _ => {
                let supplied = self.parameters.len();
                if self.next < supplied {
                    return Err(DbError::invalid_input(format!(
                        "{supplied} parameter(s) supplied but the statement uses {}",
                        self.next
                    )));
                }
            }
        }
        Ok(self.bound)
    }
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::UInt(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
        QueryParam::Json(v) => query.bind(Json(v)),
    }
}
