//! Column type mappings for SingleStore rows.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies the column's wire type name
//! 2. A per-category decoder extracts the value as JSON
//!
//! Binary columns are never shipped to callers. They are replaced by a
//! `<binary data length=N>` placeholder string.
//!
//! The driver reports `_bin`-collated strings with the same BINARY flag as
//! true binary columns. `BinaryColumns` settles which columns are binary:
//! either from the declared catalog types, or, for ad-hoc result sets, by
//! keeping flagged values that are valid UTF-8 as text.

use crate::models::Row as JsonRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};
use std::collections::HashSet;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Binary,
    Json,
    DateTime,
    Timestamp,
    Date,
    Time,
    Text,
}

/// Classify a MySQL/SingleStore type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal - check first as "numeric" must not fall through to float
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    // Binary family, including SingleStore's BSON. Checked before the
    // integer test so "tinyblob" is never mistaken for "tiny".
    if lower.contains("blob") || lower.contains("binary") || lower == "bit" || lower == "bson" {
        return TypeCategory::Binary;
    }

    // TINYINT(1) is reported as BOOLEAN but may hold any tiny integer
    if lower.contains("int") || lower == "year" || lower == "bool" || lower == "boolean" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    match lower.as_str() {
        "datetime" => TypeCategory::DateTime,
        "timestamp" => TypeCategory::Timestamp,
        "date" => TypeCategory::Date,
        "time" => TypeCategory::Time,
        // varchar, char, text, enum, set, geometry, ...
        _ => TypeCategory::Text,
    }
}

/// Which columns of a result set hold binary data.
#[derive(Debug, Clone, Copy)]
pub enum BinaryColumns<'a> {
    /// Follow the wire type. Flagged string values that decode as UTF-8 stay
    /// text; BIT is always binary.
    Inferred,
    /// Exactly these columns are binary, as declared in the catalog.
    Declared(&'a HashSet<String>),
}

impl BinaryColumns<'_> {
    /// Category for `column`, given the driver's type name.
    pub fn category(&self, column: &str, type_name: &str) -> TypeCategory {
        let category = categorize_type(type_name);
        match self {
            Self::Inferred => category,
            Self::Declared(binary) if binary.contains(column) => TypeCategory::Binary,
            Self::Declared(_) if category == TypeCategory::Binary => TypeCategory::Text,
            Self::Declared(_) => category,
        }
    }

    fn keeps_utf8_text(&self, type_name: &str) -> bool {
        matches!(self, Self::Inferred) && !type_name.eq_ignore_ascii_case("bit")
    }
}

/// Placeholder emitted in place of a binary value.
pub fn binary_placeholder(len: usize) -> String {
    format!("<binary data length={}>", len)
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    /// Column name → value, in column order.
    fn to_json_map(&self, binary: BinaryColumns<'_>) -> JsonRow;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self, binary: BinaryColumns<'_>) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let value = match binary.category(col.name(), type_name) {
                    TypeCategory::Binary => {
                        decode_binary(self, idx, binary.keeps_utf8_text(type_name))
                    }
                    category => decode_column(self, idx, category),
                };
                (col.name().to_string(), value)
            })
            .collect()
    }
}

// =============================================================================
// Decoders
// =============================================================================

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    if is_null(row, idx) {
        return JsonValue::Null;
    }

    match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => decode_binary(row, idx, false),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::DateTime => decode_datetime(row, idx),
        TypeCategory::Timestamp => decode_timestamp(row, idx),
        TypeCategory::Date => decode_date(row, idx),
        TypeCategory::Time => decode_time(row, idx),
        TypeCategory::Text => decode_text(row, idx),
    }
}

fn is_null(row: &MySqlRow, idx: usize) -> bool {
    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true)
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<RawDecimal>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.0),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!("Failed to decode DECIMAL: {:?}", e);
            decode_text(row, idx)
        }
    }
}

fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
    // Try signed types
    if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    // Try unsigned types
    if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    decode_text(row, idx)
}

fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return float_value(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return float_value(v as f64);
    }
    JsonValue::Null
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn decode_binary(row: &MySqlRow, idx: usize, keep_utf8_text: bool) -> JsonValue {
    // BIT is not a Vec<u8>-compatible type in sqlx; the raw bytes are still
    // length-prefixed on the wire, so skip the compatibility check.
    row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|bytes| binary_value(bytes, keep_utf8_text))
        .unwrap_or(JsonValue::Null)
}

fn binary_value(bytes: Vec<u8>, keep_utf8_text: bool) -> JsonValue {
    if !keep_utf8_text {
        return JsonValue::String(binary_placeholder(bytes.len()));
    }
    match String::from_utf8(bytes) {
        Ok(text) => JsonValue::String(text),
        Err(e) => JsonValue::String(binary_placeholder(e.as_bytes().len())),
    }
}

fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
    // MySQL JSON type should be decoded as serde_json::Value directly
    if let Ok(Some(v)) = row.try_get::<Option<JsonValue>, _>(idx) {
        return v;
    }
    match text_value(row, idx) {
        Some(s) => serde_json::from_str(&s).unwrap_or(JsonValue::String(s)),
        None => JsonValue::Null,
    }
}

fn decode_datetime(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<NaiveDateTime>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        // Zero dates ("0000-00-00 00:00:00") are not representable in chrono
        _ => decode_text(row, idx),
    }
}

fn decode_timestamp(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        _ => decode_datetime(row, idx),
    }
}

fn decode_date(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<NaiveDate>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
        _ => decode_text(row, idx),
    }
}

fn decode_time(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<NaiveTime>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%H:%M:%S%.f").to_string()),
        // TIME can exceed 24h or be negative
        _ => decode_text(row, idx),
    }
}

fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
    text_value(row, idx)
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}

/// Read a column as text, tolerating servers that report strings as VARBINARY.
fn text_value(row: &MySqlRow, idx: usize) -> Option<String> {
    row.try_get::<Option<String>, _>(idx)
        .ok()
        .flatten()
        .or_else(|| row.try_get_unchecked::<Option<String>, _>(idx).ok().flatten())
        .or_else(|| {
            row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)
                .ok()
                .flatten()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(categorize_type("INT"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIGINT UNSIGNED"), TypeCategory::Integer);
        assert_eq!(categorize_type("TINYINT"), TypeCategory::Integer);
        assert_eq!(categorize_type("MEDIUMINT"), TypeCategory::Integer);
        assert_eq!(categorize_type("YEAR"), TypeCategory::Integer);
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Decimal);
        assert_eq!(categorize_type("NUMERIC"), TypeCategory::Decimal);
    }

    #[test]
    fn test_categorize_type_binary_family() {
        for name in [
            "BLOB",
            "TINYBLOB",
            "MEDIUMBLOB",
            "LONGBLOB",
            "BINARY",
            "VARBINARY",
            "BIT",
            "BSON",
        ] {
            assert_eq!(categorize_type(name), TypeCategory::Binary, "{name}");
        }
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(categorize_type("DATETIME"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIMESTAMP"), TypeCategory::Timestamp);
        assert_eq!(categorize_type("DATE"), TypeCategory::Date);
        assert_eq!(categorize_type("TIME"), TypeCategory::Time);
    }

    #[test]
    fn test_categorize_type_text_fallback() {
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("TEXT"), TypeCategory::Text);
        assert_eq!(categorize_type("ENUM"), TypeCategory::Text);
        assert_eq!(categorize_type("JSON"), TypeCategory::Json);
        assert_eq!(categorize_type("DOUBLE"), TypeCategory::Float);
    }

    #[test]
    fn test_boolean_decodes_as_integer() {
        // TINYINT(1) may hold 2, which must not collapse to true
        assert_eq!(categorize_type("BOOLEAN"), TypeCategory::Integer);
        assert_eq!(categorize_type("BOOL"), TypeCategory::Integer);
    }

    #[test]
    fn test_declared_binary_columns() {
        let declared: HashSet<String> = ["avatar".to_string()].into();
        let binary = BinaryColumns::Declared(&declared);

        assert_eq!(binary.category("avatar", "BLOB"), TypeCategory::Binary);
        // utf8mb4_bin VARCHAR and TEXT carry the BINARY flag on the wire
        assert_eq!(binary.category("code", "VARBINARY"), TypeCategory::Text);
        assert_eq!(binary.category("notes", "BLOB"), TypeCategory::Text);
        assert_eq!(binary.category("id", "INT"), TypeCategory::Integer);
        assert!(!binary.keeps_utf8_text("BLOB"));
    }

    #[test]
    fn test_inferred_binary_columns() {
        let binary = BinaryColumns::Inferred;
        assert_eq!(binary.category("code", "VARBINARY"), TypeCategory::Binary);
        assert!(binary.keeps_utf8_text("VARBINARY"));
        assert!(!binary.keeps_utf8_text("BIT"));
    }

    #[test]
    fn test_binary_value() {
        assert_eq!(binary_value(b"abc".to_vec(), true), JsonValue::from("abc"));
        assert_eq!(
            binary_value(vec![0xDE, 0xAD, 0xBE, 0xEF], true),
            JsonValue::from("<binary data length=4>")
        );
        assert_eq!(
            binary_value(b"abc".to_vec(), false),
            JsonValue::from("<binary data length=3>")
        );
    }

    #[test]
    fn test_binary_placeholder() {
        assert_eq!(binary_placeholder(0), "<binary data length=0>");
        assert_eq!(binary_placeholder(1024), "<binary data length=1024>");
    }
}
