//! Typed cell values and the string codec.
//!
//! [`encode()`] turns a fixture string into a typed [`Cell`] for a column and
//! [`decode()`] turns a cell read back from a row set into its canonical
//! string. The empty string and SQL NULL are the same thing in both
//! directions: `encode("")` yields `None` and `decode(&None)` yields `""`.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

use crate::{
    error::{EngineError, Result},
    schema::{ColumnDescriptor, ColumnType},
    variables::{VariableStore, is_variable_reference},
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Decimal(f64),
    Text(String),
    BigInteger(i64),
    Integer(i32),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Boolean(bool),
}

/// One cell of a materialized row; `None` is SQL NULL.
pub type Cell = Option<Value>;

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Decimal(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::BigInteger(i) => i.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::Time(t) => t.format(TIME_FORMAT).to_string(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_date(value: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
}

pub fn parse_time(value: &str) -> std::result::Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
}

/// Parse a full date-time, falling back to a bare date at midnight.
pub fn parse_timestamp(value: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    parse_date(value).map(|date| date.and_time(NaiveTime::default()))
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Convert a non-empty literal into a value of the given type.
pub fn parse_value(value: &str, ty: ColumnType) -> std::result::Result<Value, String> {
    let parsed = match ty {
        ColumnType::Decimal => Value::Decimal(value.parse().map_err(|e| format!("{e}"))?),
        ColumnType::Text | ColumnType::FixedText => Value::Text(value.to_string()),
        ColumnType::BigInteger => Value::BigInteger(value.parse().map_err(|e| format!("{e}"))?),
        ColumnType::Integer => Value::Integer(value.parse().map_err(|e| format!("{e}"))?),
        ColumnType::Date => Value::Date(parse_date(value).map_err(|e| format!("{e}"))?),
        ColumnType::Time => Value::Time(parse_time(value).map_err(|e| format!("{e}"))?),
        ColumnType::Timestamp => {
            Value::Timestamp(parse_timestamp(value).map_err(|e| format!("{e}"))?)
        }
        ColumnType::Boolean => Value::Boolean(
            parse_boolean(value).ok_or_else(|| "expected 'true' or 'false'".to_string())?,
        ),
    };
    Ok(parsed)
}

/// Write path: fixture string to typed cell.
///
/// Variable references are resolved first; conversion runs on the resolved
/// value.
pub fn encode(raw: &str, column: &ColumnDescriptor, variables: &dyn VariableStore) -> Result<Cell> {
    let resolved;
    let value = if is_variable_reference(raw) {
        resolved = variables
            .resolve(raw)
            .map_err(|source| EngineError::ValueResolution {
                column: column.name.clone(),
                source,
            })?;
        debug!(
            "Replaced variable {raw} with value {resolved} for field {}",
            column.name
        );
        resolved.as_str()
    } else {
        raw
    };

    if value.is_empty() {
        return Ok(None);
    }
    let ty = column
        .column_type
        .ok_or_else(|| EngineError::UnsupportedType {
            column: column.name.clone(),
            vendor_type: column.vendor_type.clone(),
        })?;
    parse_value(value, ty)
        .map(Some)
        .map_err(|reason| EngineError::conversion(&column.name, value, ty, reason))
}

/// Read path: typed cell to canonical string.
///
/// Fixed-width character columns are right-trimmed; everything else is
/// rendered as-is.
pub fn decode(cell: &Cell, column: &ColumnDescriptor) -> Result<String> {
    let Some(value) = cell else {
        return Ok(String::new());
    };
    let ty = column
        .column_type
        .ok_or_else(|| EngineError::UnsupportedType {
            column: column.name.clone(),
            vendor_type: column.vendor_type.clone(),
        })?;
    match (ty, value) {
        (ColumnType::FixedText, Value::Text(s)) => Ok(s.trim_end().to_string()),
        _ => Ok(value.as_display()),
    }
}
