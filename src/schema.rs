//! Column descriptors and semantic type tags.
//!
//! This module owns [`ColumnType`] (the nine semantic types the codec knows)
//! and [`ColumnDescriptor`] (ordinal, name, resolved type, and the raw vendor
//! type it was resolved from).
//!
//! Vendor type names are resolved to a [`ColumnType`] exactly once, when a
//! descriptor is built during introspection. Per-cell conversion dispatches on
//! the resolved tag and never looks at the vendor name again; the vendor name
//! is kept only so that an unsupported column can be reported by what the
//! database called it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Decimal,
    Text,
    FixedText,
    BigInteger,
    Integer,
    Date,
    Time,
    Timestamp,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Decimal => "decimal",
            ColumnType::Text => "text",
            ColumnType::FixedText => "fixed_text",
            ColumnType::BigInteger => "big_integer",
            ColumnType::Integer => "integer",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Boolean => "boolean",
        }
    }

    /// Resolve a vendor type name (as reported by the driver) to a semantic tag.
    ///
    /// Length/precision suffixes such as `VARCHAR(20)` or `DECIMAL(18,4)` are
    /// ignored. Returns `None` for types the codec cannot handle.
    pub fn from_vendor(vendor_type: &str) -> Option<ColumnType> {
        let base = vendor_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        let resolved = match base.as_str() {
            "DECIMAL" | "NUMERIC" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" | "REAL" => {
                ColumnType::Decimal
            }
            "VARCHAR" | "NVARCHAR" | "VARCHAR2" | "NVARCHAR2" | "CHARACTER VARYING" | "TEXT"
            | "NTEXT" | "CLOB" | "NCLOB" | "LONGVARCHAR" | "LONGNVARCHAR" | "LONG VARCHAR"
            | "STRING" => ColumnType::Text,
            "CHAR" | "NCHAR" | "CHARACTER" | "BPCHAR" => ColumnType::FixedText,
            "BIGINT" | "INT8" => ColumnType::BigInteger,
            "INTEGER" | "INT" | "INT4" | "SMALLINT" | "INT2" | "TINYINT" | "MEDIUMINT" => {
                ColumnType::Integer
            }
            "DATE" => ColumnType::Date,
            "TIME" => ColumnType::Time,
            "TIMESTAMP" | "DATETIME" | "DATETIME2" | "SMALLDATETIME" => ColumnType::Timestamp,
            "BOOLEAN" | "BOOL" | "BIT" => ColumnType::Boolean,
            _ => return None,
        };
        Some(resolved)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of one result column, produced once per table or query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// 1-based position in the result.
    pub ordinal: usize,
    pub name: String,
    /// `None` when the vendor type has no codec.
    pub column_type: Option<ColumnType>,
    pub vendor_type: String,
}

impl ColumnDescriptor {
    pub fn new(ordinal: usize, name: impl Into<String>, vendor_type: impl Into<String>) -> Self {
        let vendor_type = vendor_type.into();
        Self {
            ordinal,
            name: name.into(),
            column_type: ColumnType::from_vendor(&vendor_type),
            vendor_type,
        }
    }

    /// Build a descriptor with an already-known semantic type.
    pub fn typed(ordinal: usize, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            ordinal,
            name: name.into(),
            column_type: Some(column_type),
            vendor_type: column_type.as_str().to_ascii_uppercase(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Case-insensitive lookup of a column's zero-based index.
pub fn position_of(columns: &[ColumnDescriptor], name: &str) -> Option<usize> {
    columns.iter().position(|column| column.matches(name))
}
