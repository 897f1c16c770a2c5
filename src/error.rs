//! Error types for fixture materialization, reconciliation, and loading.

use thiserror::Error;

use crate::{driver::DriverError, variables::VariableError};

/// Main error type for engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Column shape could not be derived for a table or query
    #[error("Schema error: {0}")]
    Schema(String),

    /// Fixture references a column the target does not define (strict mode)
    #[error("Field {field} from scenario data is not found in target table or view")]
    SchemaMismatch { field: String },

    /// Column type has no codec
    #[error("Unsupported datatype {vendor_type} for field {column}")]
    UnsupportedType { column: String, vendor_type: String },

    /// Fixture string does not parse as the column's type
    #[error("Cannot convert '{value}' to {column_type} for field {column}: {reason}")]
    ValueConversion {
        column: String,
        value: String,
        column_type: String,
        reason: String,
    },

    /// Variable reference could not be resolved
    #[error("Error getting variable value for field {column}: {source}")]
    ValueResolution {
        column: String,
        #[source]
        source: VariableError,
    },

    /// Connection could not be opened or configured
    #[error("Connection error for {target}: {message}")]
    Connection { target: String, message: String },

    /// Default catalog/schema selection failed with no fallback left
    #[error("Could not set default catalog or schema to {schema} for {target}: {message}")]
    SchemaSet {
        target: String,
        schema: String,
        message: String,
    },

    /// Batch insert failed; carries the driver's chained diagnostic when it has one
    #[error("Error inserting data into {table}: {message}{}", diagnostic_suffix(.diagnostic))]
    BatchWrite {
        table: String,
        message: String,
        diagnostic: Option<String>,
    },

    /// No target with this name is configured
    #[error("Unknown database target '{0}'")]
    UnknownTarget(String),

    /// Statement or query failure outside the write path
    #[error("Database error: {0}")]
    Driver(#[from] DriverError),
}

fn diagnostic_suffix(diagnostic: &Option<String>) -> String {
    match diagnostic {
        Some(next) => format!(" (next exception: {next})"),
        None => String::new(),
    }
}

impl EngineError {
    pub fn conversion(
        column: impl Into<String>,
        value: impl Into<String>,
        column_type: impl ToString,
        reason: impl ToString,
    ) -> Self {
        EngineError::ValueConversion {
            column: column.into(),
            value: value.into(),
            column_type: column_type.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn connection(target: impl Into<String>, message: impl ToString) -> Self {
        EngineError::Connection {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Format error with the full source chain, one cause per line.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {self}\n");
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {depth}: {err}"));
            source = err.source();
            depth += 1;
        }
        output
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_write_message_carries_chained_diagnostic() {
        let err = EngineError::BatchWrite {
            table: "people".to_string(),
            message: "batch entry 2 failed".to_string(),
            diagnostic: Some("UNIQUE constraint failed: people.id".to_string()),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("batch entry 2 failed"));
        assert!(rendered.contains("UNIQUE constraint failed: people.id"));
    }

    #[test]
    fn batch_write_message_without_diagnostic_has_no_suffix() {
        let err = EngineError::BatchWrite {
            table: "people".to_string(),
            message: "boom".to_string(),
            diagnostic: None,
        };
        assert_eq!(err.to_string(), "Error inserting data into people: boom");
    }

    #[test]
    fn format_detailed_walks_variable_source() {
        let err = EngineError::ValueResolution {
            column: "id".to_string(),
            source: VariableError::Unknown("$missing".to_string()),
        };
        let detailed = err.format_detailed();
        assert!(detailed.contains("field id"));
        assert!(detailed.contains("Caused by"));
        assert!(detailed.contains("$missing"));
    }
}
