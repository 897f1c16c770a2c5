//! Scenario variables referenced from fixture cells.
//!
//! A fixture cell that begins with [`VARIABLE_PREFIX`] is not a literal value
//! but a reference into a [`VariableStore`]; the codec resolves it before any
//! type conversion happens.

use std::collections::HashMap;

use thiserror::Error;

pub const VARIABLE_PREFIX: &str = "$";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariableError {
    #[error("variable {0} is not defined")]
    Unknown(String),
}

pub trait VariableStore {
    /// Resolve a full reference (prefix included) to its current value.
    fn resolve(&self, reference: &str) -> Result<String, VariableError>;
}

pub fn is_variable_reference(raw: &str) -> bool {
    raw.starts_with(VARIABLE_PREFIX)
}

/// Map-backed variable store keyed by bare variable name.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable. A leading prefix on `name` is ignored.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let key = name.strip_prefix(VARIABLE_PREFIX).unwrap_or(name);
        self.values.insert(key.to_string(), value.into());
    }
}

impl VariableStore for Variables {
    fn resolve(&self, reference: &str) -> Result<String, VariableError> {
        let key = reference.strip_prefix(VARIABLE_PREFIX).unwrap_or(reference);
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| VariableError::Unknown(reference.to_string()))
    }
}
