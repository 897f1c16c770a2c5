//! Materialized row sets.
//!
//! A [`RowSet`] is an ordered list of typed rows sharing one set of
//! [`ColumnDescriptor`]s. Every row holds exactly one [`Cell`] per column.

use crate::{
    data::{Cell, decode},
    error::{EngineError, Result},
    schema::{ColumnDescriptor, position_of},
};

pub type Row = Vec<Cell>;

#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
}

impl RowSet {
    /// An empty row set with the given shape.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a row set from already-typed rows. Fails if any row has the wrong width.
    pub fn with_rows(columns: Vec<ColumnDescriptor>, rows: Vec<Row>) -> Result<Self> {
        let mut set = Self::new(columns);
        for row in rows {
            set.push(row)?;
        }
        Ok(set)
    }

    pub fn push(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EngineError::Schema(format!(
                "Row has {} cell(s) but the row set defines {} column(s)",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        position_of(&self.columns, name)
    }

    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Decode every cell of the row at zero-based `index` to its string form.
    pub fn record_strings(&self, index: usize) -> Result<Vec<String>> {
        let row = self.rows.get(index).ok_or_else(|| {
            EngineError::Schema(format!(
                "Row {} is out of range for a row set of {} row(s)",
                index + 1,
                self.rows.len()
            ))
        })?;
        row.iter()
            .zip(&self.columns)
            .map(|(cell, column)| decode(cell, column))
            .collect()
    }
}
