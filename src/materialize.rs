//! Row materialization: fixture records to typed rows.
//!
//! [`materialize()`] walks the fixture in order and builds one pending row per
//! record against the row set's columns. A pending row is either pushed whole
//! or dropped whole; nothing of a discarded record reaches the row set.
//!
//! Distinct filtering keys each record on the values it specifies, in column
//! order, each preceded by [`KEY_SEPARATOR`] so that `("1", "23")` and
//! `("12", "3")` produce different keys.

use std::collections::HashSet;

use log::{Level, debug, info, log_enabled};

use crate::{
    data::{Cell, encode},
    error::{EngineError, Result},
    fixture::{Fixture, FixtureRecord},
    rows::RowSet,
    schema::{ColumnDescriptor, position_of},
    target::ColumnDefaults,
    variables::VariableStore,
};

pub const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Drop records whose key was already committed.
    pub distinct: bool,
    /// Keep records in which every specified value is empty.
    pub include_empty_rows: bool,
    /// Reject fixture fields the row set does not define.
    pub limit_to_defined_columns: bool,
}

impl MaterializeOptions {
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn include_empty_rows(mut self, include: bool) -> Self {
        self.include_empty_rows = include;
        self
    }

    pub fn limit_to_defined_columns(mut self, limit: bool) -> Self {
        self.limit_to_defined_columns = limit;
        self
    }
}

/// Everything a row needs from its surroundings besides the fixture itself.
pub struct MaterializeContext<'a> {
    pub defaults: &'a ColumnDefaults,
    pub variables: &'a dyn VariableStore,
}

/// Populate `row_set` from `fixture` and return it.
pub fn materialize(
    mut row_set: RowSet,
    fixture: &Fixture,
    options: MaterializeOptions,
    context: &MaterializeContext<'_>,
) -> Result<RowSet> {
    if options.limit_to_defined_columns
        && let Some(first) = fixture.first()
    {
        check_defined_columns(first, row_set.columns())?;
    }

    let mut seen_keys = HashSet::new();
    let mut discarded = 0usize;
    for record in fixture.records() {
        let pending = build_row(record, row_set.columns(), context)?;
        let keep = (pending.relevant || options.include_empty_rows)
            && (!options.distinct || !seen_keys.contains(&pending.key));
        if !keep {
            discarded += 1;
            continue;
        }
        if log_enabled!(Level::Debug) {
            debug!("Adding row {}", describe_row(row_set.columns(), &pending.cells));
        }
        row_set.push(pending.cells)?;
        if options.distinct {
            seen_keys.insert(pending.key);
        }
    }
    info!(
        "Materialized {} row(s) from {} fixture record(s), {} discarded",
        row_set.len(),
        fixture.len(),
        discarded
    );
    Ok(row_set)
}

fn check_defined_columns(record: &FixtureRecord, columns: &[ColumnDescriptor]) -> Result<()> {
    match record
        .field_names()
        .find(|field| position_of(columns, field).is_none())
    {
        Some(field) => Err(EngineError::SchemaMismatch {
            field: field.to_string(),
        }),
        None => Ok(()),
    }
}

struct PendingRow {
    cells: Vec<Cell>,
    key: String,
    relevant: bool,
}

fn build_row(
    record: &FixtureRecord,
    columns: &[ColumnDescriptor],
    context: &MaterializeContext<'_>,
) -> Result<PendingRow> {
    let mut pending = PendingRow {
        cells: Vec::with_capacity(columns.len()),
        key: String::new(),
        relevant: false,
    };
    for column in columns {
        let cell = match record.get(&column.name) {
            Some(raw) => {
                if !raw.is_empty() {
                    pending.relevant = true;
                }
                pending.key.push(KEY_SEPARATOR);
                pending.key.push_str(raw);
                encode(raw, column, context.variables)?
            }
            None => match context.defaults.get(&column.name) {
                Some(default) => encode(default, column, context.variables)?,
                None => None,
            },
        };
        pending.cells.push(cell);
    }
    Ok(pending)
}

fn describe_row(columns: &[ColumnDescriptor], cells: &[Cell]) -> String {
    columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| match cell {
            Some(value) => format!("{}={value}", column.name),
            None => format!("{}=NULL", column.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
