//! Column shape discovery through zero-row queries.

use log::info;

use crate::{
    driver::DbConnection,
    error::{EngineError, Result},
    fixture::{Fixture, FixtureRecord},
    rows::RowSet,
    schema::{ColumnDescriptor, position_of},
};

/// Query that returns no rows but has the shape of `table`.
pub fn probe_query(table: &str) -> String {
    format!("SELECT * FROM {table} WHERE 1 = 0")
}

/// Describe `table` and return an empty row set with its column shape.
///
/// With `only_defined_columns` the row set keeps only the fields of the first
/// fixture record, in that record's order. A field the table does not have
/// fails with [`EngineError::SchemaMismatch`].
pub fn empty_row_set(
    connection: &mut dyn DbConnection,
    table: &str,
    fixture: &Fixture,
    only_defined_columns: bool,
) -> Result<RowSet> {
    let defining = if only_defined_columns {
        Some(defining_record(table, fixture)?)
    } else {
        None
    };

    let query = probe_query(table);
    info!("Retrieving data structure for {table}");
    let columns = connection
        .describe(&query)
        .map_err(|err| EngineError::Schema(format!("Describing '{query}' failed: {err}")))?;

    match defining {
        Some(record) => Ok(RowSet::new(project(&columns, record)?)),
        None => Ok(RowSet::new(columns)),
    }
}

fn defining_record<'a>(table: &str, fixture: &'a Fixture) -> Result<&'a FixtureRecord> {
    let first = fixture.first().ok_or_else(|| {
        EngineError::Schema(format!(
            "Cannot derive columns for {table}: the fixture has no records"
        ))
    })?;
    if first.is_empty() {
        return Err(EngineError::Schema(format!(
            "Cannot derive columns for {table}: the first fixture record has no fields"
        )));
    }
    Ok(first)
}

fn project(columns: &[ColumnDescriptor], record: &FixtureRecord) -> Result<Vec<ColumnDescriptor>> {
    record
        .field_names()
        .enumerate()
        .map(|(idx, field)| {
            let position =
                position_of(columns, field).ok_or_else(|| EngineError::SchemaMismatch {
                    field: field.to_string(),
                })?;
            Ok(ColumnDescriptor {
                ordinal: idx + 1,
                ..columns[position].clone()
            })
        })
        .collect()
}
