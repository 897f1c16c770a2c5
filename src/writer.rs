//! Batched inserts of a materialized row set.

use itertools::Itertools;
use log::info;

use crate::{
    driver::DbConnection,
    error::{EngineError, Result},
    rows::RowSet,
    schema::ColumnDescriptor,
    target::DatabaseTarget,
};

/// `INSERT INTO <table> (<cols>) VALUES (?, ...)` for the given columns.
pub fn insert_statement(table: &str, columns: &[ColumnDescriptor], target: &DatabaseTarget) -> String {
    let column_list = columns
        .iter()
        .map(|column| target.formatted_column_name(&column.name))
        .join(", ");
    let placeholders = std::iter::repeat_n("?", columns.len()).join(", ");
    format!("INSERT INTO {table} ({column_list}) VALUES ({placeholders})")
}

/// Insert every row of `rows` into `table` as one batch and return the
/// number of rows written. A failed batch writes nothing and is not retried.
pub fn write_rows(
    connection: &mut dyn DbConnection,
    table: &str,
    rows: &RowSet,
    target: &DatabaseTarget,
) -> Result<usize> {
    if rows.is_empty() {
        info!("No rows to insert into {table}");
        return Ok(0);
    }
    let statement = insert_statement(table, rows.columns(), target);
    info!("Executing insert of {} row(s) into {table}", rows.len());
    connection
        .execute_batch(&statement, rows.columns(), rows.rows())
        .map_err(|err| {
            let diagnostic = err.chained_message();
            if let Some(next) = &diagnostic {
                info!("Next exception: {next}");
            }
            EngineError::BatchWrite {
                table: table.to_string(),
                message: err.message,
                diagnostic,
            }
        })
}
