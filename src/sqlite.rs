//! SQLite driver backed by `rusqlite`.
//!
//! Column types come from the declared type of each result column. Expression
//! columns have no declared type and are read as text. Dates, times, and
//! timestamps are stored as ISO-8601 text.
//!
//! SQLite has neither catalogs nor a switchable default schema: both native
//! selection calls fail, and schema selection only works through a target's
//! statement template.

use log::debug;
use rusqlite::{
    Connection, params_from_iter,
    types::{ToSql, ToSqlOutput, ValueRef},
};

use crate::{
    data::{Cell, DATE_FORMAT, Value, parse_value},
    driver::{DbConnection, Driver, DriverError, DriverResult},
    rows::{Row, RowSet},
    schema::{ColumnDescriptor, ColumnType},
    target::DatabaseTarget,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn connect(&self, target: &DatabaseTarget) -> DriverResult<Box<dyn DbConnection>> {
        debug!("Opening SQLite database {}", target.url);
        let conn = Connection::open(&target.url).map_err(sqlite_error)?;
        Ok(Box::new(SqliteConnection { conn }))
    }
}

pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl DbConnection for SqliteConnection {
    fn set_autocommit(&mut self, enabled: bool) -> DriverResult<()> {
        match (enabled, self.conn.is_autocommit()) {
            (false, true) => self.conn.execute_batch("BEGIN").map_err(sqlite_error),
            (true, false) => self.conn.execute_batch("COMMIT").map_err(sqlite_error),
            _ => Ok(()),
        }
    }

    fn set_catalog(&mut self, _catalog: &str) -> DriverResult<()> {
        Err(DriverError::new("SQLite does not support selecting a catalog"))
    }

    fn set_schema(&mut self, _schema: &str) -> DriverResult<()> {
        Err(DriverError::new(
            "SQLite does not support selecting a default schema",
        ))
    }

    fn execute(&mut self, sql: &str) -> DriverResult<usize> {
        self.conn.execute(sql, []).map_err(sqlite_error)
    }

    fn describe(&mut self, query: &str) -> DriverResult<Vec<ColumnDescriptor>> {
        let stmt = self.conn.prepare(query).map_err(sqlite_error)?;
        Ok(describe_statement(&stmt))
    }

    fn query(&mut self, query: &str) -> DriverResult<RowSet> {
        let mut stmt = self.conn.prepare(query).map_err(sqlite_error)?;
        let columns = describe_statement(&stmt);
        let mut result = RowSet::new(columns.clone());
        let mut rows = stmt.query([]).map_err(sqlite_error)?;
        while let Some(row) = rows.next().map_err(sqlite_error)? {
            let mut cells = Vec::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(sqlite_error)?;
                cells.push(read_cell(value, column)?);
            }
            result
                .push(cells)
                .map_err(|err| DriverError::new(err.to_string()))?;
        }
        Ok(result)
    }

    fn execute_batch(
        &mut self,
        sql: &str,
        columns: &[ColumnDescriptor],
        rows: &[Row],
    ) -> DriverResult<usize> {
        let savepoint = self.conn.savepoint().map_err(sqlite_error)?;
        let written = {
            let mut stmt = savepoint.prepare(sql).map_err(sqlite_error)?;
            for (idx, row) in rows.iter().enumerate() {
                if row.len() != columns.len() {
                    return Err(DriverError::new(format!(
                        "Batch entry {} has {} value(s) for {} column(s)",
                        idx + 1,
                        row.len(),
                        columns.len()
                    )));
                }
                stmt.execute(params_from_iter(row.iter())).map_err(|err| {
                    DriverError::new(format!(
                        "Batch entry {} of {} failed",
                        idx + 1,
                        rows.len()
                    ))
                    .with_next(sqlite_error(err))
                })?;
            }
            rows.len()
        };
        savepoint.commit().map_err(sqlite_error)?;
        Ok(written)
    }

    fn rollback(&mut self) -> DriverResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK").map_err(sqlite_error)
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        self.conn.close().map_err(|(_, err)| sqlite_error(err))
    }
}

fn describe_statement(stmt: &rusqlite::Statement<'_>) -> Vec<ColumnDescriptor> {
    stmt.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| match column.decl_type() {
            Some(decl_type) => ColumnDescriptor::new(idx + 1, column.name(), decl_type),
            None => ColumnDescriptor::typed(idx + 1, column.name(), ColumnType::Text),
        })
        .collect()
}

fn sqlite_error(err: rusqlite::Error) -> DriverError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _) => DriverError::new(err.to_string()).with_next(
            DriverError::new(format!("SQLite extended code {}", code.extended_code)),
        ),
        _ => DriverError::new(err.to_string()),
    }
}

fn read_cell(value: ValueRef<'_>, column: &ColumnDescriptor) -> DriverResult<Cell> {
    let unreadable = |storage: &str| {
        DriverError::new(format!(
            "Cannot read {storage} value from column {} as {}",
            column.name, column.vendor_type
        ))
    };
    let Some(ty) = column.column_type else {
        // No codec for this column; keep a textual rendering so a later
        // decode can report the column as unsupported.
        return Ok(match value {
            ValueRef::Null => None,
            ValueRef::Integer(i) => Some(Value::Text(i.to_string())),
            ValueRef::Real(f) => Some(Value::Text(f.to_string())),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Some(Value::Text(String::from_utf8_lossy(bytes).into_owned()))
            }
        });
    };
    let parsed = match (ty, value) {
        (_, ValueRef::Null) => return Ok(None),
        (ColumnType::Decimal, ValueRef::Integer(i)) => Value::Decimal(i as f64),
        (ColumnType::Decimal, ValueRef::Real(f)) => Value::Decimal(f),
        (ColumnType::BigInteger, ValueRef::Integer(i)) => Value::BigInteger(i),
        (ColumnType::Integer, ValueRef::Integer(i)) => {
            Value::Integer(i32::try_from(i).map_err(|_| unreadable("out-of-range integer"))?)
        }
        (ColumnType::Boolean, ValueRef::Integer(i)) => Value::Boolean(i != 0),
        (ColumnType::Text | ColumnType::FixedText, ValueRef::Integer(i)) => {
            Value::Text(i.to_string())
        }
        (ColumnType::Text | ColumnType::FixedText, ValueRef::Real(f)) => Value::Text(f.to_string()),
        (ColumnType::Boolean, ValueRef::Text(b"1")) => Value::Boolean(true),
        (ColumnType::Boolean, ValueRef::Text(b"0")) => Value::Boolean(false),
        (_, ValueRef::Text(bytes)) => {
            let text = std::str::from_utf8(bytes).map_err(|_| unreadable("non UTF-8 text"))?;
            parse_value(text, ty).map_err(|reason| {
                DriverError::new(format!(
                    "Cannot read '{text}' from column {} as {ty}: {reason}",
                    column.name
                ))
            })?
        }
        (_, ValueRef::Integer(_)) => return Err(unreadable("integer")),
        (_, ValueRef::Real(_)) => return Err(unreadable("real")),
        (_, ValueRef::Blob(_)) => return Err(unreadable("blob")),
    };
    Ok(Some(parsed))
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Decimal(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::BigInteger(i) => ToSqlOutput::from(*i),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Date(d) => ToSqlOutput::from(d.format(DATE_FORMAT).to_string()),
            Value::Time(t) => ToSqlOutput::from(t.format("%H:%M:%S%.f").to_string()),
            Value::Timestamp(ts) => {
                ToSqlOutput::from(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            Value::Boolean(b) => ToSqlOutput::from(*b),
        })
    }
}
