//! Driver seam between the engine and a concrete database client.
//!
//! The engine never talks to a client library directly. A [`Driver`] opens
//! [`DbConnection`]s for a [`DatabaseTarget`]; connections describe queries,
//! read typed rows, and run parameterized batches. Failures come back as
//! [`DriverError`], which can carry a chain of follow-up diagnostics the
//! way some clients report a batch failure plus the statement-level cause.

use std::fmt;

use crate::{rows::Row, rows::RowSet, schema::ColumnDescriptor, target::DatabaseTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub message: String,
    pub next: Option<Box<DriverError>>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            next: None,
        }
    }

    pub fn with_next(mut self, next: DriverError) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    /// Messages of every chained diagnostic after this one, joined with "; ".
    pub fn chained_message(&self) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = self.next.as_deref();
        while let Some(err) = current {
            parts.push(err.message.as_str());
            current = err.next.as_deref();
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.next
            .as_deref()
            .map(|next| next as &(dyn std::error::Error + 'static))
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

pub trait DbConnection {
    /// Turn autocommit on or off. Turning it off opens a transaction scope
    /// that lasts until [`DbConnection::rollback`] or close.
    fn set_autocommit(&mut self, enabled: bool) -> DriverResult<()>;

    fn set_catalog(&mut self, catalog: &str) -> DriverResult<()>;

    fn set_schema(&mut self, schema: &str) -> DriverResult<()>;

    /// Run a statement that returns no rows; returns the affected row count.
    fn execute(&mut self, sql: &str) -> DriverResult<usize>;

    /// Column shape of `query` without fetching data.
    fn describe(&mut self, query: &str) -> DriverResult<Vec<ColumnDescriptor>>;

    /// Run `query` and return its rows as typed cells.
    fn query(&mut self, query: &str) -> DriverResult<RowSet>;

    /// Execute `sql` once per row as a single unit; returns rows written.
    /// A failure leaves none of the batch applied.
    fn execute_batch(
        &mut self,
        sql: &str,
        columns: &[ColumnDescriptor],
        rows: &[Row],
    ) -> DriverResult<usize>;

    fn rollback(&mut self) -> DriverResult<()>;

    fn close(self: Box<Self>) -> DriverResult<()>;
}

pub trait Driver {
    fn connect(&self, target: &DatabaseTarget) -> DriverResult<Box<dyn DbConnection>>;
}
