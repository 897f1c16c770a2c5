//! Entry points used by scenario steps.
//!
//! [`DataEngine`] ties the pieces together for one test run: it resolves
//! target names through a [`TargetCatalog`], keeps the run's
//! [`ConnectionManager`] and scenario [`Variables`], and exposes the
//! materialize / query / hash / write operations. Call
//! [`DataEngine::teardown`] when the run ends; dropping the engine does it
//! as well.

use log::info;

use crate::{
    connection::{ConnectionManager, TeardownReport},
    driver::{DbConnection, Driver},
    error::{EngineError, Result},
    fixture::Fixture,
    hash::ReconciliationIndex,
    introspect,
    materialize::{MaterializeContext, MaterializeOptions, materialize},
    rows::RowSet,
    target::{DatabaseTarget, TargetCatalog},
    variables::Variables,
    writer,
};

pub struct DataEngine {
    targets: TargetCatalog,
    connections: ConnectionManager,
    variables: Variables,
}

impl DataEngine {
    pub fn new(targets: TargetCatalog, driver: Box<dyn Driver>) -> Self {
        Self {
            targets,
            connections: ConnectionManager::new(driver),
            variables: Variables::new(),
        }
    }

    pub fn targets(&self) -> &TargetCatalog {
        &self.targets
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    pub fn begin_transaction(&mut self) {
        self.connections.begin_transaction();
    }

    pub fn target(&self, name: &str) -> Result<&DatabaseTarget> {
        self.targets
            .get(name)
            .ok_or_else(|| EngineError::UnknownTarget(name.to_string()))
    }

    pub fn acquire_connection(&mut self, target_name: &str) -> Result<&mut dyn DbConnection> {
        let target = self
            .targets
            .get(target_name)
            .ok_or_else(|| EngineError::UnknownTarget(target_name.to_string()))?;
        self.connections.acquire(target)
    }

    /// Build a typed row set for `table` on `target_name` from `fixture`.
    ///
    /// With `limit_to_defined_columns` the row set has exactly the fixture's
    /// columns; otherwise it has every column of the table.
    pub fn materialize(
        &mut self,
        target_name: &str,
        table: &str,
        fixture: &Fixture,
        options: MaterializeOptions,
    ) -> Result<RowSet> {
        let target = self
            .targets
            .get(target_name)
            .ok_or_else(|| EngineError::UnknownTarget(target_name.to_string()))?;
        let connection = self.connections.acquire(target)?;
        let empty = introspect::empty_row_set(
            connection,
            table,
            fixture,
            options.limit_to_defined_columns,
        )?;
        let context = MaterializeContext {
            defaults: &target.defaults,
            variables: &self.variables,
        };
        materialize(empty, fixture, options, &context)
    }

    /// Run `sql` on `target_name` and return its result as typed rows.
    pub fn query(&mut self, target_name: &str, sql: &str) -> Result<RowSet> {
        info!("Querying {target_name}");
        Ok(self.acquire_connection(target_name)?.query(sql)?)
    }

    /// Run a statement that returns no rows on `target_name`.
    pub fn execute(&mut self, target_name: &str, sql: &str) -> Result<usize> {
        Ok(self.acquire_connection(target_name)?.execute(sql)?)
    }

    /// Hash `rows` over `key_fields`; see [`ReconciliationIndex::build`].
    pub fn hash<S: AsRef<str>>(&self, rows: &RowSet, key_fields: &[S]) -> Result<ReconciliationIndex> {
        ReconciliationIndex::build(rows, key_fields)
    }

    /// Insert `fixture` into `table` on `target_name`; returns rows written.
    ///
    /// The table name is qualified by the target, the row set covers every
    /// table column, and records with no non-empty value are skipped.
    pub fn write(
        &mut self,
        target_name: &str,
        table: &str,
        fixture: &Fixture,
        distinct: bool,
        limit_to_defined_columns: bool,
    ) -> Result<usize> {
        if fixture.is_empty() {
            return Ok(0);
        }
        let target = self
            .targets
            .get(target_name)
            .ok_or_else(|| EngineError::UnknownTarget(target_name.to_string()))?;
        let table = target.qualified_table_name(table);
        let connection = self.connections.acquire(target)?;
        info!("Retrieving target data structure");
        let empty = introspect::empty_row_set(connection, &table, fixture, false)?;

        info!("Populating rows for inserting");
        let options = MaterializeOptions::default()
            .distinct(distinct)
            .include_empty_rows(false)
            .limit_to_defined_columns(limit_to_defined_columns);
        let context = MaterializeContext {
            defaults: &target.defaults,
            variables: &self.variables,
        };
        let rows = materialize(empty, fixture, options, &context)?;

        let connection = self.connections.acquire(target)?;
        writer::write_rows(connection, &table, &rows, target)
    }

    pub fn teardown(&mut self) -> TeardownReport {
        self.connections.teardown()
    }
}
