//! Per-target connection cache for one test run.
//!
//! A [`ConnectionManager`] opens at most one connection per target name, on
//! first use, and keeps it until [`ConnectionManager::teardown`]. It is owned
//! by a single test-run context and driven from one thread; scenarios that
//! run concurrently each get their own manager.
//!
//! Teardown reports every cleanup failure and aborts none: a failed rollback
//! or close is logged and collected, and the remaining connections are still
//! cleaned up. Dropping a manager with live connections runs teardown.

use std::{collections::BTreeMap, fmt};

use log::{error, info, warn};

use crate::{
    driver::{DbConnection, Driver},
    error::{EngineError, Result},
    target::DatabaseTarget,
};

struct CachedConnection {
    connection: Box<dyn DbConnection>,
    transactional: bool,
}

pub struct ConnectionManager {
    driver: Box<dyn Driver>,
    in_transaction: bool,
    connections: BTreeMap<String, CachedConnection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStage {
    Rollback,
    Close,
}

impl fmt::Display for CleanupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupStage::Rollback => write!(f, "rollback"),
            CleanupStage::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub target: String,
    pub stage: CleanupStage,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub released: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl ConnectionManager {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            in_transaction: false,
            connections: BTreeMap::new(),
        }
    }

    /// Run subsequently opened connections with autocommit off; teardown
    /// rolls them back.
    pub fn begin_transaction(&mut self) {
        self.in_transaction = true;
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn is_live(&self, target_name: &str) -> bool {
        self.connections.contains_key(target_name)
    }

    pub fn live_count(&self) -> usize {
        self.connections.len()
    }

    /// The cached connection for `target`, opening and configuring it on first use.
    pub fn acquire(&mut self, target: &DatabaseTarget) -> Result<&mut dyn DbConnection> {
        if !self.connections.contains_key(&target.name) {
            let transactional = self.in_transaction;
            let connection = self.open(target, transactional)?;
            self.connections.insert(
                target.name.clone(),
                CachedConnection {
                    connection,
                    transactional,
                },
            );
        }
        match self.connections.get_mut(&target.name) {
            Some(cached) => Ok(cached.connection.as_mut()),
            None => Err(EngineError::connection(
                &target.name,
                "connection missing from cache",
            )),
        }
    }

    fn open(&self, target: &DatabaseTarget, transactional: bool) -> Result<Box<dyn DbConnection>> {
        let mut connection = self
            .driver
            .connect(target)
            .map_err(|err| EngineError::connection(&target.name, err))?;

        let configured = configure(connection.as_mut(), target, transactional);
        if let Err(err) = configured {
            if let Err(close_err) = connection.close() {
                warn!(
                    "Error closing half-configured connection to {}: {close_err}",
                    target.name
                );
            }
            return Err(err);
        }
        info!("Connected to database {}", target.name);
        Ok(connection)
    }

    /// Roll back (when transactional) and close every cached connection,
    /// then end the transaction. Failures are collected, never raised.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        for (name, cached) in std::mem::take(&mut self.connections) {
            info!("Closing connection {name}");
            let CachedConnection {
                mut connection,
                transactional,
            } = cached;
            if transactional {
                info!("Rollback on {name}");
                if let Err(err) = connection.rollback() {
                    error!("Error during rollback on {name}: {err}");
                    report.failures.push(CleanupFailure {
                        target: name.clone(),
                        stage: CleanupStage::Rollback,
                        message: err.to_string(),
                    });
                }
            }
            if let Err(err) = connection.close() {
                error!("Error during close of connection to {name}: {err}");
                report.failures.push(CleanupFailure {
                    target: name.clone(),
                    stage: CleanupStage::Close,
                    message: err.to_string(),
                });
            }
            report.released.push(name);
        }
        self.in_transaction = false;
        report
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if !self.connections.is_empty() {
            warn!(
                "Connection manager dropped with {} live connection(s); tearing down",
                self.connections.len()
            );
            self.teardown();
        }
    }
}

fn configure(
    connection: &mut dyn DbConnection,
    target: &DatabaseTarget,
    transactional: bool,
) -> Result<()> {
    if transactional {
        info!(
            "Running in a transaction, setting autocommit off for {}",
            target.name
        );
        connection
            .set_autocommit(false)
            .map_err(|err| EngineError::connection(&target.name, err))?;
    }
    if target.wants_schema() {
        select_schema(connection, target)?;
    }
    Ok(())
}

fn select_schema(connection: &mut dyn DbConnection, target: &DatabaseTarget) -> Result<()> {
    let schema = target.schema.as_str();
    let schema_error = |message: String| EngineError::SchemaSet {
        target: target.name.clone(),
        schema: schema.to_string(),
        message,
    };

    if let Some(statement) = target.set_schema_statement() {
        info!("Setting default schema using template, statement is {statement}");
        return connection
            .execute(&statement)
            .map(|_| ())
            .map_err(|err| schema_error(format!("set-schema template failed: {err}")));
    }

    info!("Setting default catalog to {schema}");
    let catalog = connection.set_catalog(schema);
    if let Err(err) = &catalog {
        info!("Could not set catalog to {schema}: {err}");
    }
    info!("Setting default schema to {schema}");
    let schema_result = connection.set_schema(schema);
    match (catalog, schema_result) {
        (Err(catalog_err), Err(schema_err)) => Err(schema_error(format!(
            "catalog: {catalog_err}; schema: {schema_err}"
        ))),
        (_, Err(err)) => {
            info!("Could not set schema to {schema}: {err}");
            Ok(())
        }
        _ => Ok(()),
    }
}
