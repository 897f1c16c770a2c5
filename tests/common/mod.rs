#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fixture_recon::{
    DataEngine,
    sqlite::SqliteDriver,
    target::{DatabaseTarget, TargetCatalog},
};
use rusqlite::Connection;
use tempfile::{TempDir, tempdir};

/// Scratch directory holding SQLite databases; removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Creates a database file under the workspace, runs `ddl` in it, and
    /// returns its path.
    pub fn database(&self, name: &str, ddl: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let conn = Connection::open(&path).expect("open sqlite database");
        conn.execute_batch(ddl).expect("run ddl");
        path
    }

    /// A target named `name` pointing at `path`.
    pub fn target(&self, name: &str, path: &Path) -> DatabaseTarget {
        DatabaseTarget::new(name, path.to_string_lossy())
    }

    /// Engine over the given targets using the SQLite driver.
    pub fn engine(&self, targets: Vec<DatabaseTarget>) -> DataEngine {
        let catalog = TargetCatalog::new(targets).expect("valid catalog");
        DataEngine::new(catalog, Box::new(SqliteDriver))
    }
}

/// Reads `sql` directly, bypassing the engine, as rows of strings.
pub fn read_strings(path: &Path, sql: &str) -> Vec<Vec<String>> {
    let conn = Connection::open(path).expect("open sqlite database");
    let mut stmt = conn.prepare(sql).expect("prepare");
    let width = stmt.column_count();
    stmt.query_map([], |row| {
        (0..width)
            .map(|idx| {
                let value: Option<String> = row.get::<_, rusqlite::types::Value>(idx).map(|v| match v {
                    rusqlite::types::Value::Null => None,
                    rusqlite::types::Value::Integer(i) => Some(i.to_string()),
                    rusqlite::types::Value::Real(f) => Some(f.to_string()),
                    rusqlite::types::Value::Text(t) => Some(t),
                    rusqlite::types::Value::Blob(_) => Some("<blob>".to_string()),
                })?;
                Ok(value.unwrap_or_default())
            })
            .collect()
    })
    .expect("query")
    .collect::<Result<Vec<_>, _>>()
    .expect("rows")
}
