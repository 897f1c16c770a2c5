//! Fixture materialization and row reconciliation for database tests.
//!
//! Scenario data tables become typed rows shaped like a live table
//! ([`materialize`]), get bulk-inserted ([`writer`]), or get hashed so an
//! expected and an actual result can be compared regardless of row order
//! ([`hash`]). [`engine::DataEngine`] is the entry point that wires these to
//! named database targets and a per-run connection cache.

pub mod connection;
pub mod data;
pub mod driver;
pub mod engine;
pub mod error;
pub mod fixture;
pub mod hash;
pub mod introspect;
pub mod materialize;
pub mod rows;
pub mod schema;
pub mod sqlite;
pub mod target;
pub mod variables;
pub mod writer;

use std::{env, sync::OnceLock};

use log::LevelFilter;

pub use engine::DataEngine;
pub use error::{EngineError, Result};

static LOGGER: OnceLock<()> = OnceLock::new();

/// Install `env_logger` once. `RUST_LOG` wins when set; otherwise this
/// crate logs at `info`.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("fixture_recon", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}
