//! repox record store.
//!
//! Persists harvested metadata records and their revision history in a
//! record/timestamp table pair per data source, behind one storage contract
//! with a SQL dialect per engine (Derby, MySQL, PostgreSQL, SQLite).

pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod models;

pub use config::{Config, StoreConfig};
pub use db::{DataSourceId, DataSourceTables, DatabaseAccess};
pub use dialect::Dialect;
pub use error::{DbError, DbResult};
