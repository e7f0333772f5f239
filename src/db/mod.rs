//! Database abstraction layer.
//!
//! This module provides storage for data sources:
//! - Connection pool management
//! - Raw statement execution helpers
//! - The `DatabaseAccess` contract (dialect + pool)
//! - Table naming and data-source table lifecycle
//! - Execution of incremental and field queries
//! - Connection dispatch macros for reducing code duplication

pub mod access;
#[macro_use]
pub mod macros;
pub mod naming;
pub mod pool;
pub mod provision;
pub mod reader;
pub mod sql_util;

pub use access::DatabaseAccess;
pub use naming::DataSourceId;
pub use pool::{DbConnection, DbPool};
pub use provision::DataSourceTables;
pub use reader::RevisionReader;
