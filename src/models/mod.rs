//! Data models for the repox record store.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod query;
pub mod record;

// Re-export commonly used types
pub use connection::{DatabaseType, masked_connection_string};
pub use query::{BuiltQuery, DEFAULT_QUERY_TIMEOUT_SECS, DateRange, MAX_QUERY_TIMEOUT_SECS};
pub use record::{FieldValue, RecordColumn, RecordRevision, ValueKind};
