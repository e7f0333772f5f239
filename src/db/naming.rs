//! Table and index naming for data sources.
//!
//! The harvester relies on these names bit-for-bit, so every dialect shares them:
//! `repox_<id>_record` and `repox_<id>_timestamp`, lower-cased, with indexes
//! named `<table>_i_nc` and `<table>_i_val`.

use crate::error::{DbError, DbResult};

pub const INTERNAL_TABLE_PREFIX: &str = "repox_";
pub const RECORD_TABLE_SUFFIX: &str = "_record";
pub const TIMESTAMP_TABLE_SUFFIX: &str = "_timestamp";

pub const NC_INDEX_SUFFIX: &str = "_i_nc";
pub const VALUE_INDEX_SUFFIX: &str = "_i_val";

/// Identifier of a data source, validated so it can be interpolated into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSourceId(String);

impl DataSourceId {
    /// Validate a data source id.
    ///
    /// Only ASCII letters, digits and `_` are accepted.
    pub fn new(id: impl Into<String>) -> DbResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(DbError::invalid_input("Data source id cannot be empty"));
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DbError::invalid_input(format!(
                "Data source id '{id}' contains invalid characters (allowed: letters, digits, '_')"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn record_table(&self) -> String {
        format!("{INTERNAL_TABLE_PREFIX}{}{RECORD_TABLE_SUFFIX}", self.0).to_lowercase()
    }

    pub fn timestamp_table(&self) -> String {
        format!("{INTERNAL_TABLE_PREFIX}{}{TIMESTAMP_TABLE_SUFFIX}", self.0).to_lowercase()
    }
}

impl std::fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DataSourceId {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
