//! Lifecycle of the record/timestamp table pair of one data source.
//!
//! Tables are created when a data source is provisioned, renamed with it and
//! dropped when it is deleted. Rows are the harvester's business.

use crate::db::access::DatabaseAccess;
use crate::db::naming::DataSourceId;
use crate::db::pool::DbConnection;
use crate::db::sql_util;
use crate::error::{DbError, DbResult};
use crate::models::ValueKind;
use tracing::info;

/// Record bodies are large binaries and are not indexed.
const RECORD_INDEX_VALUE: bool = false;
/// Timestamps are indexed for date-range queries.
const TIMESTAMP_INDEX_VALUE: bool = true;

/// The two tables backing a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceTables {
    id: DataSourceId,
    record_table: String,
    timestamp_table: String,
}

impl DataSourceTables {
    pub fn new(data_source_id: impl Into<String>) -> DbResult<Self> {
        Ok(Self::from_id(DataSourceId::new(data_source_id)?))
    }

    pub fn from_id(id: DataSourceId) -> Self {
        Self {
            record_table: id.record_table(),
            timestamp_table: id.timestamp_table(),
            id,
        }
    }

    pub fn id(&self) -> &DataSourceId {
        &self.id
    }

    pub fn record_table(&self) -> &str {
        &self.record_table
    }

    pub fn timestamp_table(&self) -> &str {
        &self.timestamp_table
    }

    /// Both tables exist.
    pub async fn exists(&self, access: &DatabaseAccess, conn: &mut DbConnection) -> bool {
        access.table_exists(conn, &self.record_table).await
            && access.table_exists(conn, &self.timestamp_table).await
    }

    /// Create whichever of the two tables is missing.
    pub async fn provision(&self, access: &DatabaseAccess, conn: &mut DbConnection) -> DbResult<()> {
        let text = access.map_type(ValueKind::Text);

        if !access.table_exists(conn, &self.record_table).await {
            access
                .create_record_and_index_tables(
                    conn,
                    text,
                    &self.record_table,
                    access.map_type(ValueKind::Binary),
                    RECORD_INDEX_VALUE,
                )
                .await?;
        }

        if !access.table_exists(conn, &self.timestamp_table).await {
            access
                .create_record_and_index_tables(
                    conn,
                    text,
                    &self.timestamp_table,
                    access.map_type(ValueKind::Date),
                    TIMESTAMP_INDEX_VALUE,
                )
                .await?;
        }

        info!(data_source = %self.id, "Data source tables provisioned");
        Ok(())
    }

    /// Rename both tables and their indexes to those of `new_id`.
    ///
    /// Both source tables must exist and neither target may exist; otherwise
    /// no statement runs.
    pub async fn rename(
        &self,
        access: &DatabaseAccess,
        conn: &mut DbConnection,
        new_id: &DataSourceId,
    ) -> DbResult<DataSourceTables> {
        let renamed = Self::from_id(new_id.clone());
        // Ids differing only in case share their tables
        if renamed.record_table == self.record_table {
            return Ok(renamed);
        }

        // Nothing is renamed unless both source tables are present
        for table in [self.record_table(), self.timestamp_table()] {
            if !access.table_exists(conn, table).await {
                return Err(DbError::schema(
                    format!("Cannot rename data source '{}': table does not exist", self.id),
                    table,
                ));
            }
        }

        for table in [renamed.record_table(), renamed.timestamp_table()] {
            if access.table_exists(conn, table).await {
                return Err(DbError::schema(
                    format!("Cannot rename data source '{}': target table already exists", self.id),
                    table,
                ));
            }
        }

        let pairs = [
            (&self.record_table, &renamed.record_table, RECORD_INDEX_VALUE),
            (&self.timestamp_table, &renamed.timestamp_table, TIMESTAMP_INDEX_VALUE),
        ];
        for (old, new, index_value) in pairs {
            access.rename_table(conn, old, new).await?;
            access.rename_indexes(conn, new, old, index_value).await?;
        }

        info!(old = %self.id, new = %new_id, "Data source tables renamed");
        Ok(renamed)
    }

    /// Drop both tables, stopping at the first failure.
    pub async fn remove(&self, access: &DatabaseAccess, conn: &mut DbConnection) -> DbResult<()> {
        access.drop_table(conn, &self.record_table).await?;
        access.drop_table(conn, &self.timestamp_table).await?;
        info!(data_source = %self.id, "Data source tables dropped");
        Ok(())
    }

    /// Number of stored revisions, current and historical.
    pub async fn revision_count(&self, conn: &mut DbConnection) -> DbResult<i64> {
        let sql = format!("select count(*) from {}", self.record_table);
        Ok(sql_util::single_i64(conn, &sql).await?.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        let tables = DataSourceTables::new("BibNat").unwrap();
        assert_eq!(tables.record_table(), "repox_bibnat_record");
        assert_eq!(tables.timestamp_table(), "repox_bibnat_timestamp");
        assert_eq!(tables.id().as_str(), "BibNat");
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(matches!(
            DataSourceTables::new("bib nat"),
            Err(DbError::InvalidInput { .. })
        ));
    }
}
