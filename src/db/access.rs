//! The storage contract the harvester talks to.
//!
//! [`DatabaseAccess`] pairs a [`Dialect`] (selected from configuration) with a
//! live connection pool. Schema operations run on a connection the caller opened
//! with [`DatabaseAccess::open_connection`], so a caller can sequence several
//! statements on one connection and release it when done.
//!
//! Propagation follows what the caller can do about a failure: the existence
//! probe collapses errors to `false`, while create, drop and rename return them.

use crate::config::StoreConfig;
use crate::db::naming::DataSourceId;
use crate::db::pool::{DbConnection, DbPool};
use crate::db::reader::RevisionReader;
use crate::db::sql_util;
use crate::dialect::{self, Dialect};
use crate::error::{DbError, DbResult};
use crate::models::{
    BuiltQuery, DatabaseType, DateRange, FieldValue, RecordColumn, RecordRevision, ValueKind,
    masked_connection_string,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct DatabaseAccess {
    pool: DbPool,
    dialect: Arc<dyn Dialect>,
    reader: RevisionReader,
}

impl DatabaseAccess {
    /// Build the connection pool described by `config`.
    ///
    /// Every failure is logged and returned; there is no half-initialized store.
    pub async fn connect(config: &StoreConfig) -> DbResult<Self> {
        let (db_type, connection_string, pool_options) = config.resolve().inspect_err(|e| {
            error!(error = %e, "Invalid database configuration");
        })?;

        info!(
            db_type = %db_type,
            url = %masked_connection_string(&connection_string),
            "Database URL connection"
        );

        let pool = DbPool::connect(db_type, &connection_string, &pool_options)
            .await
            .inspect_err(|e| {
                error!(db_type = %db_type, error = %e, "Failed to open database");
            })?;

        if let Some(version) = pool.server_version().await {
            info!(db_type = %db_type, server_version = %version, "Connected successfully");
        }

        Ok(Self::from_pool(pool).with_query_timeout(config.query_timeout()))
    }

    /// Wrap an existing pool, using the dialect of its engine.
    pub fn from_pool(pool: DbPool) -> Self {
        let dialect = dialect::for_database_type(pool.db_type());
        Self {
            pool,
            dialect,
            reader: RevisionReader::new(),
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.reader = RevisionReader::with_timeout(timeout);
        self
    }

    pub fn db_type(&self) -> DatabaseType {
        self.dialect.database_type()
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Column type for a value kind in this store's dialect.
    pub fn map_type(&self, kind: ValueKind) -> &'static str {
        self.dialect.map_type(kind)
    }

    /// Acquire a pooled connection.
    ///
    /// Fails with [`DbError::Timeout`] when the pool stays exhausted past its
    /// acquire timeout, or [`DbError::Connection`] when the engine is unreachable.
    pub async fn open_connection(&self) -> DbResult<DbConnection> {
        self.pool.acquire().await.inspect_err(|e| {
            error!(db_type = %self.db_type(), error = %e, "Failed to open database connection");
        })
    }

    /// Probe a table with a minimal read. Any failure reads as "does not exist".
    pub async fn table_exists(&self, conn: &mut DbConnection, table: &str) -> bool {
        if !is_identifier(table) {
            debug!(table = %table, "Not a valid table name");
            return false;
        }
        let sql = self.dialect.table_probe_sql(table);
        match sql_util::has_row(conn, &sql).await {
            Ok(_) => true,
            Err(e) => {
                debug!(table = %table, error = %e, "Table probe failed");
                false
            }
        }
    }

    /// Create a table with its `nc` index and, when `index_value` is set, its `value` index.
    ///
    /// Does not tolerate an existing table; check [`Self::table_exists`] first.
    pub async fn create_record_and_index_tables(
        &self,
        conn: &mut DbConnection,
        id_type: &str,
        table: &str,
        value_type: &str,
        index_value: bool,
    ) -> DbResult<()> {
        check_identifier(table)?;
        let statements =
            self.dialect
                .create_record_and_index_tables_sql(id_type, table, value_type, index_value);
        for sql in &statements {
            info!(table = %table, sql = %sql, "Creating table");
            sql_util::run_update(conn, sql).await.map_err(|e| {
                error!(table = %table, error = %e, "Table creation failed");
                DbError::from_ddl(e, table)
            })?;
        }
        Ok(())
    }

    pub async fn drop_table(&self, conn: &mut DbConnection, table: &str) -> DbResult<()> {
        check_identifier(table)?;
        let sql = self.dialect.drop_table_sql(table);
        info!(table = %table, sql = %sql, "Dropping table");
        sql_util::run_update(conn, &sql)
            .await
            .map_err(|e| DbError::from_ddl(e, table))?;
        Ok(())
    }

    /// The dialect's rename statement, not executed.
    pub fn rename_table_sql(&self, old_table: &str, new_table: &str) -> String {
        self.dialect.rename_table_sql(old_table, new_table)
    }

    /// Execute the rename statement. Indexes keep their old names until
    /// [`Self::rename_indexes`] runs.
    pub async fn rename_table(
        &self,
        conn: &mut DbConnection,
        old_table: &str,
        new_table: &str,
    ) -> DbResult<()> {
        check_identifier(old_table)?;
        check_identifier(new_table)?;
        let sql = self.rename_table_sql(old_table, new_table);
        info!(old = %old_table, new = %new_table, sql = %sql, "Renaming table");
        sql_util::run_update(conn, &sql)
            .await
            .map_err(|e| DbError::from_ddl(e, old_table))?;
        Ok(())
    }

    /// Rename the indexes of a table that was already renamed from `old_table`.
    pub async fn rename_indexes(
        &self,
        conn: &mut DbConnection,
        new_table: &str,
        old_table: &str,
        index_value: bool,
    ) -> DbResult<()> {
        check_identifier(old_table)?;
        check_identifier(new_table)?;
        let statements = self
            .dialect
            .rename_indexes_sql(new_table, old_table, index_value);
        info!(table = %new_table, statements = ?statements, "Renaming indexes");
        sql_util::run_updates(conn, &statements)
            .await
            .map_err(|e| DbError::from_ddl(e, new_table))
    }

    pub fn build_incremental_query(
        &self,
        data_source: &DataSourceId,
        range: &DateRange,
        offset: Option<i64>,
        limit: Option<i64>,
        include_full_record: bool,
    ) -> BuiltQuery {
        self.dialect
            .build_incremental_query(data_source, range, offset, limit, include_full_record)
    }

    pub fn build_field_query(
        &self,
        data_source: &DataSourceId,
        range: &DateRange,
        offset: Option<i64>,
        limit: Option<i64>,
        field: RecordColumn,
    ) -> BuiltQuery {
        self.dialect
            .build_field_query(data_source, range, offset, limit, field)
    }

    /// Run an incremental query built by [`Self::build_incremental_query`].
    pub async fn fetch_revisions(
        &self,
        conn: &mut DbConnection,
        query: &BuiltQuery,
        include_full_record: bool,
    ) -> DbResult<Vec<RecordRevision>> {
        self.reader
            .fetch_revisions(conn, query, include_full_record)
            .await
    }

    /// Run a field query built by [`Self::build_field_query`].
    pub async fn fetch_field(
        &self,
        conn: &mut DbConnection,
        query: &BuiltQuery,
        column: RecordColumn,
    ) -> DbResult<Vec<FieldValue>> {
        self.reader.fetch_field(conn, query, column).await
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Table names are interpolated into DDL, so only plain identifiers pass.
fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(name: &str) -> DbResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(DbError::invalid_input(format!(
            "'{name}' is not a valid table name"
        )))
    }
}
