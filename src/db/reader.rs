//! Execution of built incremental and field queries.
//!
//! This module runs a [`BuiltQuery`] on an opened connection with:
//! - Date bounds bound as parameters
//! - Row limits (enforced via streaming - only fetches needed rows)
//! - Query timeouts
//!
//! # Architecture
//!
//! The reader uses database-specific implementations organized in submodules
//! (`mysql`, `postgres`, `sqlite`). Each fetches rows the same way and decodes
//! them with the column types its dialect created.

use crate::db::pool::DbConnection;
use crate::error::{DbError, DbResult};
use crate::models::{
    BuiltQuery, DEFAULT_QUERY_TIMEOUT_SECS, FieldValue, MAX_QUERY_TIMEOUT_SECS, RecordColumn,
    RecordRevision,
};
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Runs built queries and decodes their rows.
#[derive(Debug, Clone)]
pub struct RevisionReader {
    default_timeout: Duration,
}

impl RevisionReader {
    /// Create a new reader with the default timeout.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS as u64),
        }
    }

    /// Create a reader with a custom timeout, capped at the maximum.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: timeout.min(Duration::from_secs(MAX_QUERY_TIMEOUT_SECS as u64)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Fetch the rows of an incremental query.
    ///
    /// `include_full_record` must match the flag the query was built with.
    pub async fn fetch_revisions(
        &self,
        conn: &mut DbConnection,
        query: &BuiltQuery,
        include_full_record: bool,
    ) -> DbResult<Vec<RecordRevision>> {
        let start = Instant::now();
        debug!(
            sql = %query.sql,
            params = query.params.len(),
            limit = ?query.limit,
            "Fetching record revisions"
        );

        let revisions = match conn {
            DbConnection::MySql(c) => mysql::fetch_rows(&mut **c, query, self.default_timeout)
                .await?
                .iter()
                .map(|row| mysql::to_revision(row, include_full_record))
                .collect::<DbResult<Vec<_>>>()?,
            DbConnection::Postgres(c) => {
                postgres::fetch_rows(&mut **c, query, self.default_timeout)
                    .await?
                    .iter()
                    .map(|row| postgres::to_revision(row, include_full_record))
                    .collect::<DbResult<Vec<_>>>()?
            }
            DbConnection::SQLite(c) => sqlite::fetch_rows(&mut **c, query, self.default_timeout)
                .await?
                .iter()
                .map(|row| sqlite::to_revision(row, include_full_record))
                .collect::<DbResult<Vec<_>>>()?,
        };

        debug!(
            rows = revisions.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched record revisions"
        );
        Ok(revisions)
    }

    /// Fetch the single projected column of a field query.
    pub async fn fetch_field(
        &self,
        conn: &mut DbConnection,
        query: &BuiltQuery,
        column: RecordColumn,
    ) -> DbResult<Vec<FieldValue>> {
        debug!(sql = %query.sql, column = %column, "Fetching field values");

        match conn {
            DbConnection::MySql(c) => mysql::fetch_rows(&mut **c, query, self.default_timeout)
                .await?
                .iter()
                .map(|row| mysql::to_field(row, column))
                .collect(),
            DbConnection::Postgres(c) => {
                postgres::fetch_rows(&mut **c, query, self.default_timeout)
                    .await?
                    .iter()
                    .map(|row| postgres::to_field(row, column))
                    .collect()
            }
            DbConnection::SQLite(c) => sqlite::fetch_rows(&mut **c, query, self.default_timeout)
                .await?
                .iter()
                .map(|row| sqlite::to_field(row, column))
                .collect(),
        }
    }
}

impl Default for RevisionReader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Common Helper Functions
// =============================================================================

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}

fn fetch_limit(query: &BuiltQuery) -> usize {
    query.limit.map(|l| l as usize).unwrap_or(usize::MAX)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::Row;
    use sqlx::mysql::{MySqlConnection, MySqlRow};

    pub async fn fetch_rows(
        conn: &mut MySqlConnection,
        query: &BuiltQuery,
        query_timeout: Duration,
    ) -> DbResult<Vec<MySqlRow>> {
        let mut q = sqlx::query(&query.sql);
        for date in &query.params {
            q = q.bind(*date);
        }
        let rows_future = q.fetch(conn).take(fetch_limit(query)).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub fn to_revision(row: &MySqlRow, include_full_record: bool) -> DbResult<RecordRevision> {
        Ok(RecordRevision {
            nc: row.try_get(0)?,
            deleted: row.try_get(1)?,
            timestamp: row.try_get(2)?,
            id: row.try_get(3)?,
            payload: if include_full_record {
                row.try_get(4)?
            } else {
                None
            },
        })
    }

    pub fn to_field(row: &MySqlRow, column: RecordColumn) -> DbResult<FieldValue> {
        Ok(match column {
            RecordColumn::Id => FieldValue::Id(row.try_get(0)?),
            RecordColumn::Nc => FieldValue::Nc(row.try_get(0)?),
            RecordColumn::Value => FieldValue::Value(row.try_get(0)?),
            RecordColumn::Deleted => FieldValue::Deleted(row.try_get(0)?),
        })
    }
}

mod postgres {
    use super::*;
    use sqlx::Row;
    use sqlx::postgres::{PgConnection, PgRow};

    pub async fn fetch_rows(
        conn: &mut PgConnection,
        query: &BuiltQuery,
        query_timeout: Duration,
    ) -> DbResult<Vec<PgRow>> {
        let mut q = sqlx::query(&query.sql);
        for date in &query.params {
            q = q.bind(*date);
        }
        let rows_future = q.fetch(conn).take(fetch_limit(query)).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    // `id` is created as `integer` (INT4), which sqlx will not decode as i64
    pub fn to_revision(row: &PgRow, include_full_record: bool) -> DbResult<RecordRevision> {
        Ok(RecordRevision {
            nc: row.try_get(0)?,
            deleted: row.try_get(1)?,
            timestamp: row.try_get(2)?,
            id: i64::from(row.try_get::<i32, _>(3)?),
            payload: if include_full_record {
                row.try_get(4)?
            } else {
                None
            },
        })
    }

    pub fn to_field(row: &PgRow, column: RecordColumn) -> DbResult<FieldValue> {
        Ok(match column {
            RecordColumn::Id => FieldValue::Id(i64::from(row.try_get::<i32, _>(0)?)),
            RecordColumn::Nc => FieldValue::Nc(row.try_get(0)?),
            RecordColumn::Value => FieldValue::Value(row.try_get(0)?),
            RecordColumn::Deleted => FieldValue::Deleted(row.try_get(0)?),
        })
    }
}

mod sqlite {
    use super::*;
    use sqlx::Row;
    use sqlx::sqlite::{SqliteConnection, SqliteRow};

    pub async fn fetch_rows(
        conn: &mut SqliteConnection,
        query: &BuiltQuery,
        query_timeout: Duration,
    ) -> DbResult<Vec<SqliteRow>> {
        let mut q = sqlx::query(&query.sql);
        for date in &query.params {
            q = q.bind(*date);
        }
        let rows_future = q.fetch(conn).take(fetch_limit(query)).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub fn to_revision(row: &SqliteRow, include_full_record: bool) -> DbResult<RecordRevision> {
        Ok(RecordRevision {
            nc: row.try_get(0)?,
            deleted: row.try_get(1)?,
            timestamp: row.try_get(2)?,
            id: row.try_get(3)?,
            payload: if include_full_record {
                row.try_get(4)?
            } else {
                None
            },
        })
    }

    pub fn to_field(row: &SqliteRow, column: RecordColumn) -> DbResult<FieldValue> {
        Ok(match column {
            RecordColumn::Id => FieldValue::Id(row.try_get(0)?),
            RecordColumn::Nc => FieldValue::Nc(row.try_get(0)?),
            RecordColumn::Value => FieldValue::Value(row.try_get(0)?),
            RecordColumn::Deleted => FieldValue::Deleted(row.try_get(0)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_defaults() {
        let reader = RevisionReader::new();
        assert_eq!(
            reader.timeout(),
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS as u64)
        );
    }

    #[test]
    fn test_reader_timeout_capped() {
        let reader = RevisionReader::with_timeout(Duration::from_secs(99_999));
        assert_eq!(
            reader.timeout(),
            Duration::from_secs(MAX_QUERY_TIMEOUT_SECS as u64)
        );
    }

    #[test]
    fn test_fetch_limit() {
        let capped = BuiltQuery::new("select 1".to_string(), Vec::new(), Some(3));
        let uncapped = BuiltQuery::new("select 1".to_string(), Vec::new(), None);
        assert_eq!(fetch_limit(&capped), 3);
        assert_eq!(fetch_limit(&uncapped), usize::MAX);
    }
}
