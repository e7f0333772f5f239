//! Raw statement execution helpers.
//!
//! Statements here carry no bound parameters, so they run through the engines'
//! simple-query path (some DDL such as `RENAME TABLE` cannot be prepared on MySQL).

use crate::db::pool::DbConnection;
use crate::error::DbResult;
use sqlx::Executor;
use tracing::debug;

/// Execute a statement and return the number of affected rows.
pub async fn run_update(conn: &mut DbConnection, sql: &str) -> DbResult<u64> {
    debug!(sql = %sql, "Executing statement");
    let affected = with_connection!(conn, c => {
        (&mut **c).execute(sql).await.map(|r| r.rows_affected())
    })?;
    Ok(affected)
}

/// Execute statements in order, stopping at the first failure.
pub async fn run_updates(conn: &mut DbConnection, statements: &[String]) -> DbResult<()> {
    for sql in statements {
        run_update(conn, sql).await?;
    }
    Ok(())
}

/// Run a query and report whether it returned a row.
pub async fn has_row(conn: &mut DbConnection, sql: &str) -> DbResult<bool> {
    debug!(sql = %sql, "Executing query");
    let found = with_connection!(conn, c => {
        (&mut **c).fetch_optional(sql).await.map(|row| row.is_some())
    })?;
    Ok(found)
}

/// Run a query returning a single integer, such as `select count(*) ...`.
pub async fn single_i64(conn: &mut DbConnection, sql: &str) -> DbResult<Option<i64>> {
    debug!(sql = %sql, "Executing scalar query");
    let value = with_connection!(conn, c => {
        sqlx::query_scalar::<_, i64>(sql).fetch_optional(&mut **c).await
    })?;
    Ok(value)
}
