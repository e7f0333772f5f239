//! Database dispatch macros for reducing code duplication.
//!
//! Most statements the store runs are identical across engines; only the
//! connection type differs. These macros expand one body per `DbConnection`
//! variant at compile time with zero runtime overhead.

/// Run the same expression against whichever connection variant is held.
///
/// The identifier is bound to the inner `&mut PoolConnection<DB>`; use
/// `&mut **c` to get an executor.
///
/// # Example
///
/// ```ignore
/// let affected = with_connection!(conn, c => {
///     sqlx::Executor::execute(&mut **c, sql).await.map(|r| r.rows_affected())
/// })?;
/// ```
#[macro_export]
macro_rules! with_connection {
    ($conn:expr, $c:ident => $body:expr) => {
        match $conn {
            $crate::db::pool::DbConnection::MySql($c) => $body,
            $crate::db::pool::DbConnection::Postgres($c) => $body,
            $crate::db::pool::DbConnection::SQLite($c) => $body,
        }
    };
}

pub use with_connection;
