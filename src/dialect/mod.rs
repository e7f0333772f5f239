//! SQL dialects for the record/timestamp table pair.
//!
//! A [`Dialect`] is the synchronous half of the storage contract: it maps value
//! kinds to column types and produces DDL and query text, but never talks to a
//! database. [`crate::db::DatabaseAccess`] pairs a dialect with a live pool.
//!
//! # Architecture
//!
//! The query builders are default methods shared by every dialect, so identical
//! inputs yield equivalent SQL everywhere. Dialects only override what differs:
//! placeholders, column types, identity columns, probes and renames.
//!
//! Identifiers are interpolated only from [`DataSourceId`] (validated) and
//! [`RecordColumn`] (closed enum). Date bounds are always bound as parameters.

mod derby;
mod mysql;
mod postgres;
mod sqlite;

pub use derby::Derby;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use crate::db::naming::{self, DataSourceId};
use crate::models::{BuiltQuery, DatabaseType, DateRange, RecordColumn, ValueKind};
use chrono::NaiveDate;
use std::sync::Arc;

/// Default column type for unrecognized value kinds.
pub const DEFAULT_TEXT_TYPE: &str = "varchar(255)";

/// Engine-specific SQL generation.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    /// Engine this dialect generates SQL for.
    fn database_type(&self) -> DatabaseType;

    /// Column type for a value kind. Total and stable for a given dialect.
    fn map_type(&self, kind: ValueKind) -> &'static str;

    /// Placeholder for the `index`-th bound parameter (1-based).
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Minimal, side-effect-free read used to probe table existence.
    fn table_probe_sql(&self, table: &str) -> String {
        format!("select * from {table} limit 1")
    }

    /// `CREATE TABLE` with an engine-generated `id`, `nc`, `value` and `deleted`.
    fn create_table_sql(&self, table: &str, id_type: &str, value_type: &str) -> String;

    /// `CREATE INDEX <table><suffix> ON <table>(<column>)`.
    fn create_index_sql(
        &self,
        table: &str,
        column: &str,
        _column_type: &str,
        index_suffix: &str,
    ) -> String {
        format!("CREATE INDEX {table}{index_suffix} ON {table}({column})")
    }

    /// Statements creating a table with its `nc` index and, optionally, its `value` index.
    fn create_record_and_index_tables_sql(
        &self,
        id_type: &str,
        table: &str,
        value_type: &str,
        index_value: bool,
    ) -> Vec<String> {
        let mut statements = vec![
            self.create_table_sql(table, id_type, value_type),
            self.create_index_sql(table, "nc", id_type, naming::NC_INDEX_SUFFIX),
        ];
        if index_value {
            statements.push(self.create_index_sql(
                table,
                "value",
                value_type,
                naming::VALUE_INDEX_SUFFIX,
            ));
        }
        statements
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("drop table {table}")
    }

    /// Statement renaming a table. Returned, not executed.
    fn rename_table_sql(&self, old_table: &str, new_table: &str) -> String;

    /// Statements renaming one index of a table that was already renamed.
    fn rename_index_sql(
        &self,
        new_table: &str,
        old_table: &str,
        column: &str,
        index_suffix: &str,
    ) -> Vec<String>;

    /// Statements renaming the `nc` index and, optionally, the `value` index.
    fn rename_indexes_sql(&self, new_table: &str, old_table: &str, index_value: bool) -> Vec<String> {
        let mut statements =
            self.rename_index_sql(new_table, old_table, "nc", naming::NC_INDEX_SUFFIX);
        if index_value {
            statements.extend(self.rename_index_sql(
                new_table,
                old_table,
                "value",
                naming::VALUE_INDEX_SUFFIX,
            ));
        }
        statements
    }

    /// Incremental read of a data source, paginated by surrogate id.
    ///
    /// Negative or missing offsets become 0. The limit is normalized and
    /// carried in [`BuiltQuery::limit`] but never embedded in the SQL text.
    fn build_incremental_query(
        &self,
        data_source: &DataSourceId,
        range: &DateRange,
        offset: Option<i64>,
        limit: Option<i64>,
        include_full_record: bool,
    ) -> BuiltQuery {
        let record = data_source.record_table();
        let timestamp = data_source.timestamp_table();
        let offset = normalize_offset(offset);

        let mut sql = format!(
            "select {record}.nc, {timestamp}.deleted, {timestamp}.value, {record}.id"
        );
        if include_full_record {
            sql.push_str(&format!(", {record}.value"));
        }
        sql.push_str(&format!(
            " from {record}, {timestamp} where {record}.nc = {timestamp}.nc"
        ));
        let params = append_date_bounds(self, &mut sql, &timestamp, range);
        sql.push_str(&format!(
            " and {record}.id > {offset} order by {record}.id"
        ));

        BuiltQuery::new(sql, params, normalize_limit(limit))
    }

    /// Projection of one record-table column.
    ///
    /// Joins the timestamp table only when a date bound is supplied. No cursor
    /// is applied: this is for field extraction, not incremental sync.
    fn build_field_query(
        &self,
        data_source: &DataSourceId,
        range: &DateRange,
        _offset: Option<i64>,
        limit: Option<i64>,
        field: RecordColumn,
    ) -> BuiltQuery {
        let record = data_source.record_table();
        let timestamp = data_source.timestamp_table();

        let mut sql = format!("select {record}.{field} from {record}");
        let mut params = Vec::new();
        if !range.is_unbounded() {
            sql.push_str(&format!(
                ", {timestamp} where {record}.nc = {timestamp}.nc"
            ));
            params = append_date_bounds(self, &mut sql, &timestamp, range);
        }

        BuiltQuery::new(sql, params, normalize_limit(limit))
    }
}

/// Append inclusive `value >= ?` / `value <= ?` predicates for the supplied bounds.
fn append_date_bounds<D: Dialect + ?Sized>(
    dialect: &D,
    sql: &mut String,
    timestamp_table: &str,
    range: &DateRange,
) -> Vec<NaiveDate> {
    let mut params = Vec::with_capacity(2);
    if let Some(from) = range.from {
        params.push(from);
        let p = dialect.placeholder(params.len());
        sql.push_str(&format!(" and {timestamp_table}.value >= {p}"));
    }
    if let Some(to) = range.to {
        params.push(to);
        let p = dialect.placeholder(params.len());
        sql.push_str(&format!(" and {timestamp_table}.value <= {p}"));
    }
    params
}

fn normalize_offset(offset: Option<i64>) -> i64 {
    offset.filter(|o| *o > 0).unwrap_or(0)
}

fn normalize_limit(limit: Option<i64>) -> Option<u32> {
    limit
        .filter(|l| *l > 0)
        .map(|l| u32::try_from(l).unwrap_or(u32::MAX))
}

/// Select the dialect for an engine.
pub fn for_database_type(db_type: DatabaseType) -> Arc<dyn Dialect> {
    match db_type {
        DatabaseType::Derby => Arc::new(Derby),
        DatabaseType::MySQL => Arc::new(MySql),
        DatabaseType::PostgreSQL => Arc::new(Postgres),
        DatabaseType::SQLite => Arc::new(Sqlite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> DataSourceId {
        DataSourceId::new("abc").unwrap()
    }

    fn year_2020() -> DateRange {
        DateRange::parse(Some("2020-01-01"), Some("2020-12-31")).unwrap()
    }

    #[test]
    fn test_incremental_query_reference_shape() {
        let q = Derby.build_incremental_query(&abc(), &year_2020(), Some(10), None, false);
        assert_eq!(
            q.sql,
            "select repox_abc_record.nc, repox_abc_timestamp.deleted, repox_abc_timestamp.value, \
             repox_abc_record.id from repox_abc_record, repox_abc_timestamp \
             where repox_abc_record.nc = repox_abc_timestamp.nc \
             and repox_abc_timestamp.value >= ? and repox_abc_timestamp.value <= ? \
             and repox_abc_record.id > 10 order by repox_abc_record.id"
        );
        assert_eq!(
            q.params,
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 12, 31).unwrap()
            ]
        );
        assert_eq!(q.limit, None);
    }

    #[test]
    fn test_incremental_query_full_record_adds_payload() {
        let q = Derby.build_incremental_query(&abc(), &DateRange::unbounded(), None, None, true);
        assert!(q.sql.starts_with(
            "select repox_abc_record.nc, repox_abc_timestamp.deleted, repox_abc_timestamp.value, \
             repox_abc_record.id, repox_abc_record.value from"
        ));
    }

    #[test]
    fn test_offset_normalization() {
        let range = DateRange::unbounded();
        let zero = Derby.build_incremental_query(&abc(), &range, Some(0), None, false);
        let none = Derby.build_incremental_query(&abc(), &range, None, None, false);
        let negative = Derby.build_incremental_query(&abc(), &range, Some(-5), None, false);
        assert_eq!(zero, none);
        assert_eq!(zero, negative);
        assert!(zero.sql.contains("repox_abc_record.id > 0 "));
    }

    #[test]
    fn test_unbounded_range_omits_date_predicates() {
        let q = Derby.build_incremental_query(&abc(), &DateRange::unbounded(), None, None, false);
        assert!(!q.sql.contains(">="));
        assert!(!q.sql.contains("<="));
        assert!(q.params.is_empty());
    }

    #[test]
    fn test_single_bound_emits_exactly_one_predicate() {
        let from_only = DateRange::parse(Some("2020-01-01"), None).unwrap();
        let q = Derby.build_incremental_query(&abc(), &from_only, None, None, false);
        assert!(q.sql.contains("repox_abc_timestamp.value >= ?"));
        assert!(!q.sql.contains("<="));
        assert_eq!(q.params.len(), 1);

        let to_only = DateRange::parse(None, Some("2020-12-31")).unwrap();
        let q = Derby.build_incremental_query(&abc(), &to_only, None, None, false);
        assert!(q.sql.contains("repox_abc_timestamp.value <= ?"));
        assert!(!q.sql.contains(">="));
        assert_eq!(q.params, vec![NaiveDate::from_ymd_opt(2020, 12, 31).unwrap()]);
    }

    #[test]
    fn test_limit_is_carried_not_embedded() {
        let range = DateRange::unbounded();
        let q = Derby.build_incremental_query(&abc(), &range, None, Some(50), false);
        assert_eq!(q.limit, Some(50));
        assert!(!q.sql.to_lowercase().contains("limit"));
        assert!(!q.sql.to_lowercase().contains("fetch"));

        for limit in [None, Some(0), Some(-3)] {
            let q = Derby.build_incremental_query(&abc(), &range, None, limit, false);
            assert_eq!(q.limit, None);
        }
    }

    #[test]
    fn test_field_query_without_dates_reads_record_table_only() {
        let q = Derby.build_field_query(&abc(), &DateRange::unbounded(), Some(5), None, RecordColumn::Nc);
        assert_eq!(q.sql, "select repox_abc_record.nc from repox_abc_record");
        assert!(q.params.is_empty());
    }

    #[test]
    fn test_field_query_with_date_joins_timestamp_table() {
        let range = DateRange::parse(None, Some("2020-12-31")).unwrap();
        let q = Derby.build_field_query(&abc(), &range, Some(5), None, RecordColumn::Value);
        assert_eq!(
            q.sql,
            "select repox_abc_record.value from repox_abc_record, repox_abc_timestamp \
             where repox_abc_record.nc = repox_abc_timestamp.nc \
             and repox_abc_timestamp.value <= ?"
        );
        assert!(!q.sql.contains("id >"));
        assert_eq!(q.params.len(), 1);
    }

    #[test]
    fn test_create_statements_include_value_index_only_when_requested() {
        let with = Derby.create_record_and_index_tables_sql("varchar(255)", "t", "date", true);
        let without = Derby.create_record_and_index_tables_sql("varchar(255)", "t", "date", false);
        assert_eq!(with.len(), 3);
        assert_eq!(without.len(), 2);
        assert_eq!(with[1], "CREATE INDEX t_i_nc ON t(nc)");
        assert_eq!(with[2], "CREATE INDEX t_i_val ON t(value)");
    }

    #[test]
    fn test_every_dialect_builds_equivalent_queries() {
        let range = year_2020();
        for db_type in [
            DatabaseType::Derby,
            DatabaseType::MySQL,
            DatabaseType::PostgreSQL,
            DatabaseType::SQLite,
        ] {
            let dialect = for_database_type(db_type);
            assert_eq!(dialect.database_type(), db_type);
            let q = dialect.build_incremental_query(&abc(), &range, Some(10), Some(20), false);
            assert_eq!(q.params.len(), 2);
            assert_eq!(q.limit, Some(20));
            assert!(q.sql.ends_with("and repox_abc_record.id > 10 order by repox_abc_record.id"));
        }
    }

    #[test]
    fn test_map_type_is_total_and_stable() {
        for db_type in [
            DatabaseType::Derby,
            DatabaseType::MySQL,
            DatabaseType::PostgreSQL,
            DatabaseType::SQLite,
        ] {
            let dialect = for_database_type(db_type);
            for kind in ValueKind::ALL {
                assert_eq!(dialect.map_type(kind), dialect.map_type(kind));
                assert!(!dialect.map_type(kind).is_empty());
            }
            assert_eq!(dialect.map_type(ValueKind::Other), DEFAULT_TEXT_TYPE);
            assert_eq!(dialect.map_type(ValueKind::Text), DEFAULT_TEXT_TYPE);
        }
    }
}
