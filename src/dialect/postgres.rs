//! PostgreSQL dialect.

use super::{DEFAULT_TEXT_TYPE, Dialect};
use crate::models::{DatabaseType, ValueKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn map_type(&self, kind: ValueKind) -> &'static str {
        match kind {
            ValueKind::Date => "date",
            ValueKind::Int32 => "integer",
            ValueKind::Int64 => "bigint",
            ValueKind::Binary => "bytea",
            ValueKind::Text | ValueKind::Other => DEFAULT_TEXT_TYPE,
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn create_table_sql(&self, table: &str, id_type: &str, value_type: &str) -> String {
        format!(
            "CREATE TABLE {table} (id integer NOT NULL GENERATED BY DEFAULT AS IDENTITY, \
             nc {id_type} NOT NULL, value {value_type}, deleted SMALLINT, PRIMARY KEY(id))"
        )
    }

    fn rename_table_sql(&self, old_table: &str, new_table: &str) -> String {
        format!("ALTER TABLE {old_table} RENAME TO {new_table}")
    }

    fn rename_index_sql(
        &self,
        new_table: &str,
        old_table: &str,
        _column: &str,
        index_suffix: &str,
    ) -> Vec<String> {
        vec![format!(
            "ALTER INDEX {old_table}{index_suffix} RENAME TO {new_table}{index_suffix}"
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::naming::DataSourceId;
    use crate::models::DateRange;

    #[test]
    fn test_map_type() {
        assert_eq!(Postgres.map_type(ValueKind::Binary), "bytea");
        assert_eq!(Postgres.map_type(ValueKind::Int32), "integer");
        assert_eq!(Postgres.map_type(ValueKind::Date), "date");
    }

    #[test]
    fn test_numbered_placeholders() {
        let id = DataSourceId::new("abc").unwrap();
        let range = DateRange::parse(Some("2020-01-01"), Some("2020-12-31")).unwrap();
        let q = Postgres.build_incremental_query(&id, &range, None, None, false);
        assert!(q.sql.contains("repox_abc_timestamp.value >= $1"));
        assert!(q.sql.contains("repox_abc_timestamp.value <= $2"));

        let to_only = DateRange::parse(None, Some("2020-12-31")).unwrap();
        let q = Postgres.build_incremental_query(&id, &to_only, None, None, false);
        assert!(q.sql.contains("repox_abc_timestamp.value <= $1"));
    }

    #[test]
    fn test_rename() {
        assert_eq!(Postgres.rename_table_sql("a", "b"), "ALTER TABLE a RENAME TO b");
        assert_eq!(
            Postgres.rename_indexes_sql("b", "a", false),
            vec!["ALTER INDEX a_i_nc RENAME TO b_i_nc"]
        );
    }
}
