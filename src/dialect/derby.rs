//! Apache Derby dialect.

use super::{DEFAULT_TEXT_TYPE, Dialect};
use crate::models::{DatabaseType, ValueKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct Derby;

impl Dialect for Derby {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Derby
    }

    fn map_type(&self, kind: ValueKind) -> &'static str {
        match kind {
            ValueKind::Date => "date",
            ValueKind::Int32 => "int",
            ValueKind::Int64 => "bigint",
            ValueKind::Binary => "blob(16M)",
            ValueKind::Text | ValueKind::Other => DEFAULT_TEXT_TYPE,
        }
    }

    // Derby has no LIMIT clause
    fn table_probe_sql(&self, table: &str) -> String {
        format!("select * from {table} fetch first 1 rows only")
    }

    fn create_table_sql(&self, table: &str, id_type: &str, value_type: &str) -> String {
        format!(
            "CREATE TABLE {table} (id int NOT NULL GENERATED BY DEFAULT AS IDENTITY, \
             nc {id_type} NOT NULL, value {value_type}, deleted SMALLINT, PRIMARY KEY(id))"
        )
    }

    fn rename_table_sql(&self, old_table: &str, new_table: &str) -> String {
        format!("RENAME TABLE {old_table} TO {new_table}")
    }

    fn rename_index_sql(
        &self,
        new_table: &str,
        old_table: &str,
        _column: &str,
        index_suffix: &str,
    ) -> Vec<String> {
        vec![format!(
            "RENAME INDEX {old_table}{index_suffix} TO {new_table}{index_suffix}"
        )]
    }
}
