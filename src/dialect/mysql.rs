//! MySQL / MariaDB dialect.

use super::{DEFAULT_TEXT_TYPE, Dialect};
use crate::models::{DatabaseType, ValueKind};

/// Prefix length used when indexing BLOB/TEXT columns, which MySQL requires.
const BLOB_INDEX_PREFIX: u32 = 255;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn map_type(&self, kind: ValueKind) -> &'static str {
        match kind {
            ValueKind::Date => "date",
            ValueKind::Int32 => "int",
            ValueKind::Int64 => "bigint",
            ValueKind::Binary => "longblob",
            ValueKind::Text | ValueKind::Other => DEFAULT_TEXT_TYPE,
        }
    }

    fn create_table_sql(&self, table: &str, id_type: &str, value_type: &str) -> String {
        format!(
            "CREATE TABLE {table} (id int NOT NULL AUTO_INCREMENT, \
             nc {id_type} NOT NULL, value {value_type}, deleted SMALLINT, PRIMARY KEY(id))"
        )
    }

    fn create_index_sql(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        index_suffix: &str,
    ) -> String {
        let lower = column_type.to_lowercase();
        if lower.contains("blob") || lower.contains("text") {
            format!(
                "CREATE INDEX {table}{index_suffix} ON {table}({column}({BLOB_INDEX_PREFIX}))"
            )
        } else {
            format!("CREATE INDEX {table}{index_suffix} ON {table}({column})")
        }
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
            "ALTER TABLE {new_table} RENAME INDEX {old_table}{index_suffix} TO {new_table}{index_suffix}"
        )]
    }
}
