//! SQLite dialect.
//!
//! SQLite cannot rename an index, so index renames drop the old index and
//! recreate it on the renamed table.

use super::{DEFAULT_TEXT_TYPE, Dialect};
use crate::models::{DatabaseType, ValueKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn map_type(&self, kind: ValueKind) -> &'static str {
        match kind {
            ValueKind::Date => "date",
            ValueKind::Int32 => "integer",
            ValueKind::Int64 => "bigint",
            ValueKind::Binary => "blob",
            ValueKind::Text | ValueKind::Other => DEFAULT_TEXT_TYPE,
        }
    }

    // AUTOINCREMENT keeps ids from being reused after deletes
    fn create_table_sql(&self, table: &str, id_type: &str, value_type: &str) -> String {
        format!(
            "CREATE TABLE {table} (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             nc {id_type} NOT NULL, value {value_type}, deleted SMALLINT)"
        )
    }

    fn rename_table_sql(&self, old_table: &str, new_table: &str) -> String {
        format!("ALTER TABLE {old_table} RENAME TO {new_table}")
    }

    fn rename_index_sql(
        &self,
        new_table: &str,
        old_table: &str,
        column: &str,
        index_suffix: &str,
    ) -> Vec<String> {
        vec![
            format!("DROP INDEX {old_table}{index_suffix}"),
            format!("CREATE INDEX {new_table}{index_suffix} ON {new_table}({column})"),
        ]
    }
}
