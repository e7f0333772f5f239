//! Integration tests for table lifecycle on a file-backed SQLite store.
//!
//! Tests verify that:
//! - The existence probe reports false for missing tables and true after creation
//! - Renames move both the table and its indexes to the new name
//! - Dropping a missing table is an error while probing one is not
//! - Data source provision, rename and removal act on both tables

use repox_store::db::{DataSourceId, DataSourceTables, DatabaseAccess, DbConnection};
use repox_store::error::DbError;
use repox_store::models::ValueKind;
use repox_store::StoreConfig;
use tempfile::TempDir;

/// Open a store in a fresh temporary directory.
async fn setup_store() -> (TempDir, DatabaseAccess) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("repox.db");
    let config = StoreConfig::new("sqlite:", path.to_str().unwrap()).with_create(true);
    let access = DatabaseAccess::connect(&config).await.unwrap();
    (dir, access)
}

async fn index_names(conn: &mut DbConnection, table: &str) -> Vec<String> {
    let DbConnection::SQLite(c) = conn else {
        panic!("expected a SQLite connection");
    };
    sqlx::query_scalar::<_, String>(
        "select name from sqlite_master where type = 'index' and tbl_name = ? order by name",
    )
    .bind(table)
    .fetch_all(&mut **c)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_create_probe_and_drop() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();
    let table = "repox_lib_record";

    assert!(!access.table_exists(&mut conn, table).await);

    access
        .create_record_and_index_tables(
            &mut conn,
            access.map_type(ValueKind::Text),
            table,
            access.map_type(ValueKind::Binary),
            false,
        )
        .await
        .unwrap();

    // An empty table still exists
    assert!(access.table_exists(&mut conn, table).await);
    assert_eq!(index_names(&mut conn, table).await, vec!["repox_lib_record_i_nc"]);

    access.drop_table(&mut conn, table).await.unwrap();
    assert!(!access.table_exists(&mut conn, table).await);
}

#[tokio::test]
async fn test_create_with_value_index() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();
    let table = "repox_lib_timestamp";

    access
        .create_record_and_index_tables(
            &mut conn,
            access.map_type(ValueKind::Text),
            table,
            access.map_type(ValueKind::Date),
            true,
        )
        .await
        .unwrap();

    assert_eq!(
        index_names(&mut conn, table).await,
        vec!["repox_lib_timestamp_i_nc", "repox_lib_timestamp_i_val"]
    );
}

#[tokio::test]
async fn test_create_existing_table_fails() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();
    let text = access.map_type(ValueKind::Text);
    let blob = access.map_type(ValueKind::Binary);

    access
        .create_record_and_index_tables(&mut conn, text, "t1", blob, false)
        .await
        .unwrap();
    let err = access
        .create_record_and_index_tables(&mut conn, text, "t1", blob, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Schema { ref object, .. } if object == "t1"));
}

#[tokio::test]
async fn test_drop_missing_table_fails() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    let err = access.drop_table(&mut conn, "never_created").await.unwrap_err();
    assert!(matches!(err, DbError::Schema { .. }));
}

#[tokio::test]
async fn test_rename_table_and_indexes() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    access
        .create_record_and_index_tables(
            &mut conn,
            access.map_type(ValueKind::Text),
            "t1",
            access.map_type(ValueKind::Date),
            true,
        )
        .await
        .unwrap();

    access.rename_table(&mut conn, "t1", "t2").await.unwrap();
    assert!(!access.table_exists(&mut conn, "t1").await);
    assert!(access.table_exists(&mut conn, "t2").await);
    // Indexes follow the table but keep their names until renamed
    assert_eq!(index_names(&mut conn, "t2").await, vec!["t1_i_nc", "t1_i_val"]);

    access.rename_indexes(&mut conn, "t2", "t1", true).await.unwrap();
    assert_eq!(index_names(&mut conn, "t2").await, vec!["t2_i_nc", "t2_i_val"]);
}

#[tokio::test]
async fn test_rename_round_trip() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    access
        .create_record_and_index_tables(
            &mut conn,
            access.map_type(ValueKind::Text),
            "t1",
            access.map_type(ValueKind::Binary),
            false,
        )
        .await
        .unwrap();

    access.rename_table(&mut conn, "t1", "t2").await.unwrap();
    access.rename_indexes(&mut conn, "t2", "t1", false).await.unwrap();
    access.rename_table(&mut conn, "t2", "t1").await.unwrap();
    access.rename_indexes(&mut conn, "t1", "t2", false).await.unwrap();

    assert!(access.table_exists(&mut conn, "t1").await);
    assert!(!access.table_exists(&mut conn, "t2").await);
    assert_eq!(index_names(&mut conn, "t1").await, vec!["t1_i_nc"]);
}

#[tokio::test]
async fn test_rename_missing_table_fails() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    assert_eq!(access.rename_table_sql("a", "b"), "ALTER TABLE a RENAME TO b");
    let err = access.rename_table(&mut conn, "a", "b").await.unwrap_err();
    assert!(matches!(err, DbError::Schema { .. }));
}

#[tokio::test]
async fn test_identifiers_rejected_before_execution() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    let err = access
        .drop_table(&mut conn, "t1; drop table t2")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_data_source_lifecycle() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    let tables = DataSourceTables::new("BibNat").unwrap();
    assert!(!tables.exists(&access, &mut conn).await);

    tables.provision(&access, &mut conn).await.unwrap();
    assert!(tables.exists(&access, &mut conn).await);
    assert_eq!(tables.revision_count(&mut conn).await.unwrap(), 0);

    // Provisioning again leaves the existing tables alone
    tables.provision(&access, &mut conn).await.unwrap();

    let renamed = tables
        .rename(&access, &mut conn, &DataSourceId::new("Gallica").unwrap())
        .await
        .unwrap();
    assert!(!tables.exists(&access, &mut conn).await);
    assert!(renamed.exists(&access, &mut conn).await);
    assert_eq!(
        index_names(&mut conn, "repox_gallica_record").await,
        vec!["repox_gallica_record_i_nc"]
    );
    assert_eq!(
        index_names(&mut conn, "repox_gallica_timestamp").await,
        vec!["repox_gallica_timestamp_i_nc", "repox_gallica_timestamp_i_val"]
    );

    renamed.remove(&access, &mut conn).await.unwrap();
    assert!(!renamed.exists(&access, &mut conn).await);
}

#[tokio::test]
async fn test_rename_to_existing_data_source_fails() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    let first = DataSourceTables::new("first").unwrap();
    let second = DataSourceTables::new("second").unwrap();
    first.provision(&access, &mut conn).await.unwrap();
    second.provision(&access, &mut conn).await.unwrap();

    let err = first
        .rename(&access, &mut conn, second.id())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Schema { .. }));
    assert!(first.exists(&access, &mut conn).await);
}

#[tokio::test]
async fn test_rename_half_provisioned_data_source_changes_nothing() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    let half = DataSourceTables::new("half").unwrap();
    access
        .create_record_and_index_tables(
            &mut conn,
            access.map_type(ValueKind::Text),
            half.record_table(),
            access.map_type(ValueKind::Binary),
            false,
        )
        .await
        .unwrap();

    let err = half
        .rename(&access, &mut conn, &DataSourceId::new("other").unwrap())
        .await
        .unwrap_err();
    assert!(
        matches!(err, DbError::Schema { ref object, .. } if object == "repox_half_timestamp")
    );

    // The record table was left where it was
    assert!(access.table_exists(&mut conn, "repox_half_record").await);
    assert!(!access.table_exists(&mut conn, "repox_other_record").await);
    assert_eq!(
        index_names(&mut conn, "repox_half_record").await,
        vec!["repox_half_record_i_nc"]
    );
}

#[tokio::test]
async fn test_rename_case_only_is_noop() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    let tables = DataSourceTables::new("bibnat").unwrap();
    tables.provision(&access, &mut conn).await.unwrap();

    let renamed = tables
        .rename(&access, &mut conn, &DataSourceId::new("BIBNAT").unwrap())
        .await
        .unwrap();
    assert_eq!(renamed.record_table(), tables.record_table());
    assert!(renamed.exists(&access, &mut conn).await);
}

#[tokio::test]
async fn test_remove_missing_data_source_fails() {
    let (_dir, access) = setup_store().await;
    let mut conn = access.open_connection().await.unwrap();

    let tables = DataSourceTables::new("ghost").unwrap();
    assert!(tables.remove(&access, &mut conn).await.is_err());
}

#[tokio::test]
async fn test_missing_file_without_create_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.db");
    let config = StoreConfig::new("sqlite:", path.to_str().unwrap());

    let err = DatabaseAccess::connect(&config).await.unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));
    assert!(!path.exists());
}
