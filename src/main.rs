//! repox-store - Main entry point.
//!
//! Command line access to the record/timestamp tables of repox data sources:
//! provisioning, renaming and dropping them, and reading revisions back.

use repox_store::config::{Command, Config, RangeArgs, StoreCommand};
use repox_store::db::{DataSourceId, DataSourceTables, DatabaseAccess};
use repox_store::dialect::{self, Dialect};
use repox_store::error::DbResult;
use repox_store::models::{BuiltQuery, DateRange, RecordColumn};
use serde::Serialize;
use std::io::Write;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so JSON lines on stdout stay machine-readable.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();
    init_tracing(&config);

    info!("Starting repox-store v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&config).await {
        error!(error = %e, "Command failed");
        if let Some(suggestion) = e.suggestion() {
            eprintln!("Suggestion: {suggestion}");
        }
        return Err(e.into());
    }
    Ok(())
}

async fn run(config: &Config) -> DbResult<()> {
    let store_config = config.store_config();

    match &config.command {
        // Printing SQL needs no connection, so it also works for Derby
        Command::Sql {
            data_source,
            range,
            full,
            field,
        } => {
            let dialect = dialect::for_database_type(store_config.database_type()?);
            print_sql(dialect.as_ref(), data_source, range, *full, *field)
        }
        Command::Store(command) => {
            let access = DatabaseAccess::connect(&store_config).await?;
            let result = execute(&access, command).await;
            access.close().await;
            result
        }
    }
}

async fn execute(access: &DatabaseAccess, command: &StoreCommand) -> DbResult<()> {
    let mut conn = access.open_connection().await?;

    match command {
        StoreCommand::Provision { data_source } => {
            let tables = DataSourceTables::new(data_source.as_str())?;
            tables.provision(access, &mut conn).await?;
            print_json_line(&serde_json::json!({
                "data_source": data_source,
                "record_table": tables.record_table(),
                "timestamp_table": tables.timestamp_table(),
            }))
        }
        StoreCommand::Exists { data_source } => {
            let tables = DataSourceTables::new(data_source.as_str())?;
            let exists = tables.exists(access, &mut conn).await;
            let revisions = if exists {
                Some(tables.revision_count(&mut conn).await?)
            } else {
                None
            };
            print_json_line(&serde_json::json!({
                "data_source": data_source,
                "exists": exists,
                "revisions": revisions,
            }))
        }
        StoreCommand::Rename { old, new } => {
            let tables = DataSourceTables::new(old.as_str())?;
            let new_id = DataSourceId::new(new.as_str())?;
            let renamed = tables.rename(access, &mut conn, &new_id).await?;
            print_json_line(&serde_json::json!({
                "data_source": new,
                "record_table": renamed.record_table(),
                "timestamp_table": renamed.timestamp_table(),
            }))
        }
        StoreCommand::Drop { data_source } => {
            let tables = DataSourceTables::new(data_source.as_str())?;
            tables.remove(access, &mut conn).await?;
            print_json_line(&serde_json::json!({ "data_source": data_source, "dropped": true }))
        }
        StoreCommand::Revisions {
            data_source,
            range,
            full,
        } => {
            let id = DataSourceId::new(data_source.as_str())?;
            let query = access.build_incremental_query(
                &id,
                &parse_range(range)?,
                range.offset,
                range.limit,
                *full,
            );
            log_query(&query);
            for revision in access.fetch_revisions(&mut conn, &query, *full).await? {
                print_json_line(&revision)?;
            }
            Ok(())
        }
        StoreCommand::Field {
            data_source,
            column,
            range,
        } => {
            let id = DataSourceId::new(data_source.as_str())?;
            let query = access.build_field_query(
                &id,
                &parse_range(range)?,
                range.offset,
                range.limit,
                *column,
            );
            log_query(&query);
            for value in access.fetch_field(&mut conn, &query, *column).await? {
                print_json_line(&value)?;
            }
            Ok(())
        }
    }
}

fn print_sql(
    dialect: &dyn Dialect,
    data_source: &str,
    range: &RangeArgs,
    full: bool,
    field: Option<RecordColumn>,
) -> DbResult<()> {
    let id = DataSourceId::new(data_source)?;
    let dates = parse_range(range)?;
    let query = match field {
        Some(column) => dialect.build_field_query(&id, &dates, range.offset, range.limit, column),
        None => dialect.build_incremental_query(&id, &dates, range.offset, range.limit, full),
    };
    print_json_line(&query)
}

fn parse_range(range: &RangeArgs) -> DbResult<DateRange> {
    DateRange::parse(range.from.as_deref(), range.to.as_deref())
}

fn log_query(query: &BuiltQuery) {
    info!(sql = %query.sql, params = ?query.params, limit = ?query.limit, "Running query");
}

fn print_json_line<T: Serialize>(value: &T) -> DbResult<()> {
    let line = serde_json::to_string(value)
        .map_err(|e| repox_store::DbError::internal(format!("Failed to serialize output: {e}")))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")
        .map_err(|e| repox_store::DbError::internal(format!("Failed to write output: {e}")))
}
