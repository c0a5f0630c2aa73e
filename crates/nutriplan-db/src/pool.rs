//! Connection pools, embedded migrations and database bootstrap.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/nutriplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables created by the migrations. Weeks, continuation state and summary
/// are written together per batch; profiles are written on their own.
pub const TABLES: [&str; 4] = [
    "profiles",
    "week_plans",
    "continuation_states",
    "cumulative_summaries",
];

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// A CLI command holds at most one batch transaction plus a read.
const MAX_CONNECTIONS: u32 = 5;

/// Open a pool of at most `max_connections` against `url`.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Create the pool used by the store.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(&config.database_url, MAX_CONNECTIONS).await
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}

/// `name` as a quoted identifier. `CREATE DATABASE` takes no bind parameters.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create database `name` over a maintenance connection.
pub async fn create_database(maintenance: &PgPool, name: &str) -> Result<()> {
    let stmt = format!("CREATE DATABASE {}", quote_ident(name));
    maintenance
        .execute(stmt.as_str())
        .await
        .with_context(|| format!("failed to create database {name}"))?;
    info!(db = name, "database created");
    Ok(())
}

/// Disconnect every other session on `name` and drop it. A missing database
/// is not an error.
pub async fn drop_database(maintenance: &PgPool, name: &str) -> Result<()> {
    sqlx::query(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(name)
    .execute(maintenance)
    .await
    .with_context(|| format!("failed to disconnect sessions on {name}"))?;

    let stmt = format!("DROP DATABASE IF EXISTS {}", quote_ident(name));
    maintenance
        .execute(stmt.as_str())
        .await
        .with_context(|| format!("failed to drop database {name}"))?;
    debug!(db = name, "database dropped");
    Ok(())
}

/// Create the configured database unless it already exists.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let db_name = config
        .database_name()
        .context("could not determine database name from URL")?;
    let maintenance = connect(&config.maintenance_url(), 1).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maintenance)
            .await
            .context("failed to query pg_database")?;

    let result = if exists {
        info!(db = db_name, "database already exists");
        Ok(())
    } else {
        create_database(&maintenance, db_name).await
    };
    maintenance.close().await;
    result
}

/// Row count of each table in [`TABLES`], in that order.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let query = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("nutriplan"), "\"nutriplan\"");
        assert_eq!(quote_ident("plans-dev"), "\"plans-dev\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}
