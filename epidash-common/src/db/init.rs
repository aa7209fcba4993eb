//! Database initialization
//!
//! The store is named by a sqlx connection string resolved from
//! configuration. The pipeline creates the database on first run.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::info;

/// Initialize the store connection pool, creating the database if needed
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Create the parent directory for file-backed databases
    if let Some(path) = database_path(database_url) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    // WAL keeps the previous table generation readable while a replace
    // transaction is in flight
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    info!("Connected to store: {}", database_url);

    Ok(pool)
}

/// Extract the filesystem path from a sqlite connection string
fn database_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
