//! Tests for store initialization and replace-write semantics

use chrono::NaiveDate;
use epidash_common::db::models::{Metric, Observation};
use epidash_common::db::{init_pool, replace_table};
use tempfile::TempDir;

const CREATE: &str = "CREATE TABLE obs (
    region TEXT NOT NULL,
    province TEXT NOT NULL,
    lat REAL NOT NULL,
    long REAL NOT NULL,
    date TEXT NOT NULL,
    cases INTEGER NOT NULL
)";
const INSERT: &str =
    "INSERT INTO obs (region, province, lat, long, date, cases) VALUES (?, ?, ?, ?, ?, ?)";

fn obs(region: &str, day: u32, value: i64) -> Observation {
    Observation {
        region: region.to_string(),
        province: "N/A".to_string(),
        lat: 0.0,
        long: 0.0,
        date: NaiveDate::from_ymd_opt(2021, 3, day).unwrap(),
        metric: Metric::Cases,
        value,
    }
}

#[tokio::test]
async fn database_created_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("epidash.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = init_pool(&url).await.unwrap();
    assert!(db_path.exists(), "Database file was not created");
    drop(pool);
}

#[tokio::test]
async fn replace_write_discards_previous_generation() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("epidash.db").display()
    );
    let pool = init_pool(&url).await.unwrap();

    let first = vec![obs("Italy", 1, 10), obs("Italy", 2, 20), obs("Spain", 1, 5)];
    let written = replace_table(&pool, "obs", CREATE, INSERT, &[], &first)
        .await
        .unwrap();
    assert_eq!(written, 3);

    // Second generation fully replaces the first, never merges into it
    let second = vec![obs("Italy", 3, 150)];
    replace_table(&pool, "obs", CREATE, INSERT, &[], &second)
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM obs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let value: i64 = sqlx::query_scalar("SELECT cases FROM obs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(value, 150);
}

#[tokio::test]
async fn replace_write_accepts_empty_generation() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("epidash.db").display()
    );
    let pool = init_pool(&url).await.unwrap();

    // An empty source payload still swaps in an empty table
    let rows: Vec<Observation> = Vec::new();
    let written = replace_table(&pool, "obs", CREATE, INSERT, &[], &rows)
        .await
        .unwrap();
    assert_eq!(written, 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM obs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn index_statements_applied_after_fill() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("epidash.db").display()
    );
    let pool = init_pool(&url).await.unwrap();

    let rows = vec![obs("Italy", 1, 10)];
    replace_table(
        &pool,
        "obs",
        CREATE,
        INSERT,
        &["CREATE INDEX idx_obs_date ON obs (date)"],
        &rows,
    )
    .await
    .unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_obs_date'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}
