//! Store access for normalized datasets
//!
//! One relational table per normalized dataset, keyed loosely by the
//! canonical (region, province, date) tuple and rewritten wholesale on
//! every run. The view builder reads these tables back; nothing else in
//! the pipeline queries them.

use sqlx::{Row, SqlitePool};

use crate::EtlResult;
use epidash_common::db::models::{
    LookupRecord, Metric, Observation, UkLocalRecord, VaccinationObservation,
};
use epidash_common::db::replace_table;

pub const JHU_GLOBAL_CASES: &str = "jhu_global_cases";
pub const JHU_GLOBAL_DEATHS: &str = "jhu_global_deaths";
pub const JHU_US_CASES: &str = "jhu_us_cases";
pub const JHU_US_DEATHS: &str = "jhu_us_deaths";
pub const JHU_LOOKUP: &str = "jhu_lookup";
pub const UK_LOCAL_CASES: &str = "uk_local_cases";
pub const OWID_VACCINATIONS: &str = "owid_vaccinations";

/// Persist a normalized observation table.
///
/// The value column carries the metric's canonical name, so the table
/// schema documents which series it holds.
pub async fn persist_observations(
    pool: &SqlitePool,
    table: &str,
    metric: Metric,
    rows: &[Observation],
) -> EtlResult<u64> {
    let create_sql = format!(
        "CREATE TABLE {table} (
            region TEXT NOT NULL,
            province TEXT NOT NULL,
            lat REAL NOT NULL,
            long REAL NOT NULL,
            date TEXT NOT NULL,
            {metric} INTEGER NOT NULL
        )",
        table = table,
        metric = metric.as_str(),
    );
    let insert_sql = format!(
        "INSERT INTO {table} (region, province, lat, long, date, {metric})
         VALUES (?, ?, ?, ?, ?, ?)",
        table = table,
        metric = metric.as_str(),
    );

    Ok(replace_table(pool, table, &create_sql, &insert_sql, &[], rows).await?)
}

/// Read a normalized observation table back, ordered by the canonical key
pub async fn read_observations(
    pool: &SqlitePool,
    table: &str,
    metric: Metric,
) -> EtlResult<Vec<Observation>> {
    let select_sql = format!(
        "SELECT region, province, lat, long, date, {metric}
         FROM {table}
         ORDER BY region, province, date",
        table = table,
        metric = metric.as_str(),
    );

    let rows = sqlx::query(&select_sql).fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| Observation {
            region: row.get("region"),
            province: row.get("province"),
            lat: row.get("lat"),
            long: row.get("long"),
            date: row.get("date"),
            metric,
            value: row.get(metric.as_str()),
        })
        .collect())
}

pub async fn persist_lookup(pool: &SqlitePool, rows: &[LookupRecord]) -> EtlResult<u64> {
    let create_sql = format!(
        "CREATE TABLE {} (
            iso2 TEXT NOT NULL,
            iso3 TEXT NOT NULL,
            region TEXT NOT NULL,
            province TEXT NOT NULL,
            population INTEGER
        )",
        JHU_LOOKUP
    );
    let insert_sql = format!(
        "INSERT INTO {} (iso2, iso3, region, province, population) VALUES (?, ?, ?, ?, ?)",
        JHU_LOOKUP
    );

    Ok(replace_table(pool, JHU_LOOKUP, &create_sql, &insert_sql, &[], rows).await?)
}

pub async fn read_lookup(pool: &SqlitePool) -> EtlResult<Vec<LookupRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT iso2, iso3, region, province, population FROM {} ORDER BY region, province",
        JHU_LOOKUP
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| LookupRecord {
            iso2: row.get("iso2"),
            iso3: row.get("iso3"),
            region: row.get("region"),
            province: row.get("province"),
            population: row.get("population"),
        })
        .collect())
}

pub async fn persist_uk_local(pool: &SqlitePool, rows: &[UkLocalRecord]) -> EtlResult<u64> {
    let create_sql = format!(
        "CREATE TABLE {} (
            area_code TEXT NOT NULL,
            area_name TEXT NOT NULL,
            date TEXT NOT NULL,
            new_cases INTEGER NOT NULL
        )",
        UK_LOCAL_CASES
    );
    let insert_sql = format!(
        "INSERT INTO {} (area_code, area_name, date, new_cases) VALUES (?, ?, ?, ?)",
        UK_LOCAL_CASES
    );

    Ok(replace_table(pool, UK_LOCAL_CASES, &create_sql, &insert_sql, &[], rows).await?)
}

pub async fn read_uk_local(pool: &SqlitePool) -> EtlResult<Vec<UkLocalRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT area_code, area_name, date, new_cases FROM {} ORDER BY area_code, date",
        UK_LOCAL_CASES
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| UkLocalRecord {
            area_code: row.get("area_code"),
            area_name: row.get("area_name"),
            date: row.get("date"),
            new_cases: row.get("new_cases"),
        })
        .collect())
}

pub async fn persist_vaccinations(
    pool: &SqlitePool,
    rows: &[VaccinationObservation],
) -> EtlResult<u64> {
    let create_sql = format!(
        "CREATE TABLE {} (
            region TEXT NOT NULL,
            iso_code TEXT NOT NULL,
            date TEXT NOT NULL,
            total_vaccinations INTEGER NOT NULL,
            daily_vaccinations INTEGER NOT NULL
        )",
        OWID_VACCINATIONS
    );
    let insert_sql = format!(
        "INSERT INTO {} (region, iso_code, date, total_vaccinations, daily_vaccinations)
         VALUES (?, ?, ?, ?, ?)",
        OWID_VACCINATIONS
    );

    Ok(replace_table(pool, OWID_VACCINATIONS, &create_sql, &insert_sql, &[], rows).await?)
}

pub async fn read_vaccinations(pool: &SqlitePool) -> EtlResult<Vec<VaccinationObservation>> {
    let rows = sqlx::query(&format!(
        "SELECT region, iso_code, date, total_vaccinations, daily_vaccinations
         FROM {} ORDER BY region, date",
        OWID_VACCINATIONS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| VaccinationObservation {
            region: row.get("region"),
            iso_code: row.get("iso_code"),
            date: row.get("date"),
            total_vaccinations: row.get("total_vaccinations"),
            daily_vaccinations: row.get("daily_vaccinations"),
        })
        .collect())
}
