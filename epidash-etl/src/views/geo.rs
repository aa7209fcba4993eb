//! Geo snapshot evolution view: `geo_time_evolution`
//!
//! One denormalized row per (region, province, date) carrying cumulative
//! and new counts plus coordinates, for time-scrubbing map
//! visualizations. The store table is indexed on date so "all rows at
//! date = D" stays cheap as the series grows.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use std::collections::BTreeMap;

use super::ViewContext;
use crate::publish::write_snapshot;
use crate::{store, EtlError, EtlResult};
use epidash_common::db::models::{Metric, Observation};
use epidash_common::db::{replace_table, BindRow};

pub const GEO_TIME_EVOLUTION: &str = "geo_time_evolution";

const HEADERS: &[&str] = &[
    "region",
    "province",
    "lat",
    "long",
    "date",
    "cases",
    "deaths",
    "new_cases",
    "new_deaths",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoRow {
    pub region: String,
    pub province: String,
    pub lat: f64,
    pub long: f64,
    pub date: NaiveDate,
    pub cases: i64,
    pub deaths: i64,
    pub new_cases: i64,
    pub new_deaths: i64,
}

/// Join cases and deaths per (region, province, date) and derive the
/// per-series first differences
pub fn geo_time_evolution(cases: &[Observation], deaths: &[Observation]) -> Vec<GeoRow> {
    // (region, province, date) -> (lat, long, cases, deaths)
    let mut merged: BTreeMap<(String, String, NaiveDate), (f64, f64, i64, i64)> = BTreeMap::new();

    for obs in cases {
        let slot = merged
            .entry((obs.region.clone(), obs.province.clone(), obs.date))
            .or_insert((obs.lat, obs.long, 0, 0));
        slot.2 += obs.value;
    }
    for obs in deaths {
        let slot = merged
            .entry((obs.region.clone(), obs.province.clone(), obs.date))
            .or_insert((obs.lat, obs.long, 0, 0));
        slot.3 += obs.value;
    }

    let mut rows = Vec::with_capacity(merged.len());
    let mut prev: Option<(String, String, i64, i64)> = None;
    for ((region, province, date), (lat, long, cases, deaths)) in merged {
        let (new_cases, new_deaths) = match &prev {
            Some((prev_region, prev_province, prev_cases, prev_deaths))
                if *prev_region == region && *prev_province == province =>
            {
                (cases - prev_cases, deaths - prev_deaths)
            }
            _ => (cases, deaths),
        };
        prev = Some((region.clone(), province.clone(), cases, deaths));
        rows.push(GeoRow {
            region,
            province,
            lat,
            long,
            date,
            cases,
            deaths,
            new_cases,
            new_deaths,
        });
    }
    rows
}

/// Build and publish `geo_time_evolution`
pub async fn build(ctx: &ViewContext) -> EtlResult<u64> {
    build_inner(ctx)
        .await
        .map_err(|e| EtlError::view_build(GEO_TIME_EVOLUTION, e))
}

async fn build_inner(ctx: &ViewContext) -> EtlResult<u64> {
    let cases = store::read_observations(&ctx.pool, store::JHU_GLOBAL_CASES, Metric::Cases).await?;
    let deaths =
        store::read_observations(&ctx.pool, store::JHU_GLOBAL_DEATHS, Metric::Deaths).await?;

    let rows = geo_time_evolution(&cases, &deaths);

    let create_sql = format!(
        "CREATE TABLE {} (
            region TEXT NOT NULL,
            province TEXT NOT NULL,
            lat REAL NOT NULL,
            long REAL NOT NULL,
            date TEXT NOT NULL,
            cases INTEGER NOT NULL,
            deaths INTEGER NOT NULL,
            new_cases INTEGER NOT NULL,
            new_deaths INTEGER NOT NULL
        )",
        GEO_TIME_EVOLUTION
    );
    let insert_sql = format!(
        "INSERT INTO {} (region, province, lat, long, date, cases, deaths, new_cases, new_deaths)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        GEO_TIME_EVOLUTION
    );
    let index_sql = format!(
        "CREATE INDEX idx_{view}_date ON {view} (date)",
        view = GEO_TIME_EVOLUTION
    );
    let written = replace_table(
        &ctx.pool,
        GEO_TIME_EVOLUTION,
        &create_sql,
        &insert_sql,
        &[index_sql.as_str()],
        &rows,
    )
    .await?;

    write_snapshot(&ctx.snapshot_dir, GEO_TIME_EVOLUTION, HEADERS, &rows)?;

    Ok(written)
}

impl BindRow for GeoRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.region.as_str())
            .bind(self.province.as_str())
            .bind(self.lat)
            .bind(self.long)
            .bind(self.date)
            .bind(self.cases)
            .bind(self.deaths)
            .bind(self.new_cases)
            .bind(self.new_deaths)
    }
}
