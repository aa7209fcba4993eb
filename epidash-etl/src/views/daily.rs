//! Daily rollup views: `global_by_day` and `continents_by_day`
//!
//! Cases and deaths summed per date (optionally per continent), with
//! `new_*` columns derived as the first difference of the cumulative
//! series. The first date of a series has no prior day, so its "new"
//! value equals its cumulative value.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use std::collections::BTreeMap;

use super::ViewContext;
use crate::enrich::{enrich_observations, EnrichedObservation};
use crate::publish::write_snapshot;
use crate::{store, EtlError, EtlResult};
use epidash_common::db::models::{Metric, Observation};
use epidash_common::db::{replace_table, BindRow};

pub const GLOBAL_BY_DAY: &str = "global_by_day";
pub const CONTINENTS_BY_DAY: &str = "continents_by_day";

const GLOBAL_HEADERS: &[&str] = &["date", "cases", "deaths", "new_cases", "new_deaths"];
const CONTINENT_HEADERS: &[&str] =
    &["continent", "date", "cases", "deaths", "new_cases", "new_deaths"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub cases: i64,
    pub deaths: i64,
    pub new_cases: i64,
    pub new_deaths: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinentDailyRow {
    pub continent: String,
    pub date: NaiveDate,
    pub cases: i64,
    pub deaths: i64,
    pub new_cases: i64,
    pub new_deaths: i64,
}

/// Global totals per date
pub fn global_by_day(cases: &[Observation], deaths: &[Observation]) -> Vec<DailyRow> {
    let mut by_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for obs in cases {
        by_day.entry(obs.date).or_default().0 += obs.value;
    }
    for obs in deaths {
        by_day.entry(obs.date).or_default().1 += obs.value;
    }

    let mut rows = Vec::with_capacity(by_day.len());
    let mut prev: Option<(i64, i64)> = None;
    for (date, (cases, deaths)) in by_day {
        let (new_cases, new_deaths) = match prev {
            Some((prev_cases, prev_deaths)) => (cases - prev_cases, deaths - prev_deaths),
            None => (cases, deaths),
        };
        rows.push(DailyRow {
            date,
            cases,
            deaths,
            new_cases,
            new_deaths,
        });
        prev = Some((cases, deaths));
    }
    rows
}

/// Continent totals per date.
///
/// Rows whose region never matched the lookup keep the `"N/A"` continent
/// group rather than disappearing from the rollup.
pub fn continents_by_day(
    cases: &[EnrichedObservation],
    deaths: &[EnrichedObservation],
) -> Vec<ContinentDailyRow> {
    let mut grouped: BTreeMap<(&'static str, NaiveDate), (i64, i64)> = BTreeMap::new();
    for e in cases {
        grouped.entry((e.continent, e.observation.date)).or_default().0 += e.observation.value;
    }
    for e in deaths {
        grouped.entry((e.continent, e.observation.date)).or_default().1 += e.observation.value;
    }

    let mut rows = Vec::with_capacity(grouped.len());
    let mut prev: Option<(&'static str, i64, i64)> = None;
    for ((continent, date), (cases, deaths)) in grouped {
        let (new_cases, new_deaths) = match prev {
            Some((prev_continent, prev_cases, prev_deaths)) if prev_continent == continent => {
                (cases - prev_cases, deaths - prev_deaths)
            }
            _ => (cases, deaths),
        };
        rows.push(ContinentDailyRow {
            continent: continent.to_string(),
            date,
            cases,
            deaths,
            new_cases,
            new_deaths,
        });
        prev = Some((continent, cases, deaths));
    }
    rows
}

/// Build and publish `global_by_day`
pub async fn build_global(ctx: &ViewContext) -> EtlResult<u64> {
    build_global_inner(ctx)
        .await
        .map_err(|e| EtlError::view_build(GLOBAL_BY_DAY, e))
}

async fn build_global_inner(ctx: &ViewContext) -> EtlResult<u64> {
    let cases = store::read_observations(&ctx.pool, store::JHU_GLOBAL_CASES, Metric::Cases).await?;
    let deaths =
        store::read_observations(&ctx.pool, store::JHU_GLOBAL_DEATHS, Metric::Deaths).await?;

    let rows = global_by_day(&cases, &deaths);

    let create_sql = format!(
        "CREATE TABLE {} (
            date TEXT NOT NULL,
            cases INTEGER NOT NULL,
            deaths INTEGER NOT NULL,
            new_cases INTEGER NOT NULL,
            new_deaths INTEGER NOT NULL
        )",
        GLOBAL_BY_DAY
    );
    let insert_sql = format!(
        "INSERT INTO {} (date, cases, deaths, new_cases, new_deaths) VALUES (?, ?, ?, ?, ?)",
        GLOBAL_BY_DAY
    );
    let written = replace_table(&ctx.pool, GLOBAL_BY_DAY, &create_sql, &insert_sql, &[], &rows).await?;

    write_snapshot(&ctx.snapshot_dir, GLOBAL_BY_DAY, GLOBAL_HEADERS, &rows)?;

    Ok(written)
}

/// Build and publish `continents_by_day`
pub async fn build_continents(ctx: &ViewContext) -> EtlResult<u64> {
    build_continents_inner(ctx)
        .await
        .map_err(|e| EtlError::view_build(CONTINENTS_BY_DAY, e))
}

async fn build_continents_inner(ctx: &ViewContext) -> EtlResult<u64> {
    let cases = store::read_observations(&ctx.pool, store::JHU_GLOBAL_CASES, Metric::Cases).await?;
    let deaths =
        store::read_observations(&ctx.pool, store::JHU_GLOBAL_DEATHS, Metric::Deaths).await?;
    let lookup = store::read_lookup(&ctx.pool).await?;

    let cases = enrich_observations(&cases, &lookup);
    let deaths = enrich_observations(&deaths, &lookup);

    let rows = continents_by_day(&cases, &deaths);

    let create_sql = format!(
        "CREATE TABLE {} (
            continent TEXT NOT NULL,
            date TEXT NOT NULL,
            cases INTEGER NOT NULL,
            deaths INTEGER NOT NULL,
            new_cases INTEGER NOT NULL,
            new_deaths INTEGER NOT NULL
        )",
        CONTINENTS_BY_DAY
    );
    let insert_sql = format!(
        "INSERT INTO {} (continent, date, cases, deaths, new_cases, new_deaths)
         VALUES (?, ?, ?, ?, ?, ?)",
        CONTINENTS_BY_DAY
    );
    let written =
        replace_table(&ctx.pool, CONTINENTS_BY_DAY, &create_sql, &insert_sql, &[], &rows).await?;

    write_snapshot(&ctx.snapshot_dir, CONTINENTS_BY_DAY, CONTINENT_HEADERS, &rows)?;

    Ok(written)
}

impl BindRow for DailyRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.date)
            .bind(self.cases)
            .bind(self.deaths)
            .bind(self.new_cases)
            .bind(self.new_deaths)
    }
}

impl BindRow for ContinentDailyRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.continent.as_str())
            .bind(self.date)
            .bind(self.cases)
            .bind(self.deaths)
            .bind(self.new_cases)
            .bind(self.new_deaths)
    }
}
