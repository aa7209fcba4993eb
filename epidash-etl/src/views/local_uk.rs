//! UK local-authority view: `local_uk`
//!
//! Daily cases per lower-tier local authority with a trailing 7-day case
//! sum and, where the population reference knows the area, weekly cases
//! per 100,000 residents.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use std::collections::{HashMap, VecDeque};

use super::ViewContext;
use crate::publish::write_snapshot;
use crate::sources::load_population_file;
use crate::{store, EtlError, EtlResult};
use epidash_common::db::models::UkLocalRecord;
use epidash_common::db::{replace_table, BindRow};

pub const LOCAL_UK: &str = "local_uk";

const HEADERS: &[&str] = &[
    "area_code",
    "area_name",
    "date",
    "new_cases",
    "weekly_cases",
    "population",
    "weekly_cases_per_100k",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalUkRow {
    pub area_code: String,
    pub area_name: String,
    pub date: NaiveDate,
    pub new_cases: i64,
    /// Trailing 7-day sum including this date
    pub weekly_cases: i64,
    pub population: Option<i64>,
    /// 0 when the area's population is unknown
    pub weekly_cases_per_100k: i64,
}

/// Derive the weekly measures from the ordered local-authority series.
///
/// `records` must be ordered by (area_code, date), which is how the store
/// hands them back. The window is date-aware: a reporting gap shrinks the
/// sum instead of stretching the window over older rows.
pub fn local_uk(records: &[UkLocalRecord], populations: &HashMap<String, i64>) -> Vec<LocalUkRow> {
    let mut rows = Vec::with_capacity(records.len());
    let mut window: VecDeque<(NaiveDate, i64)> = VecDeque::new();
    let mut current_area: Option<&str> = None;

    for record in records {
        if current_area != Some(record.area_code.as_str()) {
            window.clear();
            current_area = Some(record.area_code.as_str());
        }

        window.push_back((record.date, record.new_cases));
        let cutoff = record.date - Duration::days(6);
        while window.front().is_some_and(|&(date, _)| date < cutoff) {
            window.pop_front();
        }

        let weekly_cases: i64 = window.iter().map(|&(_, cases)| cases).sum();
        let population = populations.get(&record.area_code).copied();
        let weekly_cases_per_100k = match population {
            Some(population) if population > 0 => 100_000 * weekly_cases / population,
            _ => 0,
        };

        rows.push(LocalUkRow {
            area_code: record.area_code.clone(),
            area_name: record.area_name.clone(),
            date: record.date,
            new_cases: record.new_cases,
            weekly_cases,
            population,
            weekly_cases_per_100k,
        });
    }
    rows
}

/// Build and publish `local_uk`
pub async fn build(ctx: &ViewContext) -> EtlResult<u64> {
    build_inner(ctx)
        .await
        .map_err(|e| EtlError::view_build(LOCAL_UK, e))
}

async fn build_inner(ctx: &ViewContext) -> EtlResult<u64> {
    let records = store::read_uk_local(&ctx.pool).await?;

    let populations = match &ctx.population_file {
        Some(path) => load_population_file(path)?,
        None => HashMap::new(),
    };

    let rows = local_uk(&records, &populations);

    let create_sql = format!(
        "CREATE TABLE {} (
            area_code TEXT NOT NULL,
            area_name TEXT NOT NULL,
            date TEXT NOT NULL,
            new_cases INTEGER NOT NULL,
            weekly_cases INTEGER NOT NULL,
            population INTEGER,
            weekly_cases_per_100k INTEGER NOT NULL
        )",
        LOCAL_UK
    );
    let insert_sql = format!(
        "INSERT INTO {} (area_code, area_name, date, new_cases, weekly_cases, population, weekly_cases_per_100k)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        LOCAL_UK
    );
    let written = replace_table(&ctx.pool, LOCAL_UK, &create_sql, &insert_sql, &[], &rows).await?;

    write_snapshot(&ctx.snapshot_dir, LOCAL_UK, HEADERS, &rows)?;

    Ok(written)
}

impl BindRow for LocalUkRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.area_code.as_str())
            .bind(self.area_name.as_str())
            .bind(self.date)
            .bind(self.new_cases)
            .bind(self.weekly_cases)
            .bind(self.population)
            .bind(self.weekly_cases_per_100k)
    }
}
