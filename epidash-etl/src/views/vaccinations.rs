//! Vaccination rollup views: `vaccinations_by_day` and
//! `vaccinations_by_continent`
//!
//! Same shape as the case/death daily rollups, over the separately
//! sourced vaccination series. The continent rollup joins each country's
//! ISO3 code against the continent reference; countries the reference
//! does not know stay in the `"N/A"` group.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use std::collections::BTreeMap;

use super::ViewContext;
use crate::enrich::continent_for_iso3;
use crate::publish::write_snapshot;
use crate::{store, EtlError, EtlResult};
use epidash_common::db::models::VaccinationObservation;
use epidash_common::db::{replace_table, BindRow};

pub const VACCINATIONS_BY_DAY: &str = "vaccinations_by_day";
pub const VACCINATIONS_BY_CONTINENT: &str = "vaccinations_by_continent";

const DAY_HEADERS: &[&str] = &["date", "vaccinations", "new_vaccinations"];
const CONTINENT_HEADERS: &[&str] = &["continent", "date", "vaccinations", "new_vaccinations"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaccinationDailyRow {
    pub date: NaiveDate,
    pub vaccinations: i64,
    pub new_vaccinations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaccinationContinentRow {
    pub continent: String,
    pub date: NaiveDate,
    pub vaccinations: i64,
    pub new_vaccinations: i64,
}

/// The dataset carries aggregate rows (world, continents, income groups)
/// under OWID_* pseudo-codes; only country rows enter the rollups.
fn country_rows(
    observations: &[VaccinationObservation],
) -> impl Iterator<Item = &VaccinationObservation> {
    observations
        .iter()
        .filter(|obs| !obs.iso_code.starts_with("OWID_"))
}

/// Global vaccination totals per date
pub fn vaccinations_by_day(observations: &[VaccinationObservation]) -> Vec<VaccinationDailyRow> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for obs in country_rows(observations) {
        *by_day.entry(obs.date).or_default() += obs.total_vaccinations;
    }

    let mut rows = Vec::with_capacity(by_day.len());
    let mut prev: Option<i64> = None;
    for (date, vaccinations) in by_day {
        let new_vaccinations = match prev {
            Some(prev_vaccinations) => vaccinations - prev_vaccinations,
            None => vaccinations,
        };
        rows.push(VaccinationDailyRow {
            date,
            vaccinations,
            new_vaccinations,
        });
        prev = Some(vaccinations);
    }
    rows
}

/// Vaccination totals per (continent, date)
pub fn vaccinations_by_continent(
    observations: &[VaccinationObservation],
) -> Vec<VaccinationContinentRow> {
    let mut grouped: BTreeMap<(&'static str, NaiveDate), i64> = BTreeMap::new();
    for obs in country_rows(observations) {
        *grouped
            .entry((continent_for_iso3(&obs.iso_code), obs.date))
            .or_default() += obs.total_vaccinations;
    }

    let mut rows = Vec::with_capacity(grouped.len());
    let mut prev: Option<(&'static str, i64)> = None;
    for ((continent, date), vaccinations) in grouped {
        let new_vaccinations = match prev {
            Some((prev_continent, prev_vaccinations)) if prev_continent == continent => {
                vaccinations - prev_vaccinations
            }
            _ => vaccinations,
        };
        rows.push(VaccinationContinentRow {
            continent: continent.to_string(),
            date,
            vaccinations,
            new_vaccinations,
        });
        prev = Some((continent, vaccinations));
    }
    rows
}

/// Build and publish `vaccinations_by_day`
pub async fn build_by_day(ctx: &ViewContext) -> EtlResult<u64> {
    build_by_day_inner(ctx)
        .await
        .map_err(|e| EtlError::view_build(VACCINATIONS_BY_DAY, e))
}

async fn build_by_day_inner(ctx: &ViewContext) -> EtlResult<u64> {
    let observations = store::read_vaccinations(&ctx.pool).await?;
    let rows = vaccinations_by_day(&observations);

    let create_sql = format!(
        "CREATE TABLE {} (
            date TEXT NOT NULL,
            vaccinations INTEGER NOT NULL,
            new_vaccinations INTEGER NOT NULL
        )",
        VACCINATIONS_BY_DAY
    );
    let insert_sql = format!(
        "INSERT INTO {} (date, vaccinations, new_vaccinations) VALUES (?, ?, ?)",
        VACCINATIONS_BY_DAY
    );
    let written =
        replace_table(&ctx.pool, VACCINATIONS_BY_DAY, &create_sql, &insert_sql, &[], &rows).await?;

    write_snapshot(&ctx.snapshot_dir, VACCINATIONS_BY_DAY, DAY_HEADERS, &rows)?;

    Ok(written)
}

/// Build and publish `vaccinations_by_continent`
pub async fn build_by_continent(ctx: &ViewContext) -> EtlResult<u64> {
    build_by_continent_inner(ctx)
        .await
        .map_err(|e| EtlError::view_build(VACCINATIONS_BY_CONTINENT, e))
}

async fn build_by_continent_inner(ctx: &ViewContext) -> EtlResult<u64> {
    let observations = store::read_vaccinations(&ctx.pool).await?;
    let rows = vaccinations_by_continent(&observations);

    let create_sql = format!(
        "CREATE TABLE {} (
            continent TEXT NOT NULL,
            date TEXT NOT NULL,
            vaccinations INTEGER NOT NULL,
            new_vaccinations INTEGER NOT NULL
        )",
        VACCINATIONS_BY_CONTINENT
    );
    let insert_sql = format!(
        "INSERT INTO {} (continent, date, vaccinations, new_vaccinations) VALUES (?, ?, ?, ?)",
        VACCINATIONS_BY_CONTINENT
    );
    let written = replace_table(
        &ctx.pool,
        VACCINATIONS_BY_CONTINENT,
        &create_sql,
        &insert_sql,
        &[],
        &rows,
    )
    .await?;

    write_snapshot(
        &ctx.snapshot_dir,
        VACCINATIONS_BY_CONTINENT,
        CONTINENT_HEADERS,
        &rows,
    )?;

    Ok(written)
}

impl BindRow for VaccinationDailyRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.date)
            .bind(self.vaccinations)
            .bind(self.new_vaccinations)
    }
}

impl BindRow for VaccinationContinentRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.continent.as_str())
            .bind(self.date)
            .bind(self.vaccinations)
            .bind(self.new_vaccinations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vac(region: &str, iso: &str, day: u32, total: i64) -> VaccinationObservation {
        VaccinationObservation {
            region: region.to_string(),
            iso_code: iso.to_string(),
            date: NaiveDate::from_ymd_opt(2021, 3, day).unwrap(),
            total_vaccinations: total,
            daily_vaccinations: 0,
        }
    }

    #[test]
    fn first_day_new_equals_cumulative() {
        let observations = vec![vac("Italy", "ITA", 1, 1000), vac("Italy", "ITA", 2, 1500)];
        let rows = vaccinations_by_day(&observations);
        assert_eq!(rows[0].new_vaccinations, 1000);
        assert_eq!(rows[1].new_vaccinations, 500);
    }

    #[test]
    fn owid_aggregate_rows_are_excluded() {
        let observations = vec![
            vac("Italy", "ITA", 1, 1000),
            vac("World", "OWID_WRL", 1, 999_999),
        ];
        let rows = vaccinations_by_day(&observations);
        assert_eq!(rows[0].vaccinations, 1000);
    }

    #[test]
    fn unknown_iso_codes_group_under_sentinel() {
        let observations = vec![vac("Italy", "ITA", 1, 1000), vac("Atlantis", "ATL", 1, 50)];
        let rows = vaccinations_by_continent(&observations);

        let europe = rows.iter().find(|r| r.continent == "Europe").unwrap();
        assert_eq!(europe.vaccinations, 1000);
        let na = rows.iter().find(|r| r.continent == "N/A").unwrap();
        assert_eq!(na.vaccinations, 50);
    }
}
