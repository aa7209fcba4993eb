//! Trajectory alignment view: `country_trajectories`
//!
//! Re-indexes each region's cumulative case series by days since the
//! region first reached the case threshold, so regions can be compared on
//! a common x-axis regardless of calendar date. Regions that never reach
//! the threshold do not appear at all.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use std::collections::BTreeMap;

use super::{ViewContext, CASE_THRESHOLD};
use crate::publish::write_snapshot;
use crate::{store, EtlError, EtlResult};
use epidash_common::db::models::{Metric, Observation};
use epidash_common::db::{replace_table, BindRow};

pub const COUNTRY_TRAJECTORIES: &str = "country_trajectories";

const HEADERS: &[&str] = &["region", "date", "cases", "days_since_arrival"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryRow {
    pub region: String,
    pub date: NaiveDate,
    pub cases: i64,
    /// 1 on the threshold-crossing date, increasing by 1 per day after
    pub days_since_arrival: i64,
}

/// Compute the aligned trajectories from region-level cumulative cases
pub fn country_trajectories(cases: &[Observation]) -> Vec<TrajectoryRow> {
    // Provinces sum up to one series per region
    let mut by_region: BTreeMap<String, BTreeMap<NaiveDate, i64>> = BTreeMap::new();
    for obs in cases {
        *by_region
            .entry(obs.region.clone())
            .or_default()
            .entry(obs.date)
            .or_default() += obs.value;
    }

    let mut rows = Vec::new();
    for (region, series) in by_region {
        let arrival = match series
            .iter()
            .find(|(_, &cases)| cases >= CASE_THRESHOLD)
            .map(|(&date, _)| date)
        {
            Some(date) => date,
            // Never crossed the threshold: excluded entirely
            None => continue,
        };

        for (date, cases) in series.range(arrival..) {
            rows.push(TrajectoryRow {
                region: region.clone(),
                date: *date,
                cases: *cases,
                days_since_arrival: (*date - arrival).num_days() + 1,
            });
        }
    }
    rows
}

/// Build and publish `country_trajectories`
pub async fn build(ctx: &ViewContext) -> EtlResult<u64> {
    build_inner(ctx)
        .await
        .map_err(|e| EtlError::view_build(COUNTRY_TRAJECTORIES, e))
}

async fn build_inner(ctx: &ViewContext) -> EtlResult<u64> {
    let cases = store::read_observations(&ctx.pool, store::JHU_GLOBAL_CASES, Metric::Cases).await?;

    let rows = country_trajectories(&cases);

    let create_sql = format!(
        "CREATE TABLE {} (
            region TEXT NOT NULL,
            date TEXT NOT NULL,
            cases INTEGER NOT NULL,
            days_since_arrival INTEGER NOT NULL
        )",
        COUNTRY_TRAJECTORIES
    );
    let insert_sql = format!(
        "INSERT INTO {} (region, date, cases, days_since_arrival) VALUES (?, ?, ?, ?)",
        COUNTRY_TRAJECTORIES
    );
    let written =
        replace_table(&ctx.pool, COUNTRY_TRAJECTORIES, &create_sql, &insert_sql, &[], &rows)
            .await?;

    write_snapshot(&ctx.snapshot_dir, COUNTRY_TRAJECTORIES, HEADERS, &rows)?;

    Ok(written)
}

impl BindRow for TrajectoryRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.region.as_str())
            .bind(self.date)
            .bind(self.cases)
            .bind(self.days_since_arrival)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn regions_below_threshold_are_excluded() {
        let cases = vec![
            obs("Italy", 1, 10),
            obs("Italy", 2, 20),
            obs("Italy", 3, 150),
            obs("Andorra", 1, 5),
            obs("Andorra", 2, 15),
            obs("Andorra", 3, 25),
        ];

        let rows = country_trajectories(&cases);
        assert!(rows.iter().all(|r| r.region == "Italy"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].days_since_arrival, 1);
        assert_eq!(rows[0].cases, 150);
    }

    #[test]
    fn days_since_arrival_increase_by_one() {
        let cases = vec![
            obs("Italy", 1, 120),
            obs("Italy", 2, 180),
            obs("Italy", 3, 260),
            obs("Italy", 4, 400),
        ];

        let rows = country_trajectories(&cases);
        assert_eq!(rows.len(), 4);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.days_since_arrival, i as i64 + 1);
        }
    }

    #[test]
    fn provinces_are_summed_before_thresholding() {
        // Each province is below 100; together they cross it
        let cases = vec![
            Observation {
                province: "Ontario".to_string(),
                ..obs("Canada", 1, 60)
            },
            Observation {
                province: "Quebec".to_string(),
                ..obs("Canada", 1, 70)
            },
        ];

        let rows = country_trajectories(&cases);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cases, 130);
        assert_eq!(rows[0].days_since_arrival, 1);
    }

    #[test]
    fn exact_threshold_counts_as_arrival() {
        let cases = vec![obs("Malta", 1, 99), obs("Malta", 2, 100)];
        let rows = country_trajectories(&cases);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2021, 3, 2).unwrap());
    }
}
