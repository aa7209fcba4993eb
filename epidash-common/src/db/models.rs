//! Canonical data model types
//!
//! Every source is reshaped into these types before touching the store.
//! String keys use the `"N/A"` sentinel instead of NULL so that grouping
//! never silently drops rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel for missing categorical keys (sub-region names, continents)
pub const MISSING: &str = "N/A";

/// Metric carried by a normalized observation.
///
/// The lowercase name doubles as the value column name in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cases,
    Deaths,
    NewCases,
    NewDeaths,
    Vaccinations,
    NewVaccinations,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
            Metric::NewCases => "new_cases",
            Metric::NewDeaths => "new_deaths",
            Metric::Vaccinations => "vaccinations",
            Metric::NewVaccinations => "new_vaccinations",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized long-format row: a metric value for one
/// (region, province) pair on one date.
///
/// Exactly one observation exists per (region, province, date, metric)
/// after normalization; duplicate keys from finer-grained source rows are
/// summed during the reshape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region: String,
    pub province: String,
    pub lat: f64,
    pub long: f64,
    pub date: NaiveDate,
    pub metric: Metric,
    pub value: i64,
}

/// One row of the fetched region reference table: maps a
/// (region, province) pair to ISO codes and population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub iso2: String,
    pub iso3: String,
    pub region: String,
    pub province: String,
    pub population: Option<i64>,
}

/// One UK local-authority row as delivered (long format) by the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UkLocalRecord {
    pub area_code: String,
    pub area_name: String,
    pub date: NaiveDate,
    pub new_cases: i64,
}

/// One long-format vaccination row from the OWID dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationObservation {
    pub region: String,
    pub iso_code: String,
    pub date: NaiveDate,
    pub total_vaccinations: i64,
    pub daily_vaccinations: i64,
}
