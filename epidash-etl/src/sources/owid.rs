//! Our World in Data vaccination dataset
//!
//! Long-format CSV: one row per (location, date) with cumulative and daily
//! vaccination counts.

use crate::table::RawTable;
use crate::EtlResult;

const VACCINATIONS_URL: &str = "https://raw.githubusercontent.com/owid/covid-19-data/master/public/data/vaccinations/vaccinations.csv";

/// Source id for error reports and the store table
pub const SOURCE_ID: &str = "owid_vaccinations";

/// Fetch the global vaccination time series
pub async fn fetch(client: &reqwest::Client) -> EtlResult<RawTable> {
    super::fetch_csv(client, SOURCE_ID, VACCINATIONS_URL).await
}
