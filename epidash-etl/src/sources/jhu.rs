//! Johns Hopkins CSSE datasets
//!
//! Wide-format CSV time series (one column per calendar date) plus the
//! UID/ISO/FIPS lookup reference table, all served as raw CSV over HTTP.

use crate::table::RawTable;
use crate::EtlResult;

const TIME_SERIES_BASE: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series";

const LOOKUP_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/UID_ISO_FIPS_LookUp_Table.csv";

/// The JHU datasets the pipeline ingests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JhuDataset {
    GlobalCases,
    GlobalDeaths,
    UsCases,
    UsDeaths,
    Lookup,
}

impl JhuDataset {
    /// Source id used in job names, store tables and error reports
    pub fn source_id(&self) -> &'static str {
        match self {
            JhuDataset::GlobalCases => "jhu_global_cases",
            JhuDataset::GlobalDeaths => "jhu_global_deaths",
            JhuDataset::UsCases => "jhu_us_cases",
            JhuDataset::UsDeaths => "jhu_us_deaths",
            JhuDataset::Lookup => "jhu_lookup",
        }
    }

    pub fn url(&self) -> String {
        match self {
            JhuDataset::GlobalCases => {
                format!("{}/time_series_covid19_confirmed_global.csv", TIME_SERIES_BASE)
            }
            JhuDataset::GlobalDeaths => {
                format!("{}/time_series_covid19_deaths_global.csv", TIME_SERIES_BASE)
            }
            JhuDataset::UsCases => {
                format!("{}/time_series_covid19_confirmed_US.csv", TIME_SERIES_BASE)
            }
            JhuDataset::UsDeaths => {
                format!("{}/time_series_covid19_deaths_US.csv", TIME_SERIES_BASE)
            }
            JhuDataset::Lookup => LOOKUP_URL.to_string(),
        }
    }
}

/// Fetch one JHU dataset in its native wide shape
pub async fn fetch(client: &reqwest::Client, dataset: JhuDataset) -> EtlResult<RawTable> {
    super::fetch_csv(client, dataset.source_id(), &dataset.url()).await
}
