//! JHU source schemas
//!
//! The global files key rows by (Country/Region, Province/State) with
//! usable coordinates. The US files key by county and carry a pile of
//! administrative id columns; those are dropped and the county rows are
//! summed up to (country, state) during the unpivot.

use super::{key_or_missing, SchemaSpec};
use crate::table::RawTable;
use crate::EtlResult;
use epidash_common::db::models::{LookupRecord, Metric};

/// JHU date column headers look like `3/21/21`
const JHU_DATE_FORMAT: &str = "%m/%d/%y";

/// Schema of the global wide files (confirmed and deaths share it)
pub fn global_schema(metric: Metric) -> SchemaSpec {
    SchemaSpec {
        source: match metric {
            Metric::Deaths => "jhu_global_deaths",
            _ => "jhu_global_cases",
        },
        region_col: "Country/Region",
        province_col: "Province/State",
        lat_col: Some("Lat"),
        long_col: Some("Long"),
        drop_cols: &[],
        date_format: JHU_DATE_FORMAT,
        metric,
    }
}

/// Schema of the US wide files.
///
/// County-level id columns are discarded; coordinates are meaningless
/// once counties are summed to state level, so none are kept.
pub fn us_schema(metric: Metric) -> SchemaSpec {
    SchemaSpec {
        source: match metric {
            Metric::Deaths => "jhu_us_deaths",
            _ => "jhu_us_cases",
        },
        region_col: "Country_Region",
        province_col: "Province_State",
        lat_col: None,
        long_col: None,
        drop_cols: &[
            "UID",
            "iso2",
            "iso3",
            "code3",
            "FIPS",
            "Admin2",
            "Combined_Key",
            "Population",
            "Lat",
            "Long_",
        ],
        date_format: JHU_DATE_FORMAT,
        metric,
    }
}

/// Parse the UID/ISO/FIPS lookup table into reference records.
///
/// Country-level rows have an empty Province_State, which becomes the
/// sentinel so enrichment can match observations keyed the same way.
/// Unparseable populations become unknown rather than failing the load.
pub fn normalize_lookup(raw: &RawTable) -> EtlResult<Vec<LookupRecord>> {
    if raw.headers.is_empty() {
        return Ok(Vec::new());
    }

    let iso2_idx = raw.require_column("iso2")?;
    let iso3_idx = raw.require_column("iso3")?;
    let region_idx = raw.require_column("Country_Region")?;
    let province_idx = raw.require_column("Province_State")?;
    let population_idx = raw.require_column("Population")?;

    let mut records = Vec::with_capacity(raw.len());
    for row in &raw.rows {
        let population = row[population_idx]
            .trim()
            .parse::<f64>()
            .ok()
            .map(|p| p as i64);
        records.push(LookupRecord {
            iso2: row[iso2_idx].trim().to_string(),
            iso3: row[iso3_idx].trim().to_string(),
            region: key_or_missing(&row[region_idx]),
            province: key_or_missing(&row[province_idx]),
            population,
        });
    }

    Ok(records)
}
