//! OWID vaccination normalizer

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{key_or_missing, parse_count, parse_date};
use crate::sources::owid::SOURCE_ID;
use crate::table::RawTable;
use crate::EtlResult;
use epidash_common::db::models::VaccinationObservation;

const OWID_DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerce the long-format vaccination CSV into canonical rows.
///
/// Missing numeric cells (reporting gaps) count as zero; rows sharing a
/// (region, date) key are summed; output is ordered by (region, date).
pub fn normalize_vaccinations(raw: &RawTable) -> EtlResult<Vec<VaccinationObservation>> {
    if raw.headers.is_empty() {
        return Ok(Vec::new());
    }

    let region_idx = raw.require_column("location")?;
    let iso_idx = raw.require_column("iso_code")?;
    let date_idx = raw.require_column("date")?;
    let total_idx = raw.require_column("total_vaccinations")?;
    let daily_idx = raw.require_column("daily_vaccinations")?;

    let mut grouped: BTreeMap<(String, NaiveDate), (String, i64, i64)> = BTreeMap::new();

    for row in &raw.rows {
        let region = key_or_missing(&row[region_idx]);
        let iso_code = key_or_missing(&row[iso_idx]);
        let date = parse_date(&row[date_idx], OWID_DATE_FORMAT, SOURCE_ID)?;
        let total = parse_count(&row[total_idx], SOURCE_ID)?;
        let daily = parse_count(&row[daily_idx], SOURCE_ID)?;

        grouped
            .entry((region, date))
            .and_modify(|slot| {
                slot.1 += total;
                slot.2 += daily;
            })
            .or_insert((iso_code, total, daily));
    }

    Ok(grouped
        .into_iter()
        .map(
            |((region, date), (iso_code, total_vaccinations, daily_vaccinations))| {
                VaccinationObservation {
                    region,
                    iso_code,
                    date,
                    total_vaccinations,
                    daily_vaccinations,
                }
            },
        )
        .collect())
}
