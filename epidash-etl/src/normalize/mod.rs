//! Schema normalizers
//!
//! Reshapes each source's native table into the canonical long format:
//! one row per (region, province, date, metric), lowercase column names,
//! `"N/A"` sentinels for missing categorical keys, typed dates and counts.
//!
//! The wide→long unpivot is driven by a per-source [`SchemaSpec`] so every
//! date-columnar source runs through the same engine. Sources that deliver
//! long rows already (UK API, OWID) only get coercion, grouping and
//! ordering.

pub mod jhu;
pub mod owid;
pub mod uk;

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::table::RawTable;
use crate::{EtlError, EtlResult};
use epidash_common::db::models::{Metric, Observation, MISSING};

/// Describes how one wide-format source maps onto the canonical schema
#[derive(Debug, Clone)]
pub struct SchemaSpec {
    /// Source id, for error context
    pub source: &'static str,
    /// Header of the country/region key column
    pub region_col: &'static str,
    /// Header of the sub-region key column
    pub province_col: &'static str,
    /// Coordinate columns, when the source carries usable ones
    pub lat_col: Option<&'static str>,
    pub long_col: Option<&'static str>,
    /// Id columns discarded before the unpivot (finer-granularity keys)
    pub drop_cols: &'static [&'static str],
    /// strftime format of the date column headers
    pub date_format: &'static str,
    /// Metric the value cells carry
    pub metric: Metric,
}

/// Unpivot a wide date-columnar table into canonical long rows.
///
/// Every column that is neither an id column nor dropped must parse as a
/// date under the source's declared format; a header that does not is a
/// fatal parse error for this source's run. Rows sharing a (region, province, date)
/// key after the reshape are summed, so the output holds exactly one row
/// per key, ordered by (region, province, date) ascending.
///
/// A zero-row payload normalizes to an empty sequence, not an error.
pub fn melt(raw: &RawTable, spec: &SchemaSpec) -> EtlResult<Vec<Observation>> {
    if raw.headers.is_empty() {
        return Ok(Vec::new());
    }

    let region_idx = raw.require_column(spec.region_col)?;
    let province_idx = raw.require_column(spec.province_col)?;
    let lat_idx = spec.lat_col.map(|c| raw.require_column(c)).transpose()?;
    let long_idx = spec.long_col.map(|c| raw.require_column(c)).transpose()?;

    // Everything that is not a value column
    let mut id_idx: Vec<usize> = vec![region_idx, province_idx];
    id_idx.extend(lat_idx);
    id_idx.extend(long_idx);
    for dropped in spec.drop_cols {
        // Dropped columns are allowed to be absent (schemas drift)
        if let Some(idx) = raw.column(dropped) {
            id_idx.push(idx);
        }
    }

    let mut date_cols: Vec<(usize, NaiveDate)> = Vec::new();
    for (idx, header) in raw.headers.iter().enumerate() {
        if id_idx.contains(&idx) {
            continue;
        }
        let date = NaiveDate::parse_from_str(header, spec.date_format).map_err(|e| {
            EtlError::Parse(format!(
                "{}: date column header '{}' does not match {}: {}",
                spec.source, header, spec.date_format, e
            ))
        })?;
        date_cols.push((idx, date));
    }

    // Group by the canonical key; BTreeMap keeps the output ordered and
    // guarantees one row per key.
    let mut grouped: BTreeMap<(String, String, NaiveDate), (f64, f64, i64)> = BTreeMap::new();

    for row in &raw.rows {
        let region = key_or_missing(&row[region_idx]);
        let province = key_or_missing(&row[province_idx]);
        let lat = match lat_idx {
            Some(idx) => parse_coord(&row[idx], spec.source)?,
            None => 0.0,
        };
        let long = match long_idx {
            Some(idx) => parse_coord(&row[idx], spec.source)?,
            None => 0.0,
        };

        for &(idx, date) in &date_cols {
            let value = parse_count(&row[idx], spec.source)?;
            grouped
                .entry((region.clone(), province.clone(), date))
                .and_modify(|slot| slot.2 += value)
                .or_insert((lat, long, value));
        }
    }

    let observations: Vec<Observation> = grouped
        .into_iter()
        .map(|((region, province, date), (lat, long, value))| Observation {
            region,
            province,
            lat,
            long,
            date,
            metric: spec.metric,
            value,
        })
        .collect();

    debug!(
        source = spec.source,
        input_rows = raw.len(),
        output_rows = observations.len(),
        "unpivoted wide table"
    );

    Ok(observations)
}

/// Missing categorical keys become the sentinel, never an empty string,
/// so grouping cannot silently drop rows
pub(crate) fn key_or_missing(cell: &str) -> String {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        MISSING.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a count cell. Empty cells count as zero; anything else must be
/// numeric (integer, or integral-valued float as some sources emit).
pub(crate) fn parse_count(cell: &str, source: &str) -> EtlResult<i64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value as i64),
        _ => Err(EtlError::Parse(format!(
            "{}: malformed numeric value '{}'",
            source, cell
        ))),
    }
}

/// Parse a coordinate cell; empty means unknown and maps to 0.0
pub(crate) fn parse_coord(cell: &str, source: &str) -> EtlResult<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed.parse::<f64>().map_err(|_| {
        EtlError::Parse(format!("{}: malformed coordinate '{}'", source, cell))
    })
}

/// Parse a date cell under the given format
pub(crate) fn parse_date(cell: &str, format: &str, source: &str) -> EtlResult<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), format).map_err(|e| {
        EtlError::Parse(format!("{}: malformed date '{}': {}", source, cell, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SchemaSpec {
        jhu::global_schema(Metric::Cases)
    }

    #[test]
    fn melt_produces_one_row_per_entity_date() {
        let raw = RawTable::from_csv_str(
            "Province/State,Country/Region,Lat,Long,3/1/21,3/2/21\n\
             ,Italy,41.9,12.6,10,20\n\
             ,Spain,40.4,-3.7,5,15\n",
        )
        .unwrap();

        let obs = melt(&raw, &spec()).unwrap();
        assert_eq!(obs.len(), 4);
        assert!(obs.iter().all(|o| o.province == MISSING));
        assert_eq!(obs[0].region, "Italy");
        assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
        assert_eq!(obs[0].value, 10);
    }

    #[test]
    fn duplicate_keys_are_summed_not_left_ambiguous() {
        let raw = RawTable::from_csv_str(
            "Province/State,Country/Region,Lat,Long,3/1/21\n\
             ,Italy,41.9,12.6,10\n\
             ,Italy,41.9,12.6,7\n",
        )
        .unwrap();

        let obs = melt(&raw, &spec()).unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].value, 17);
    }

    #[test]
    fn output_is_ordered_by_region_province_date() {
        let raw = RawTable::from_csv_str(
            "Province/State,Country/Region,Lat,Long,3/2/21,3/1/21\n\
             ,Spain,40.4,-3.7,15,5\n\
             Lombardy,Italy,45.5,9.2,20,10\n\
             ,Italy,41.9,12.6,2,1\n",
        )
        .unwrap();

        let obs = melt(&raw, &spec()).unwrap();
        let keys: Vec<(String, String, NaiveDate)> = obs
            .iter()
            .map(|o| (o.region.clone(), o.province.clone(), o.date))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn unparseable_date_header_is_fatal() {
        let raw = RawTable::from_csv_str(
            "Province/State,Country/Region,Lat,Long,not-a-date\n,Italy,41.9,12.6,10\n",
        )
        .unwrap();
        assert!(matches!(melt(&raw, &spec()), Err(EtlError::Parse(_))));
    }

    #[test]
    fn zero_row_payload_normalizes_to_empty() {
        let raw =
            RawTable::from_csv_str("Province/State,Country/Region,Lat,Long,3/1/21\n").unwrap();
        let obs = melt(&raw, &spec()).unwrap();
        assert!(obs.is_empty());
    }

    #[test]
    fn empty_value_cells_count_as_zero() {
        let raw = RawTable::from_csv_str(
            "Province/State,Country/Region,Lat,Long,3/1/21\n,Italy,41.9,12.6,\n",
        )
        .unwrap();
        let obs = melt(&raw, &spec()).unwrap();
        assert_eq!(obs[0].value, 0);
    }

    #[test]
    fn melt_is_deterministic() {
        let raw = RawTable::from_csv_str(
            "Province/State,Country/Region,Lat,Long,3/1/21,3/2/21\n\
             ,Italy,41.9,12.6,10,20\n\
             Lombardy,Italy,45.5,9.2,5,15\n",
        )
        .unwrap();
        let first = melt(&raw, &spec()).unwrap();
        let second = melt(&raw, &spec()).unwrap();
        assert_eq!(first, second);
    }
}
