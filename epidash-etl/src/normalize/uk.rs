//! UK local-authority normalizer
//!
//! The API already delivers long rows, so normalization is coercion
//! (ISO dates, null counts to zero), sentinel fill, duplicate-key
//! summing and canonical ordering.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{key_or_missing, parse_date};
use crate::sources::uk::{UkCaseRow, SOURCE_ID};
use crate::EtlResult;
use epidash_common::db::models::UkLocalRecord;

const UK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerce and canonicalize the fetched local-authority rows
pub fn normalize_local_authority(rows: Vec<UkCaseRow>) -> EtlResult<Vec<UkLocalRecord>> {
    let mut grouped: BTreeMap<(String, NaiveDate), (String, i64)> = BTreeMap::new();

    for row in rows {
        let date = parse_date(&row.date, UK_DATE_FORMAT, SOURCE_ID)?;
        let area_code = key_or_missing(&row.area_code);
        let area_name = key_or_missing(&row.area_name);
        let new_cases = row.new_cases.unwrap_or(0);

        grouped
            .entry((area_code, date))
            .and_modify(|slot| slot.1 += new_cases)
            .or_insert((area_name, new_cases));
    }

    Ok(grouped
        .into_iter()
        .map(|((area_code, date), (area_name, new_cases))| UkLocalRecord {
            area_code,
            area_name,
            date,
            new_cases,
        })
        .collect())
}
