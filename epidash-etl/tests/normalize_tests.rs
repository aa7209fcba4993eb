//! Normalizer property tests
//!
//! Synthetic wide tables with repeated sub-region rows, exercising the
//! post-aggregation uniqueness guarantee and the idempotence of
//! normalize + enrich.

mod helpers;

use std::collections::HashSet;

use epidash_common::db::models::{Metric, MISSING};
use epidash_etl::enrich::enrich_observations;
use epidash_etl::normalize::jhu::{global_schema, normalize_lookup, us_schema};
use epidash_etl::normalize::melt;
use epidash_etl::table::RawTable;

/// Build a wide table where every region appears through several
/// sub-region rows, some sharing the same canonical key
fn synthetic_wide_table(regions: usize, duplicates: usize, dates: usize) -> RawTable {
    let mut csv = String::from("Province/State,Country/Region,Lat,Long");
    for day in 1..=dates {
        csv.push_str(&format!(",3/{}/21", day));
    }
    csv.push('\n');

    for region in 0..regions {
        for _ in 0..duplicates {
            csv.push_str(&format!(",Region{},10.0,20.0", region));
            for day in 1..=dates {
                csv.push_str(&format!(",{}", day * 3));
            }
            csv.push('\n');
        }
    }

    RawTable::from_csv_str(&csv).unwrap()
}

#[test]
fn no_duplicate_keys_survive_grouping() {
    let raw = synthetic_wide_table(5, 4, 3);
    let observations = melt(&raw, &global_schema(Metric::Cases)).unwrap();

    assert_eq!(observations.len(), 5 * 3);

    let keys: HashSet<(String, String, chrono::NaiveDate)> = observations
        .iter()
        .map(|o| (o.region.clone(), o.province.clone(), o.date))
        .collect();
    assert_eq!(keys.len(), observations.len());

    // Duplicate sub-region rows were summed, not dropped or duplicated
    assert!(observations.iter().all(|o| o.value % 4 == 0));
}

#[test]
fn normalize_then_enrich_is_idempotent() {
    let raw = synthetic_wide_table(3, 2, 4);
    let lookup_raw = RawTable::from_csv_str(helpers::SCENARIO_LOOKUP_CSV).unwrap();
    let lookup = normalize_lookup(&lookup_raw).unwrap();

    let first = melt(&raw, &global_schema(Metric::Cases)).unwrap();
    let second = melt(&raw, &global_schema(Metric::Cases)).unwrap();
    assert_eq!(first, second);

    let enriched_first = enrich_observations(&first, &lookup);
    let enriched_second = enrich_observations(&second, &lookup);
    assert_eq!(enriched_first.len(), enriched_second.len());
    for (a, b) in enriched_first.iter().zip(&enriched_second) {
        assert_eq!(a.observation, b.observation);
        assert_eq!(a.continent, b.continent);
        assert_eq!(a.population, b.population);
    }
}

#[test]
fn enrichment_preserves_length_even_with_empty_lookup() {
    let raw = synthetic_wide_table(4, 1, 2);
    let observations = melt(&raw, &global_schema(Metric::Cases)).unwrap();

    let enriched = enrich_observations(&observations, &[]);
    assert_eq!(enriched.len(), observations.len());
    assert!(enriched.iter().all(|e| e.continent == MISSING));
    assert!(enriched.iter().all(|e| e.population.is_none()));
}

#[test]
fn us_and_global_schemas_share_the_engine() {
    // Same engine handles both schema families; the US table drops its
    // administrative columns and aggregates county rows
    let us_csv = "\
UID,iso2,iso3,code3,FIPS,Admin2,Province_State,Country_Region,Lat,Long_,Combined_Key,3/1/21,3/2/21
84036061,US,USA,840,36061,New York,New York,US,40.7,-74.0,\"New York City, New York, US\",30,60
84036059,US,USA,840,36059,Nassau,New York,US,40.7,-73.6,\"Nassau, New York, US\",10,20
";
    let raw = RawTable::from_csv_str(us_csv).unwrap();
    let observations = melt(&raw, &us_schema(Metric::Cases)).unwrap();

    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].value, 40);
    assert_eq!(observations[1].value, 80);
    assert_eq!(observations[0].province, "New York");
    // Coordinates are not meaningful at state level
    assert_eq!(observations[0].lat, 0.0);
}
