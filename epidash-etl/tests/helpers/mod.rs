//! Test utilities shared by the integration tests

use epidash_common::db::init_pool;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a scratch store.
///
/// Returns (TempDir, SqlitePool) - the TempDir must be kept alive for the
/// duration of the test.
pub async fn create_test_pool() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_epidash.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = init_pool(&url).await.unwrap();
    (temp_dir, pool)
}

/// The two-region, three-date wide cases table used across scenarios:
/// Italy crosses the trajectory threshold on the third date, San Marino
/// never does.
pub const SCENARIO_CASES_CSV: &str = "\
Province/State,Country/Region,Lat,Long,3/1/21,3/2/21,3/3/21
,Italy,41.9,12.6,10,20,150
,San Marino,43.9,12.5,5,15,25
";

/// Matching deaths table for the same regions and dates
pub const SCENARIO_DEATHS_CSV: &str = "\
Province/State,Country/Region,Lat,Long,3/1/21,3/2/21,3/3/21
,Italy,41.9,12.6,1,2,6
,San Marino,43.9,12.5,0,0,1
";

/// Lookup rows matching the scenario regions
pub const SCENARIO_LOOKUP_CSV: &str = "\
UID,iso2,iso3,code3,FIPS,Admin2,Province_State,Country_Region,Lat,Long_,Combined_Key,Population
380,IT,ITA,380,,,,Italy,41.87,12.56,Italy,60461826
674,SM,SMR,674,,,,San Marino,43.94,12.46,San Marino,33931
";
