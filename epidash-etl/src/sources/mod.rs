//! Source fetchers
//!
//! Pure I/O: each fetcher retrieves one named remote dataset into an
//! in-memory table, with no transform logic beyond CSV/JSON decoding.
//! Any network error, non-2xx response or malformed payload becomes an
//! [`EtlError::Fetch`] carrying the source id, and abandons that source's
//! job only.

pub mod jhu;
pub mod owid;
pub mod uk;

use crate::table::RawTable;
use crate::{EtlError, EtlResult};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str = "epidash/0.1.0";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Shared HTTP client for all fetchers.
///
/// Source APIs may hang; the bounded timeout turns that into a fetch
/// failure instead of blocking the run.
pub fn http_client() -> EtlResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| EtlError::fetch("http_client", e))
}

/// Fetch a CSV document over HTTP into a raw table
pub async fn fetch_csv(
    client: &reqwest::Client,
    source: &'static str,
    url: &str,
) -> EtlResult<RawTable> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| EtlError::fetch(source, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::fetch(
            source,
            format!("HTTP {} from {}", status.as_u16(), url),
        ));
    }

    let body = response.text().await.map_err(|e| EtlError::fetch(source, e))?;
    let table = RawTable::from_csv_str(&body)?;

    info!(source = source, rows = table.len(), "fetched CSV source");

    Ok(table)
}

/// Load the local-authority population reference CSV.
///
/// Expected columns: `code`, `population`; population values may carry
/// thousands separators. Rows with unparseable populations are skipped
/// with a warning rather than failing the reference load.
pub fn load_population_file(path: &Path) -> EtlResult<HashMap<String, i64>> {
    let body = std::fs::read_to_string(path)?;
    let table = RawTable::from_csv_str(&body)?;
    if table.headers.is_empty() {
        return Ok(HashMap::new());
    }

    let code_idx = table.require_column("code")?;
    let pop_idx = table.require_column("population")?;

    let mut populations = HashMap::new();
    for row in &table.rows {
        let code = row[code_idx].trim();
        if code.is_empty() {
            continue;
        }
        let digits: String = row[pop_idx].chars().filter(|c| !matches!(c, ',' | ' ')).collect();
        match digits.parse::<i64>() {
            Ok(population) => {
                populations.insert(code.to_string(), population);
            }
            Err(_) => {
                warn!(code = code, value = %row[pop_idx], "skipping unparseable population");
            }
        }
    }

    info!(
        path = %path.display(),
        areas = populations.len(),
        "loaded population reference"
    );

    Ok(populations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_file_strips_thousands_separators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("populations.csv");
        std::fs::write(
            &path,
            "code,name,population\nE09000032,Wandsworth,\"329,677\"\nE09000033,Westminster,261317\n",
        )
        .unwrap();

        let populations = load_population_file(&path).unwrap();
        assert_eq!(populations.get("E09000032"), Some(&329_677));
        assert_eq!(populations.get("E09000033"), Some(&261_317));
    }

    #[test]
    fn unparseable_population_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("populations.csv");
        std::fs::write(&path, "code,population\nE1,unknown\nE2,100\n").unwrap();

        let populations = load_population_file(&path).unwrap();
        assert_eq!(populations.len(), 1);
        assert_eq!(populations.get("E2"), Some(&100));
    }
}
