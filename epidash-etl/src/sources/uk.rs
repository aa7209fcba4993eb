//! UK coronavirus REST API client
//!
//! Unlike the JHU CSVs this source is a filterable JSON API: the request
//! names the records wanted (`filters`) and a projection map from response
//! field to upstream metric (`structure`). Results arrive already in long
//! format, page by page.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{EtlError, EtlResult};

const UK_API_URL: &str = "https://api.coronavirus.data.gov.uk/v1/data";

/// Source id for error reports and the store table
pub const SOURCE_ID: &str = "uk_local_cases";

/// Area type filter: lower-tier local authorities
const AREA_TYPE: &str = "ltla";

/// One local-authority row as the API returns it
#[derive(Debug, Clone, Deserialize)]
pub struct UkCaseRow {
    pub date: String,
    #[serde(rename = "areaCode")]
    pub area_code: String,
    #[serde(rename = "areaName")]
    pub area_name: String,
    #[serde(rename = "newCases")]
    pub new_cases: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UkPage {
    data: Vec<UkCaseRow>,
    pagination: Option<UkPagination>,
}

#[derive(Debug, Deserialize)]
struct UkPagination {
    next: Option<String>,
}

/// Client for the UK coronavirus data API
pub struct UkApiClient {
    http_client: reqwest::Client,
}

impl UkApiClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Fetch the full daily-cases series for every lower-tier local
    /// authority, following pagination until the API reports no next page
    /// (or answers 204 No Content).
    pub async fn fetch_local_authority_cases(&self) -> EtlResult<Vec<UkCaseRow>> {
        // Projection from response field to upstream metric name
        let structure = json!({
            "date": "date",
            "areaCode": "areaCode",
            "areaName": "areaName",
            "newCases": "newCasesByPublishDate",
        })
        .to_string();

        let filters = format!("areaType={}", AREA_TYPE);

        let mut rows = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self
                .http_client
                .get(UK_API_URL)
                .query(&[
                    ("filters", filters.as_str()),
                    ("structure", structure.as_str()),
                    ("format", "json"),
                    ("page", &page.to_string()),
                ])
                .send()
                .await
                .map_err(|e| EtlError::fetch(SOURCE_ID, e))?;

            let status = response.status();

            // 204 marks the end of the data set
            if status.as_u16() == 204 {
                break;
            }
            if !status.is_success() {
                return Err(EtlError::fetch(
                    SOURCE_ID,
                    format!("HTTP {} on page {}", status.as_u16(), page),
                ));
            }

            let body: UkPage = response
                .json()
                .await
                .map_err(|e| EtlError::fetch(SOURCE_ID, format!("page {}: {}", page, e)))?;

            debug!(page = page, rows = body.data.len(), "fetched UK API page");
            rows.extend(body.data);

            match body.pagination.and_then(|p| p.next) {
                Some(_) => page += 1,
                None => break,
            }
        }

        info!(source = SOURCE_ID, rows = rows.len(), "fetched UK local authority cases");

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_deserializes_api_shape() {
        let body = r#"{
            "length": 2,
            "data": [
                {"date": "2021-03-01", "areaCode": "E09000032", "areaName": "Wandsworth", "newCases": 12},
                {"date": "2021-03-01", "areaCode": "E09000033", "areaName": "Westminster", "newCases": null}
            ],
            "pagination": {"next": null}
        }"#;
        let page: UkPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].area_code, "E09000032");
        assert_eq!(page.data[1].new_cases, None);
        assert!(page.pagination.unwrap().next.is_none());
    }
}
