//! In-memory raw table
//!
//! The shape of a fetched CSV before normalization: headers exactly as the
//! file claims them, rows as strings. No invariants hold yet.

use crate::{EtlError, EtlResult};

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names, from the source's header row
    pub headers: Vec<String>,
    /// Each data row, one String per field
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV text into a raw table.
    ///
    /// An empty body yields an empty table; ragged rows are padded so that
    /// downstream indexing never panics.
    pub fn from_csv_str(body: &str) -> EtlResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());

        let headers: Vec<String> = match reader.headers() {
            Ok(h) => h.iter().map(|s| s.to_string()).collect(),
            Err(e) => return Err(EtlError::Parse(format!("Invalid CSV header: {}", e))),
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| EtlError::Parse(format!("Invalid CSV row: {}", e)))?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    /// Index of a column by header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column that the source schema requires
    pub fn require_column(&self, name: &str) -> EtlResult<usize> {
        self.column(name)
            .ok_or_else(|| EtlError::Schema(format!("Missing expected column '{}'", name)))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
