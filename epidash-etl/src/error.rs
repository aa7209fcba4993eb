//! Error types for the pipeline
//!
//! Failures are isolated per source and per view: the job runner captures
//! these into per-job outcomes instead of letting them cross job
//! boundaries.

use thiserror::Error;

/// Result type for pipeline operations
pub type EtlResult<T> = std::result::Result<T, EtlError>;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum EtlError {
    /// Network/HTTP failure while retrieving a source
    #[error("Fetch failed for source '{source_id}': {cause}")]
    Fetch {
        source_id: &'static str,
        cause: String,
    },

    /// Malformed date or numeric field in a source payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unexpected or missing column in a source payload
    #[error("Schema error: {0}")]
    Schema(String),

    /// Aggregate view computation failure
    #[error("View '{view}' failed to build: {cause}")]
    ViewBuild { view: &'static str, cause: String },

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// epidash-common error
    #[error("Common error: {0}")]
    Common(#[from] epidash_common::Error),
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        EtlError::Parse(err.to_string())
    }
}

impl EtlError {
    /// Wrap a fetch failure with the owning source id
    pub fn fetch(source_id: &'static str, cause: impl std::fmt::Display) -> Self {
        EtlError::Fetch {
            source_id,
            cause: cause.to_string(),
        }
    }

    /// Wrap a view computation failure with the view name
    pub fn view_build(view: &'static str, cause: impl std::fmt::Display) -> Self {
        EtlError::ViewBuild {
            view,
            cause: cause.to_string(),
        }
    }
}
