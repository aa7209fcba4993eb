//! # Epidash ETL
//!
//! Recurring batch pipeline behind the epidash dashboard. Each run:
//! 1. Fetches the raw epidemiological time-series (JHU CSVs, the UK
//!    coronavirus REST API, the OWID vaccination CSV)
//! 2. Reshapes wide date-columnar tables into long per-date rows under a
//!    canonical schema
//! 3. Persists every normalized dataset to the relational store with
//!    replace-write semantics
//! 4. Builds the aggregate views the dashboard reads (daily rollups,
//!    trajectory alignment, geo snapshots, UK weekly rates, vaccination
//!    rollups) and publishes each as a store table plus a CSV snapshot
//!
//! Source jobs and view jobs are independent: one failure is recorded in
//! the run summary without aborting its siblings.

pub mod enrich;
pub mod error;
pub mod jobs;
pub mod normalize;
pub mod publish;
pub mod sources;
pub mod store;
pub mod table;
pub mod views;

pub use error::{EtlError, EtlResult};
