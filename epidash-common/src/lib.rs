//! # Epidash Common Library
//!
//! Shared code for the epidash pipeline:
//! - Canonical data model types (observations, lookup records, metrics)
//! - Database pool initialization and replace-write table helper
//! - Configuration resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
