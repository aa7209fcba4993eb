//! Aggregate view builders
//!
//! Each view is a pure, deterministic query over the normalized store:
//! identical store contents produce identical view output. The builder
//! writes every view twice — as a replace-write store table and as a CSV
//! snapshot — both under the view's name; nothing else writes those
//! names. A view that fails to build is reported as a `ViewBuild` error
//! and does not stop the remaining views.
//!
//! The view phase runs strictly after every source job has finished,
//! because the views read back from the store.

pub mod daily;
pub mod geo;
pub mod local_uk;
pub mod trajectories;
pub mod vaccinations;

use sqlx::SqlitePool;
use std::path::PathBuf;

/// Cumulative case count a region must reach before it enters the
/// trajectory view
pub const CASE_THRESHOLD: i64 = 100;

/// Shared inputs for the view phase
#[derive(Clone)]
pub struct ViewContext {
    pub pool: SqlitePool,
    pub snapshot_dir: PathBuf,
    /// Optional local-authority population reference CSV
    pub population_file: Option<PathBuf>,
}
