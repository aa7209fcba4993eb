//! Job runner
//!
//! A pipeline run is a sequence of named independent jobs. Each job's
//! failure is captured into a tagged outcome instead of crossing job
//! boundaries, so one source or view going down never aborts its
//! siblings. The run summary reports every job with its duration and row
//! count; the process outcome is non-zero when anything failed, but every
//! job is always attempted.

use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::{EtlError, EtlResult};

/// Outcome of one named job
#[derive(Debug)]
pub struct JobOutcome {
    pub name: &'static str,
    /// Rows written on success, the captured cause on failure
    pub result: Result<u64, EtlError>,
    pub duration: Duration,
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run one job, capturing its result and duration
pub async fn run_job<F, Fut>(name: &'static str, job: F) -> JobOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = EtlResult<u64>>,
{
    info!(job = name, "starting job");
    let start = Instant::now();
    let result = job().await;
    let duration = start.elapsed();

    match &result {
        Ok(rows) => info!(
            job = name,
            rows = rows,
            elapsed_ms = duration.as_millis() as u64,
            "job succeeded"
        ),
        Err(e) => error!(
            job = name,
            elapsed_ms = duration.as_millis() as u64,
            error = %e,
            "job failed"
        ),
    }

    JobOutcome {
        name,
        result,
        duration,
    }
}

/// Aggregated outcomes of a full run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<JobOutcome>,
}

impl RunSummary {
    pub fn push(&mut self, outcome: JobOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    pub fn all_ok(&self) -> bool {
        self.failed() == 0
    }

    /// Log the per-job report
    pub fn log(&self) {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(rows) => info!(
                    "✓ {} ({} rows in {:.2}s)",
                    outcome.name,
                    rows,
                    outcome.duration.as_secs_f64()
                ),
                Err(e) => error!("✗ {} failed: {}", outcome.name, e),
            }
        }
        info!(
            "{}/{} jobs succeeded",
            self.outcomes.len() - self.failed(),
            self.outcomes.len()
        );
    }
}
