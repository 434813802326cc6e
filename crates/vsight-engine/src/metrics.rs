//! Job metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_STARTED_TOTAL: &str = "vsight_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vsight_jobs_completed_total";
    pub const JOB_DURATION_SECONDS: &str = "vsight_job_duration_seconds";
}

/// Record a job accepted for execution.
pub fn record_job_started() {
    counter!(names::JOBS_STARTED_TOTAL).increment(1);
}

/// Record a job reaching a terminal state.
pub fn record_job_completed(outcome: &'static str, duration_secs: f64) {
    let labels = [("outcome", outcome)];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}
