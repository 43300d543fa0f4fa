//! Job metrics. Nothing here installs a recorder; without one every call is
//! a no-op.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "stitcher_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "stitcher_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "stitcher_job_duration_seconds";
    pub const UPLOADS_TOTAL: &str = "stitcher_uploads_total";
}

pub fn record_job_completed(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_failed(mode: &str, kind: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string()), ("kind", kind.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
    let mode_label = [("mode", mode.to_string())];
    histogram!(names::JOB_DURATION_SECONDS, &mode_label).record(duration_secs);
}

pub fn record_upload(mode: &str) {
    counter!(names::UPLOADS_TOTAL, "mode" => mode.to_string()).increment(1);
}
