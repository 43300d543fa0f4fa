//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for job processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stitcher_models::{JobId, JobMode};

/// Where the log stream goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout free for the job result.
    Stderr,
}

/// Install the global subscriber: pretty by default, JSON with
/// `LOG_FORMAT=json`.
pub fn init_tracing(target: LogTarget) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "stitcher=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    let to_stderr = target == LogTarget::Stderr;
    let result = if use_json {
        let layer = fmt::layer().json();
        if to_stderr {
            tracing_subscriber::registry()
                .with(layer.with_writer(std::io::stderr))
                .with(env_filter)
                .try_init()
        } else {
            tracing_subscriber::registry().with(layer).with(env_filter).try_init()
        }
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);
        if to_stderr {
            tracing_subscriber::registry()
                .with(layer.with_ansi(false).with_writer(std::io::stderr))
                .with(env_filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(layer.with_ansi(true))
                .with(env_filter)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("tracing already initialised: {}", e);
    }
}

/// Job logger for structured logging with consistent formatting.
///
/// Every line carries the job id and mode.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    mode: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, mode: JobMode) -> Self {
        Self {
            job_id: job_id.to_string(),
            mode: mode.as_str(),
        }
    }

    /// Logger for events that happen before the mode is known.
    pub fn unparsed(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.to_string(),
            mode: "unknown",
        }
    }

    /// Log the start of a job.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            mode = self.mode,
            "Job started: {}", message
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            mode = self.mode,
            "Job progress: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            mode = self.mode,
            "Job warning: {}", message
        );
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            mode = self.mode,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            mode = self.mode,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            mode = self.mode
        )
    }
}
