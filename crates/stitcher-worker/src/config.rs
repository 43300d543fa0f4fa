//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use stitcher_generation::{BatchSubmitter, PollPolicy, ReplicateConfig};
use stitcher_storage::FetchConfig;

use crate::error::{WorkerError, WorkerResult};

/// Video lip-synced when neither the job nor the environment names one.
pub const DEFAULT_FALLBACK_VIDEO_URL: &str = "https://blob.santagram.app/hero/hero.mp4";

/// Lip-sync model on Replicate.
pub const DEFAULT_GENERATION_MODEL: &str = "kwaivgi/kling-lip-sync";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root under which each job gets its own scratch directory
    pub work_dir: PathBuf,
    /// Delay between prediction status checks
    pub poll_interval: Duration,
    /// Poll budget for the single-prediction mode
    pub max_polls_single: u32,
    /// Poll budget per prediction in batch mode
    pub max_polls_batch: u32,
    /// Submissions between pauses in batch mode
    pub batch_burst_size: usize,
    /// Pause between submission bursts
    pub batch_pause: Duration,
    /// Generation model (`owner/name`)
    pub generation_model: String,
    /// Generation API base URL
    pub generation_api_url: String,
    /// Fallback video used when the job does not supply `video_url`
    pub fallback_video_url: Option<String>,
    /// Kill ffmpeg after this many seconds
    pub ffmpeg_timeout_secs: u64,
    /// Timeout for API requests
    pub http_timeout: Duration,
    /// Timeout for one media transfer: URL downloads and R2 GET/PUT
    pub download_timeout: Duration,
    /// HTTP adapter bind host
    pub server_host: String,
    /// HTTP adapter bind port
    pub server_port: u16,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/stitcher"),
            poll_interval: PollPolicy::DEFAULT_INTERVAL,
            max_polls_single: 300,
            max_polls_batch: 120,
            batch_burst_size: 5,
            batch_pause: Duration::from_millis(2000),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            generation_api_url: "https://api.replicate.com/v1".to_string(),
            fallback_video_url: None,
            ffmpeg_timeout_secs: 900,
            http_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(300),
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            poll_interval: Duration::from_secs(
                std::env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            max_polls_single: std::env::var("MAX_POLLS_SINGLE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_polls_single),
            max_polls_batch: std::env::var("MAX_POLLS_BATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_polls_batch),
            batch_burst_size: std::env::var("BATCH_BURST_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.batch_burst_size),
            batch_pause: Duration::from_millis(
                std::env::var("BATCH_PAUSE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            generation_model: std::env::var("GENERATION_MODEL")
                .unwrap_or(defaults.generation_model),
            generation_api_url: std::env::var("GENERATION_API_URL")
                .unwrap_or(defaults.generation_api_url),
            fallback_video_url: std::env::var("FALLBACK_VIDEO_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ffmpeg_timeout_secs),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            download_timeout: Duration::from_secs(
                std::env::var("DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Reject settings no job could run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.max_polls_single == 0 || self.max_polls_batch == 0 {
            return Err(WorkerError::config_error("poll budgets must be at least 1"));
        }
        if self.batch_burst_size == 0 {
            return Err(WorkerError::config_error("BATCH_BURST_SIZE must be at least 1"));
        }
        if !matches!(self.generation_model.split_once('/'), Some((o, n)) if !o.is_empty() && !n.is_empty())
        {
            return Err(WorkerError::config_error(format!(
                "GENERATION_MODEL must be owner/name, got '{}'",
                self.generation_model
            )));
        }
        for (name, value) in [
            ("GENERATION_API_URL", Some(self.generation_api_url.as_str())),
            ("FALLBACK_VIDEO_URL", self.fallback_video_url.as_deref()),
        ] {
            if let Some(value) = value {
                url::Url::parse(value).map_err(|e| {
                    WorkerError::config_error(format!("{} is not a URL: {}", name, e))
                })?;
            }
        }
        Ok(())
    }

    /// Fallback video for a job: the job's own URL, then configuration,
    /// then the built-in default.
    pub fn fallback_video_for(&self, requested: Option<&str>) -> String {
        requested
            .or(self.fallback_video_url.as_deref())
            .unwrap_or(DEFAULT_FALLBACK_VIDEO_URL)
            .to_string()
    }

    pub fn single_poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_interval, self.max_polls_single)
    }

    pub fn batch_poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_interval, self.max_polls_batch)
    }

    pub fn batch_submitter(&self) -> BatchSubmitter {
        BatchSubmitter::new(self.batch_burst_size, self.batch_pause)
    }

    pub fn replicate_config(&self) -> ReplicateConfig {
        ReplicateConfig::new(&self.generation_api_url, self.http_timeout)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            download_timeout: self.download_timeout,
            ..FetchConfig::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
