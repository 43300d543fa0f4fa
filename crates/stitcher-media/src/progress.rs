//! FFmpeg progress parsing.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Progress percentage given the expected output duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).min(100.0)
    }
}

/// Logs an ffmpeg run's progress each time it crosses another tenth of
/// the expected output length.
#[derive(Debug)]
pub(crate) struct ProgressLog {
    label: &'static str,
    total_ms: i64,
    last_decile: AtomicU8,
}

impl ProgressLog {
    pub(crate) fn new(label: &'static str, total_seconds: f64) -> Self {
        Self {
            label,
            total_ms: (total_seconds * 1000.0) as i64,
            last_decile: AtomicU8::new(0),
        }
    }

    /// The newly reached tenth (1..=10), if `progress` crossed one.
    pub(crate) fn advance(&self, progress: &FfmpegProgress) -> Option<u8> {
        let decile = if progress.is_complete {
            10
        } else {
            (progress.percentage(self.total_ms) / 10.0).floor() as u8
        };
        let previous = self.last_decile.fetch_max(decile, Ordering::Relaxed);
        (decile > previous).then_some(decile)
    }

    /// Callback for [`crate::FfmpegRunner::run_with_progress`].
    pub(crate) fn into_callback(self) -> impl Fn(FfmpegProgress) + Send + 'static {
        move |progress| {
            if let Some(decile) = self.advance(&progress) {
                debug!(
                    operation = self.label,
                    percent = u32::from(decile) * 10,
                    speed = progress.speed,
                    "ffmpeg progress"
                );
            }
        }
    }
}

/// Fold one `-progress` line into `current`.
///
/// Returns a snapshot at the end of each progress block.
pub(crate) fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        "out_time_ms" | "out_time_us" => {
            // Both keys carry microseconds despite the name
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return Some(current.clone());
        }
        _ => {}
    }

    None
}
