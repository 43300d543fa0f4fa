//! Cutting a file down to a leading duration.

use std::path::Path;

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::progress::ProgressLog;

/// Build a command keeping the first `max_seconds` of `input`.
///
/// Stream copy keeps every track. Re-encoding yields H.264 video only.
pub fn trim_command(input: &Path, output: &Path, max_seconds: f64, reencode: bool) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(input, output).duration(max_seconds);
    if reencode {
        cmd.video_codec("libx264")
            .preset("veryfast")
            .crf(20)
            .pixel_format("yuv420p")
            .no_audio()
    } else {
        cmd.stream_copy()
    }
}

pub async fn trim_file(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    max_seconds: f64,
    reencode: bool,
) -> MediaResult<()> {
    if !max_seconds.is_finite() || max_seconds <= 0.0 {
        return Err(MediaError::invalid_argument(format!(
            "trim length must be positive, got {}",
            max_seconds
        )));
    }
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    runner
        .run_with_progress(
            &trim_command(input, output, max_seconds, reencode),
            ProgressLog::new("trim", max_seconds).into_callback(),
        )
        .await?;

    info!(max_seconds, reencode, "Trimmed {}", input.display());
    Ok(())
}
