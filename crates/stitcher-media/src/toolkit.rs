//! The media operations a job needs, behind one trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::command::FfmpegRunner;
use crate::concat::{concat_files, concat_files_normalized};
use crate::error::MediaResult;
use crate::mux::{mux_files, MuxOptions};
use crate::probe::{probe_duration, probe_media, MediaInfo, VideoFormat};
use crate::segment::segment_file;
use crate::trim::trim_file;

/// Media operations used by the pipeline.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration of `file` in seconds.
    async fn probe_duration(&self, file: &Path) -> MediaResult<f64>;

    /// Stream layout of `file`.
    async fn probe_streams(&self, file: &Path) -> MediaResult<MediaInfo>;

    /// Split `file` into `seconds`-long pieces inside `out_dir`, in sequence order.
    async fn segment(
        &self,
        file: &Path,
        seconds: u32,
        out_dir: &Path,
        prefix: &str,
    ) -> MediaResult<Vec<PathBuf>>;

    /// Join `files` in order.
    async fn concat(&self, files: &[PathBuf], output: &Path, reencode: bool) -> MediaResult<()>;

    /// Join `files` in order, re-encoding them to one frame size and rate.
    async fn concat_normalized(
        &self,
        files: &[PathBuf],
        output: &Path,
        format: &VideoFormat,
    ) -> MediaResult<()>;

    /// Put the audio of `audio` under the video of `video`.
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        options: MuxOptions,
    ) -> MediaResult<()>;

    /// Keep the first `max_seconds` of `file`.
    async fn trim(
        &self,
        file: &Path,
        output: &Path,
        max_seconds: f64,
        reencode: bool,
    ) -> MediaResult<()>;
}

/// [`MediaToolkit`] backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolkit {
    runner: FfmpegRunner,
}

impl FfmpegToolkit {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    /// Toolkit whose ffmpeg invocations are killed after `secs`.
    pub fn with_timeout(secs: u64) -> Self {
        Self::new(FfmpegRunner::new().with_timeout(secs))
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration(&self, file: &Path) -> MediaResult<f64> {
        let duration = probe_duration(file).await?;
        debug!(duration, "Probed {}", file.display());
        Ok(duration)
    }

    async fn probe_streams(&self, file: &Path) -> MediaResult<MediaInfo> {
        probe_media(file).await
    }

    async fn segment(
        &self,
        file: &Path,
        seconds: u32,
        out_dir: &Path,
        prefix: &str,
    ) -> MediaResult<Vec<PathBuf>> {
        segment_file(&self.runner, file, seconds, out_dir, prefix).await
    }

    async fn concat(&self, files: &[PathBuf], output: &Path, reencode: bool) -> MediaResult<()> {
        concat_files(&self.runner, files, output, reencode).await
    }

    async fn concat_normalized(
        &self,
        files: &[PathBuf],
        output: &Path,
        format: &VideoFormat,
    ) -> MediaResult<()> {
        concat_files_normalized(&self.runner, files, output, format).await
    }

    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        options: MuxOptions,
    ) -> MediaResult<()> {
        mux_files(&self.runner, video, audio, output, options).await
    }

    async fn trim(
        &self,
        file: &Path,
        output: &Path,
        max_seconds: f64,
        reencode: bool,
    ) -> MediaResult<()> {
        trim_file(&self.runner, file, output, max_seconds, reencode).await
    }
}
