//! Concatenation through the ffmpeg concat demuxer.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{MediaInfo, VideoFormat};

/// Quote a path for a concat list entry.
///
/// The demuxer reads single-quoted strings; an embedded quote is closed,
/// escaped, and reopened.
pub fn escape_concat_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Render the concat list for `files`, one `file` directive per line.
pub fn concat_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| format!("file {}\n", escape_concat_path(f)))
        .collect()
}

/// Where the list file for `output` lives: next to the output.
fn list_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}.concat.txt", stem))
}

/// Build the concat command reading `list`.
///
/// Re-encoding produces H.264 video only; audio is supplied later by a mux.
pub fn concat_command(list: &Path, output: &Path, reencode: bool) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(list, output).concat_demuxer();
    if reencode {
        cmd.video_codec("libx264")
            .preset("veryfast")
            .crf(20)
            .pixel_format("yuv420p")
            .no_audio()
            .faststart()
    } else {
        cmd.stream_copy().faststart()
    }
}

/// Filter graph that letterboxes every frame into `format` and resamples
/// it to `format.fps`.
pub fn normalize_filter(format: &VideoFormat) -> String {
    let (w, h) = (format.width, format.height);
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
        fps = format.fps
    )
}

/// Re-encoding concat whose output is conformed to `format`.
pub fn concat_normalized_command(list: &Path, output: &Path, format: &VideoFormat) -> FfmpegCommand {
    concat_command(list, output, true).video_filter(normalize_filter(format))
}

/// Concatenate `files` in order into `output`.
pub async fn concat_files(
    runner: &FfmpegRunner,
    files: &[PathBuf],
    output: &Path,
    reencode: bool,
) -> MediaResult<()> {
    let list = write_list(files, output).await?;
    runner.run(&concat_command(&list, output, reencode)).await?;

    info!(
        inputs = files.len(),
        reencode,
        "Concatenated into {}",
        output.display()
    );
    Ok(())
}

/// Concatenate `files` in order, re-encoding every frame to `format`.
///
/// Inputs may differ in frame size and rate.
pub async fn concat_files_normalized(
    runner: &FfmpegRunner,
    files: &[PathBuf],
    output: &Path,
    format: &VideoFormat,
) -> MediaResult<()> {
    if format.width == 0 || format.height == 0 {
        return Err(MediaError::invalid_argument(format!(
            "cannot normalize to {}",
            format
        )));
    }
    let list = write_list(files, output).await?;
    runner
        .run(&concat_normalized_command(&list, output, format))
        .await?;

    info!(
        inputs = files.len(),
        %format,
        "Concatenated into {}",
        output.display()
    );
    Ok(())
}

/// Write the concat list for `files` next to `output`.
async fn write_list(files: &[PathBuf], output: &Path) -> MediaResult<PathBuf> {
    if files.is_empty() {
        return Err(MediaError::invalid_argument("nothing to concatenate"));
    }

    // Absolute paths: the demuxer resolves entries relative to the list file.
    let mut absolute = Vec::with_capacity(files.len());
    for file in files {
        if !file.exists() {
            return Err(MediaError::FileNotFound(file.clone()));
        }
        absolute.push(std::path::absolute(file)?);
    }

    let list = list_path_for(output);
    tokio::fs::write(&list, concat_list(&absolute)).await?;
    Ok(list)
}

/// Verify that inputs can be joined with stream copy: one video stream each,
/// same codec and frame size as the first input.
///
/// `infos` are in concat order; errors name the 1-based position.
pub fn check_concat_compatible(infos: &[MediaInfo]) -> MediaResult<()> {
    let mut reference = None;

    for (i, info) in infos.iter().enumerate() {
        let video = info.video.as_ref().ok_or_else(|| {
            MediaError::IncompatibleInputs(format!("input {} has no video stream", i + 1))
        })?;

        match reference {
            None => reference = Some(video),
            Some(first) => {
                if first.codec != video.codec {
                    return Err(MediaError::IncompatibleInputs(format!(
                        "input {} uses codec {} but input 1 uses {}",
                        i + 1,
                        video.codec,
                        first.codec
                    )));
                }
                if (first.width, first.height) != (video.width, video.height) {
                    return Err(MediaError::IncompatibleInputs(format!(
                        "input {} is {}x{} but input 1 is {}x{}",
                        i + 1,
                        video.width,
                        video.height,
                        first.width,
                        first.height
                    )));
                }
            }
        }
    }

    Ok(())
}
