//! Fixed-length segmentation with the ffmpeg segment muxer.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Output pattern for segments: `{prefix}_%03d.{ext}` inside `out_dir`.
fn segment_pattern(out_dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    out_dir.join(format!("{}_%03d.{}", prefix, extension))
}

/// Build the segment command. Streams are copied and every piece starts at
/// timestamp zero.
pub fn segment_command(input: &Path, seconds: u32, pattern: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, pattern).output_args([
        "-f".to_string(),
        "segment".to_string(),
        "-segment_time".to_string(),
        seconds.to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-reset_timestamps".to_string(),
        "1".to_string(),
    ])
}

/// Sequence number of a segment file name produced for `prefix`.
fn segment_index(name: &str, prefix: &str, extension: &str) -> Option<u32> {
    name.strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(extension)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Split `input` into `seconds`-long pieces in `out_dir`.
///
/// Returns the pieces ordered by sequence number. The last piece may be
/// shorter.
pub async fn segment_file(
    runner: &FfmpegRunner,
    input: &Path,
    seconds: u32,
    out_dir: &Path,
    prefix: &str,
) -> MediaResult<Vec<PathBuf>> {
    if seconds == 0 {
        return Err(MediaError::invalid_argument("segment length must be at least 1 second"));
    }
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp3")
        .to_string();

    tokio::fs::create_dir_all(out_dir).await?;
    let pattern = segment_pattern(out_dir, prefix, &extension);
    runner.run(&segment_command(input, seconds, &pattern)).await?;

    let mut pieces = collect_segments(out_dir, prefix, &extension).await?;
    if pieces.is_empty() {
        return Err(MediaError::invalid_media(format!(
            "segmenting {} produced no output",
            input.display()
        )));
    }
    pieces.sort_by_key(|(index, _)| *index);

    info!(pieces = pieces.len(), seconds, "Segmented {}", input.display());
    Ok(pieces.into_iter().map(|(_, path)| path).collect())
}

async fn collect_segments(
    out_dir: &Path,
    prefix: &str,
    extension: &str,
) -> MediaResult<Vec<(u32, PathBuf)>> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(out_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if let Some(index) = segment_index(&name.to_string_lossy(), prefix, extension) {
            found.push((index, entry.path()));
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_command_args() {
        let args = segment_command(
            Path::new("/w/audio.mp3"),
            10,
            &segment_pattern(Path::new("/w/chunks"), "chunk", "mp3"),
        )
        .build_args();

        assert!(args.windows(2).any(|w| w == ["-segment_time", "10"]));
        assert!(args.windows(2).any(|w| w == ["-reset_timestamps", "1"]));
        assert_eq!(args.last().map(String::as_str), Some("/w/chunks/chunk_%03d.mp3"));
    }

    #[test]
    fn test_segment_index() {
        assert_eq!(segment_index("chunk_000.mp3", "chunk", "mp3"), Some(0));
        assert_eq!(segment_index("chunk_012.mp3", "chunk", "mp3"), Some(12));
        assert_eq!(segment_index("chunk_1000.mp3", "chunk", "mp3"), Some(1000));
        assert_eq!(segment_index("chunk_001.wav", "chunk", "mp3"), None);
        assert_eq!(segment_index("other_001.mp3", "chunk", "mp3"), None);
    }

    #[tokio::test]
    async fn test_collect_segments_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["chunk_002.mp3", "chunk_000.mp3", "chunk_010.mp3", "audio.mp3"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let mut found = collect_segments(dir.path(), "chunk", "mp3").await.unwrap();
        found.sort_by_key(|(i, _)| *i);
        let indices: Vec<u32> = found.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2, 10]);
    }

    #[tokio::test]
    async fn test_zero_length_rejected() {
        let runner = FfmpegRunner::new();
        let err = segment_file(&runner, Path::new("a.mp3"), 0, Path::new("/tmp"), "chunk")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidArgument(_)));
    }
}
