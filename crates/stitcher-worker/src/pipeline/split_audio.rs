//! Split an audio file into fixed-length chunks and upload each one.

use stitcher_models::{ArtifactRole, ChunksOutput, JobOutput, MediaArtifact, SplitAudioTask};
use stitcher_storage::{content_type_for, extension_or, DEFAULT_AUDIO_EXTENSION};

use super::plan::{chunk_key, unix_millis};
use super::JobContext;
use crate::error::WorkerResult;

pub(super) async fn run(ctx: &JobContext<'_>, task: &SplitAudioTask) -> WorkerResult<JobOutput> {
    let extension = extension_or(&task.audio_key, DEFAULT_AUDIO_EXTENSION);
    let source = ctx
        .download_key(
            &task.audio_key,
            &format!("source.{}", extension),
            ArtifactRole::Source,
        )
        .await?;

    let uploaded = split_and_upload(ctx, &source, task.chunk_duration, &extension).await?;
    let (chunk_keys, chunk_urls) = uploaded.into_iter().unzip();

    Ok(JobOutput::Chunks(ChunksOutput {
        chunk_urls,
        chunk_keys,
    }))
}

/// Segment `source` and upload the pieces in order. Returns `(key, url)`
/// pairs in sequence order.
pub(super) async fn split_and_upload(
    ctx: &JobContext<'_>,
    source: &MediaArtifact,
    chunk_duration: u32,
    extension: &str,
) -> WorkerResult<Vec<(String, String)>> {
    let out_dir = ctx.workdir.subdir("chunks").await?;
    let pieces = ctx
        .media
        .segment(source.path(), chunk_duration, &out_dir, "chunk")
        .await?;
    ctx.logger.log_progress(&format!(
        "split into {} chunks of up to {}s",
        pieces.len(),
        chunk_duration
    ));

    let millis = unix_millis();
    let mut uploaded = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.into_iter().enumerate() {
        let key = chunk_key(millis, i + 1, extension);
        let artifact = MediaArtifact::new(piece, ArtifactRole::Chunk);
        let url = ctx.upload(&artifact, &key, &content_type_for(&key)).await?;
        uploaded.push((key, url));
    }

    Ok(uploaded)
}
