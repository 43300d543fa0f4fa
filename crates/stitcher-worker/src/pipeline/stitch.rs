//! Stitch pre-rendered video chunks and lay the audio track under them.

use stitcher_media::{check_concat_compatible, MuxOptions};
use stitcher_models::{ArtifactRole, JobOutput, StitchTask, VideoOutput};
use stitcher_storage::{extension_or, DEFAULT_AUDIO_EXTENSION};

use super::JobContext;
use crate::error::WorkerResult;

pub(super) async fn run(ctx: &JobContext<'_>, task: &StitchTask) -> WorkerResult<JobOutput> {
    let total = task.video_chunks.len();

    let mut chunks = Vec::with_capacity(total);
    for (i, key) in task.video_chunks.iter().enumerate() {
        ctx.logger
            .log_progress(&format!("downloading chunk {}/{}: {}", i + 1, total, key));
        chunks.push(
            ctx.download_key(key, &format!("chunk_{}.mp4", i), ArtifactRole::Source)
                .await?,
        );
    }

    let audio_name = format!("audio.{}", extension_or(&task.audio_key, DEFAULT_AUDIO_EXTENSION));
    let audio = ctx
        .download_key(&task.audio_key, &audio_name, ArtifactRole::Source)
        .await?;

    let mut infos = Vec::with_capacity(total);
    for chunk in &chunks {
        infos.push(ctx.media.probe_streams(chunk.path()).await?);
    }
    check_concat_compatible(&infos)?;

    ctx.logger
        .log_progress(&format!("concatenating {} chunks", total));
    let concatenated = ctx.new_artifact("concatenated.mp4", ArtifactRole::Concatenated);
    let chunk_paths: Vec<_> = chunks.iter().map(|c| c.path().to_path_buf()).collect();
    ctx.media
        .concat(&chunk_paths, concatenated.path(), false)
        .await?;

    let final_video = ctx.new_artifact("final.mp4", ArtifactRole::Final);
    ctx.media
        .mux(
            concatenated.path(),
            audio.path(),
            final_video.path(),
            MuxOptions {
                reencode_video: false,
                shortest: true,
            },
        )
        .await?;

    let video_url = ctx
        .upload(&final_video, &task.output_key, "video/mp4")
        .await?;
    ctx.logger
        .log_progress(&format!("uploaded {}", task.output_key));

    Ok(JobOutput::Video(VideoOutput {
        video_url,
        output_key: task.output_key.clone(),
        prediction_ids: Vec::new(),
    }))
}
