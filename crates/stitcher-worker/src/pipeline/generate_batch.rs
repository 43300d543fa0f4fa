//! Lip-sync every chunk of the audio separately and join the results.

use stitcher_generation::{poll_all, GenerationApi, PredictionRequest};
use stitcher_media::MuxOptions;
use stitcher_models::{ArtifactRole, GenerateTask, JobOutput, VideoOutput};
use stitcher_storage::{extension_or, DEFAULT_AUDIO_EXTENSION};

use super::split_audio::split_and_upload;
use super::JobContext;
use crate::error::WorkerResult;

pub(super) async fn run(
    ctx: &JobContext<'_>,
    api: &dyn GenerationApi,
    task: &GenerateTask,
) -> WorkerResult<JobOutput> {
    let extension = extension_or(&task.audio_key, DEFAULT_AUDIO_EXTENSION);
    let audio = ctx
        .download_key(
            &task.audio_key,
            &format!("source.{}", extension),
            ArtifactRole::Source,
        )
        .await?;

    let chunks = split_and_upload(ctx, &audio, task.chunk_duration, &extension).await?;
    for (_, url) in &chunks {
        ctx.check_reachable(url).await;
    }

    let fallback_url = ctx.config.fallback_video_for(task.video_url.as_deref());
    let version = api.latest_version(&ctx.config.generation_model).await?;
    let requests: Vec<PredictionRequest> = chunks
        .iter()
        .map(|(_, url)| PredictionRequest::lip_sync(&version, &fallback_url, url))
        .collect();

    let prediction_ids = ctx.config.batch_submitter().submit_all(api, &requests).await?;
    ctx.logger.log_progress(&format!(
        "submitted {} predictions",
        prediction_ids.len()
    ));

    let outputs = poll_all(api, &prediction_ids, &ctx.config.batch_poll_policy()).await?;

    let mut generated = Vec::with_capacity(outputs.len());
    for (i, url) in outputs.iter().enumerate() {
        let clip = ctx
            .fetch_url(url, &format!("generated_{}.mp4", i), ArtifactRole::Generated)
            .await?;
        generated.push(clip.path().to_path_buf());
    }

    let concatenated = ctx.new_artifact("concatenated.mp4", ArtifactRole::Concatenated);
    ctx.media
        .concat(&generated, concatenated.path(), false)
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

    Ok(JobOutput::Video(VideoOutput {
        video_url,
        output_key: task.output_key.clone(),
        prediction_ids,
    }))
}
