//! Lip-sync the opening of the audio once, then pad with the looped
//! fallback video until the whole track is covered.

use stitcher_generation::{poll_until_terminal, GenerationApi, PredictionRequest};
use stitcher_media::{MediaError, MuxOptions, VideoFormat};
use stitcher_models::{ArtifactRole, GenerateTask, JobOutput, MediaArtifact, VideoOutput};
use stitcher_storage::{content_type_for, extension_or, DEFAULT_AUDIO_EXTENSION};

use super::plan::{lead_key, remaining_after, unix_millis, LoopPlan};
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
    let full_duration = ctx.media.probe_duration(audio.path()).await?;
    let chunk_duration = task.chunk_duration as f64;

    let lead = ctx.new_artifact(format!("lead.{}", extension), ArtifactRole::Chunk);
    ctx.media
        .trim(audio.path(), lead.path(), chunk_duration, false)
        .await?;

    let key = lead_key(unix_millis(), &extension);
    let lead_url = ctx.upload(&lead, &key, &content_type_for(&key)).await?;
    ctx.check_reachable(&lead_url).await;

    let fallback_url = ctx.config.fallback_video_for(task.video_url.as_deref());
    let version = api.latest_version(&ctx.config.generation_model).await?;
    let prediction = api
        .create_prediction(&PredictionRequest::lip_sync(&version, &fallback_url, &lead_url))
        .await?;
    ctx.logger
        .log_progress(&format!("prediction {} submitted", prediction.id));

    let output_url =
        poll_until_terminal(api, &prediction.id, &ctx.config.single_poll_policy()).await?;
    let generated = ctx
        .fetch_url(&output_url, "generated.mp4", ArtifactRole::Generated)
        .await?;

    let video = match remaining_after(full_duration, chunk_duration) {
        Some(remaining) => extend_with_fallback(ctx, &generated, &fallback_url, remaining).await?,
        None => {
            ctx.logger
                .log_progress("generated clip covers the whole audio");
            generated
        }
    };

    let final_video = ctx.new_artifact("final.mp4", ArtifactRole::Final);
    ctx.media
        .mux(
            video.path(),
            audio.path(),
            final_video.path(),
            MuxOptions {
                reencode_video: true,
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
        prediction_ids: vec![prediction.id],
    }))
}

/// Append the fallback video, looped and cut to exactly `remaining`
/// seconds, after the generated clip.
async fn extend_with_fallback(
    ctx: &JobContext<'_>,
    generated: &MediaArtifact,
    fallback_url: &str,
    remaining: f64,
) -> WorkerResult<MediaArtifact> {
    let fallback = ctx
        .fetch_url(fallback_url, "fallback.mp4", ArtifactRole::Source)
        .await?;
    let fallback_duration = ctx.media.probe_duration(fallback.path()).await?;
    let plan = LoopPlan::new(remaining, fallback_duration)?;
    ctx.logger.log_progress(&format!(
        "filling {:.2}s with {} loop(s) of a {:.2}s fallback",
        plan.remaining, plan.loops, fallback_duration
    ));

    let looped = ctx.new_artifact("fallback_looped.mp4", ArtifactRole::Concatenated);
    let copies = vec![fallback.path().to_path_buf(); plan.loops as usize];
    ctx.media.concat(&copies, looped.path(), true).await?;

    let trimmed = ctx.new_artifact("fallback_trimmed.mp4", ArtifactRole::Concatenated);
    ctx.media
        .trim(looped.path(), trimmed.path(), plan.remaining, true)
        .await?;

    // The fallback is conformed to the generated clip's frame size and rate.
    let format = generated_format(ctx, generated).await?;
    let extended = ctx.new_artifact("extended.mp4", ArtifactRole::Concatenated);
    ctx.media
        .concat_normalized(
            &[generated.path().to_path_buf(), trimmed.path().to_path_buf()],
            extended.path(),
            &format,
        )
        .await?;

    Ok(extended)
}

async fn generated_format(
    ctx: &JobContext<'_>,
    generated: &MediaArtifact,
) -> WorkerResult<VideoFormat> {
    let info = ctx.media.probe_streams(generated.path()).await?;
    let stream = info.video.ok_or_else(|| {
        MediaError::IncompatibleInputs("generated clip has no video stream".to_string())
    })?;
    Ok(VideoFormat::from_stream(&stream))
}
