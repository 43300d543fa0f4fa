//! Combining a video track with a separate audio track.

use std::path::Path;

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// How the mux treats its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxOptions {
    /// Re-encode video to H.264 instead of copying it.
    pub reencode_video: bool,
    /// End at the shorter of the two tracks.
    pub shortest: bool,
}

impl Default for MuxOptions {
    fn default() -> Self {
        Self {
            reencode_video: false,
            shortest: true,
        }
    }
}

/// Build the mux command: video from the first input, audio from the
/// second, audio always encoded to AAC.
pub fn mux_command(video: &Path, audio: &Path, output: &Path, options: MuxOptions) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(video, output)
        .add_input(audio)
        .map("0:v:0")
        .map("1:a:0");

    let cmd = if options.reencode_video {
        cmd.video_codec("libx264")
            .preset("veryfast")
            .crf(20)
            .pixel_format("yuv420p")
    } else {
        cmd.video_codec("copy")
    };

    let cmd = cmd.audio_codec("aac").audio_bitrate("192k");
    let cmd = if options.shortest { cmd.shortest() } else { cmd };
    cmd.faststart()
}

pub async fn mux_files(
    runner: &FfmpegRunner,
    video: &Path,
    audio: &Path,
    output: &Path,
    options: MuxOptions,
) -> MediaResult<()> {
    for input in [video, audio] {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
    }

    runner.run(&mux_command(video, audio, output, options)).await?;

    info!(
        reencode_video = options.reencode_video,
        shortest = options.shortest,
        "Muxed {}",
        output.display()
    );
    Ok(())
}
