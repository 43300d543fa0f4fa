//! FFmpeg CLI wrapper for the stitcher pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - A runner with timeouts and captured stderr
//! - Probing, segmenting, concatenating, muxing and trimming
//! - The [`MediaToolkit`] trait the pipeline is written against

pub mod command;
pub mod concat;
pub mod error;
pub mod mux;
pub mod probe;
pub mod progress;
pub mod segment;
pub mod toolkit;
pub mod trim;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{check_concat_compatible, concat_list, escape_concat_path, normalize_filter};
pub use error::{MediaError, MediaResult};
pub use mux::MuxOptions;
pub use probe::{probe_duration, probe_media, AudioStream, MediaInfo, VideoFormat, VideoStream};
pub use progress::FfmpegProgress;
pub use toolkit::{FfmpegToolkit, MediaToolkit};
