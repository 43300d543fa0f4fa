//! Object key naming and the fallback loop arithmetic.

use stitcher_media::MediaError;

use crate::error::WorkerResult;

/// Milliseconds since the Unix epoch, used to keep uploaded keys unique.
pub fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Key of the `index`-th (1-based) audio chunk of a split.
pub fn chunk_key(millis: i64, index: usize, extension: &str) -> String {
    format!("audio/chunks/{}-chunk-{}.{}", millis, index, extension)
}

/// Key of the leading sub-clip sent to the generation API.
pub fn lead_key(millis: i64, extension: &str) -> String {
    format!("audio/lipsync/{}-lead.{}", millis, extension)
}

/// Audio left over after the generated clip, or `None` when the clip
/// already covers the whole track.
pub fn remaining_after(full_duration: f64, chunk_duration: f64) -> Option<f64> {
    if full_duration > chunk_duration {
        Some(full_duration - chunk_duration)
    } else {
        None
    }
}

/// How the fallback video is repeated to fill the remaining audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPlan {
    /// Seconds of video still needed
    pub remaining: f64,
    /// Copies of the fallback to concatenate before trimming to `remaining`
    pub loops: u32,
}

impl LoopPlan {
    /// Shortest fallback clip worth looping, in seconds.
    pub const MIN_FALLBACK_SECONDS: f64 = 0.5;
    /// Upper bound on concatenated copies of the fallback.
    pub const MAX_LOOPS: u32 = 500;

    pub fn new(remaining: f64, fallback_duration: f64) -> WorkerResult<Self> {
        if !fallback_duration.is_finite() || fallback_duration < Self::MIN_FALLBACK_SECONDS {
            return Err(MediaError::invalid_media(format!(
                "fallback video has unusable duration {}",
                fallback_duration
            ))
            .into());
        }

        let loops = (remaining / fallback_duration).floor() + 1.0;
        if !loops.is_finite() || loops > Self::MAX_LOOPS as f64 {
            return Err(MediaError::invalid_media(format!(
                "filling {:.2}s with a {:.2}s fallback needs more than {} loops",
                remaining,
                fallback_duration,
                Self::MAX_LOOPS
            ))
            .into());
        }

        Ok(Self {
            remaining,
            loops: (loops as u32).max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        assert_eq!(chunk_key(1700000000000, 1, "mp3"), "audio/chunks/1700000000000-chunk-1.mp3");
        assert_eq!(lead_key(42, "wav"), "audio/lipsync/42-lead.wav");
    }

    #[test]
    fn test_remaining_after() {
        assert_eq!(remaining_after(20.0, 25.0), None);
        assert_eq!(remaining_after(25.0, 25.0), None);
        assert_eq!(remaining_after(40.0, 25.0), Some(15.0));
    }

    #[test]
    fn test_loop_counts() {
        assert_eq!(LoopPlan::new(15.0, 10.0).unwrap().loops, 2);
        assert_eq!(LoopPlan::new(15.0, 15.0).unwrap().loops, 2);
        assert_eq!(LoopPlan::new(15.0, 20.0).unwrap().loops, 1);
        assert_eq!(LoopPlan::new(65.0, 6.0).unwrap().loops, 11);

        let plan = LoopPlan::new(12.5, 4.0).unwrap();
        assert_eq!(plan.remaining, 12.5);
        assert!(plan.loops as f64 * 4.0 >= plan.remaining);
    }

    #[test]
    fn test_unusable_fallback_duration() {
        assert!(LoopPlan::new(10.0, 0.0).is_err());
        assert!(LoopPlan::new(10.0, f64::NAN).is_err());
        assert!(LoopPlan::new(10.0, 0.04).is_err());
    }

    #[test]
    fn test_loop_count_is_bounded() {
        assert_eq!(LoopPlan::new(249.0, 0.5).unwrap().loops, 499);

        let err = LoopPlan::new(3600.0, 1.0).unwrap_err();
        assert_eq!(err.kind(), "media");
        assert!(err.to_string().contains("more than 500 loops"), "{}", err);
        assert!(LoopPlan::new(f64::INFINITY, 8.0).is_err());
    }

    #[test]
    fn test_unix_millis_is_recent() {
        assert!(unix_millis() > 1_600_000_000_000);
    }
}
