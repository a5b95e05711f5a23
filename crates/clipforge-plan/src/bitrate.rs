//! Video bitrate for size-targeted compression.
//!
//! The whole budget is `target_size_mb * 1024 * 8` kilobits spread over the
//! effective duration; the audio bitrate is subtracted and the remainder is
//! floored, then clamped to a fixed minimum so very small targets still
//! produce watchable output.

use clipforge_common::{Error, Result};

/// Audio bitrate assumed by the size budget, in kbps.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 128;

/// Absolute lower bound on the computed video bitrate, in kbps.
pub const MIN_VIDEO_BITRATE_KBPS: u32 = 100;

/// Compute the video bitrate (kbps) that makes `target_size_mb` of output over
/// `effective_duration_secs`, leaving room for `audio_bitrate_kbps`.
///
/// # Errors
///
/// Returns [`Error::InvalidDuration`] if the duration is not a positive,
/// finite number.
///
/// # Example
///
/// ```
/// use clipforge_plan::bitrate::estimate_video_bitrate;
///
/// // (50 * 1024 * 8) / 300 = 1365.33, minus 128 audio, floored.
/// assert_eq!(estimate_video_bitrate(50.0, 300.0, 128).unwrap(), 1237);
/// ```
pub fn estimate_video_bitrate(
    target_size_mb: f64,
    effective_duration_secs: f64,
    audio_bitrate_kbps: u32,
) -> Result<u32> {
    BitrateEstimator::new(audio_bitrate_kbps).estimate(target_size_mb, effective_duration_secs)
}

/// Size-to-bitrate calculator with a configurable audio share and floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitrateEstimator {
    audio_bitrate_kbps: u32,
    floor_kbps: u32,
}

impl Default for BitrateEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_BITRATE_KBPS)
    }
}

impl BitrateEstimator {
    /// Estimator with the given audio bitrate and the standard 100 kbps floor.
    pub fn new(audio_bitrate_kbps: u32) -> Self {
        Self {
            audio_bitrate_kbps,
            floor_kbps: MIN_VIDEO_BITRATE_KBPS,
        }
    }

    /// Audio bitrate subtracted from the budget.
    pub fn audio_bitrate_kbps(&self) -> u32 {
        self.audio_bitrate_kbps
    }

    /// See [`estimate_video_bitrate`].
    pub fn estimate(&self, target_size_mb: f64, effective_duration_secs: f64) -> Result<u32> {
        if !(effective_duration_secs.is_finite() && effective_duration_secs > 0.0) {
            return Err(Error::InvalidDuration(effective_duration_secs));
        }

        let target_kb = target_size_mb * 1024.0;
        let total_kbps = (target_kb * 8.0) / effective_duration_secs;
        let video_kbps = (total_kbps - f64::from(self.audio_bitrate_kbps)).floor();

        // Float-to-int `as` saturates, so huge budgets cap at u32::MAX and
        // negative ones land at 0 before the floor applies.
        let bitrate = (video_kbps as u32).max(self.floor_kbps);
        tracing::debug!(
            target_size_mb,
            effective_duration_secs,
            total_kbps,
            bitrate,
            "estimated video bitrate"
        );
        Ok(bitrate)
    }
}
