//! The declarative transcode request and its invariants.

use serde::{Deserialize, Serialize};
use std::fmt;

use clipforge_common::{CompressionMode, Error, Result, TargetFormat};

/// Highest constant-rate-factor value accepted by x264.
pub const MAX_QUALITY_LEVEL: u8 = 51;

/// Quality level used when nothing else is configured.
pub const DEFAULT_QUALITY_LEVEL: u8 = 23;

/// Target size used when nothing else is configured.
pub const DEFAULT_TARGET_SIZE_MB: f64 = 50.0;

/// A user-selected sub-range of the input, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Output frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

impl Resize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Compression control. Exactly one of quality level or target size is
/// active, selected by the variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Compression {
    /// Constant rate factor in `0..=51`; lower is higher quality.
    Quality { level: u8 },
    /// Target output size in megabytes.
    Size { target_mb: f64 },
}

impl Compression {
    /// The mode tag for this setting.
    pub fn mode(&self) -> CompressionMode {
        match self {
            Self::Quality { .. } => CompressionMode::Quality,
            Self::Size { .. } => CompressionMode::Size,
        }
    }

    /// Build a compression setting from a mode plus both candidate values,
    /// keeping only the one the mode selects.
    pub fn from_mode(mode: CompressionMode, quality_level: u8, target_size_mb: f64) -> Self {
        match mode {
            CompressionMode::Quality => Self::Quality {
                level: quality_level,
            },
            CompressionMode::Size => Self::Size {
                target_mb: target_size_mb,
            },
        }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::Quality {
            level: DEFAULT_QUALITY_LEVEL,
        }
    }
}

/// Everything needed to plan one transcode.
///
/// Built with [`TranscodeRequest::new`] and the chained setters; checked by
/// [`TranscodeRequest::validate`] (which the argument builder always calls).
///
/// # Example
///
/// ```
/// use clipforge_plan::{Resize, TranscodeRequest, TrimWindow};
/// use clipforge_common::TargetFormat;
///
/// let request = TranscodeRequest::new(120.0)
///     .with_trim(TrimWindow::new(10.0, 40.0))
///     .with_format(TargetFormat::Webm)
///     .with_resize(Resize::new(1280, 720));
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeRequest {
    /// Probed duration of the source media.
    pub input_duration_secs: f64,
    /// Sub-range to keep; `None` keeps the entire input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<TrimWindow>,
    /// Output container.
    #[serde(default)]
    pub target_format: TargetFormat,
    /// Output frame size; `None` keeps the source resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<Resize>,
    /// Probed source frame size, when known. A resize equal to it is a no-op.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_resolution: Option<Resize>,
    /// Quality or size targeting.
    #[serde(default)]
    pub compression: Compression,
}

impl TranscodeRequest {
    /// Request covering the whole input, as mp4 at the default quality.
    pub fn new(input_duration_secs: f64) -> Self {
        Self {
            input_duration_secs,
            trim: None,
            target_format: TargetFormat::default(),
            resize: None,
            source_resolution: None,
            compression: Compression::default(),
        }
    }

    pub fn with_trim(mut self, trim: TrimWindow) -> Self {
        self.trim = Some(trim);
        self
    }

    pub fn with_format(mut self, format: TargetFormat) -> Self {
        self.target_format = format;
        self
    }

    pub fn with_resize(mut self, resize: Resize) -> Self {
        self.resize = Some(resize);
        self
    }

    pub fn with_source_resolution(mut self, resolution: Resize) -> Self {
        self.source_resolution = Some(resolution);
        self
    }

    pub fn with_quality(mut self, level: u8) -> Self {
        self.compression = Compression::Quality { level };
        self
    }

    pub fn with_target_size_mb(mut self, target_mb: f64) -> Self {
        self.compression = Compression::Size { target_mb };
        self
    }

    /// The resize to apply, or `None` when absent or equal to the source
    /// resolution.
    pub fn effective_resize(&self) -> Option<Resize> {
        match (self.resize, self.source_resolution) {
            (Some(r), Some(src)) if r == src => None,
            (r, _) => r,
        }
    }

    /// Check every field invariant.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for out-of-range durations, trim bounds,
    ///   dimensions, quality levels or target sizes.
    /// - [`Error::InvalidTrimWindow`] when the window is empty or inverted.
    /// - [`Error::UnsupportedCombination`] when the format has no mapping for
    ///   the requested compression mode.
    pub fn validate(&self) -> Result<()> {
        let duration = self.input_duration_secs;
        if !duration.is_finite() || duration < 0.0 {
            return Err(Error::invalid_request(format!(
                "input duration must be a non-negative number, got {duration}"
            )));
        }

        if let Some(trim) = self.trim {
            if !trim.start.is_finite() || !trim.end.is_finite() {
                return Err(Error::invalid_request("trim bounds must be finite"));
            }
            if trim.end <= trim.start {
                return Err(Error::InvalidTrimWindow {
                    start: trim.start,
                    end: trim.end,
                });
            }
            if trim.start < 0.0 || trim.end > duration {
                return Err(Error::invalid_request(format!(
                    "trim window {}s..{}s lies outside the input (0s..{duration}s)",
                    trim.start, trim.end
                )));
            }
        }

        if let Some(resize) = self.resize {
            if resize.width == 0 || resize.height == 0 {
                return Err(Error::invalid_request(format!(
                    "resize dimensions must be positive, got {resize}"
                )));
            }
        }

        match self.compression {
            Compression::Quality { level } if level > MAX_QUALITY_LEVEL => {
                return Err(Error::invalid_request(format!(
                    "quality level {level} exceeds {MAX_QUALITY_LEVEL}"
                )));
            }
            Compression::Size { target_mb } if !(target_mb.is_finite() && target_mb > 0.0) => {
                return Err(Error::invalid_request(format!(
                    "target size must be a positive number of megabytes, got {target_mb}"
                )));
            }
            _ => {}
        }

        let mode = self.compression.mode();
        if mode == CompressionMode::Size && !self.target_format.supports_size_targeting() {
            return Err(Error::unsupported(self.target_format, mode));
        }

        Ok(())
    }
}
