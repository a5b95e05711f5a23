//! Ordered ffmpeg argument lists for a transcode request.

use serde::Serialize;

use clipforge_common::{Result, TargetFormat};

use crate::bitrate::{BitrateEstimator, DEFAULT_AUDIO_BITRATE_KBPS};
use crate::request::{Compression, TranscodeRequest};
use crate::trim;

/// x264 speed/quality preset used when nothing else is configured.
pub const DEFAULT_PRESET: &str = "medium";

/// Fixed constant rate factor for VP9 output.
const WEBM_CRF: u8 = 30;

/// Fixed constant rate factor for avi output.
const AVI_CRF: u8 = 23;

/// The result of planning: engine arguments plus what they select.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentPlan {
    /// Engine arguments, `-i <input>` first and the output path last.
    pub arguments: Vec<String>,
    pub container: TargetFormat,
    pub video_codec: String,
    pub audio_codec: String,
    /// Set only for size-targeted plans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_bitrate_kbps: Option<u32>,
    pub effective_duration_secs: f64,
}

impl ArgumentPlan {
    /// The full command as it would be typed, for logging.
    pub fn command_line(&self) -> String {
        let mut line = String::from("ffmpeg");
        for arg in &self.arguments {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Builds [`ArgumentPlan`]s from [`TranscodeRequest`]s.
///
/// Clause order is fixed: input, trim, scale filter, codec clause, output.
///
/// # Example
///
/// ```
/// use clipforge_plan::{TranscodeArgsBuilder, TranscodeRequest, TrimWindow};
///
/// let request = TranscodeRequest::new(120.0).with_trim(TrimWindow::new(10.0, 40.0));
/// let plan = TranscodeArgsBuilder::default()
///     .build(&request, "input.mp4", "output.mp4")
///     .unwrap();
/// assert_eq!(
///     plan.arguments.join(" "),
///     "-i input.mp4 -ss 10 -to 40 -c:v libx264 -preset medium -crf 23 -c:a aac -b:a 128k output.mp4"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeArgsBuilder {
    preset: String,
    audio_bitrate_kbps: u32,
}

impl Default for TranscodeArgsBuilder {
    fn default() -> Self {
        Self {
            preset: DEFAULT_PRESET.to_string(),
            audio_bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
        }
    }
}

impl TranscodeArgsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the x264 preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Override the audio bitrate; the bitrate estimator uses the same value.
    pub fn with_audio_bitrate_kbps(mut self, kbps: u32) -> Self {
        self.audio_bitrate_kbps = kbps;
        self
    }

    pub fn preset(&self) -> &str {
        &self.preset
    }

    pub fn audio_bitrate_kbps(&self) -> u32 {
        self.audio_bitrate_kbps
    }

    /// Validate `request` and produce its argument plan.
    ///
    /// # Errors
    ///
    /// Any error from [`TranscodeRequest::validate`], or
    /// [`clipforge_common::Error::InvalidDuration`] when a size-targeted
    /// request has a zero effective duration.
    pub fn build(
        &self,
        request: &TranscodeRequest,
        input_path: &str,
        output_path: &str,
    ) -> Result<ArgumentPlan> {
        request.validate()?;
        let effective_duration_secs =
            trim::resolve(request.input_duration_secs, request.trim.as_ref())?;

        let mut args = Args::default();
        args.push("-i").push(input_path);

        if let Some(window) = request.trim {
            if window.start > 0.0 {
                args.push("-ss").push(window.start);
            }
            // A window running to the end of the input needs no stop point.
            if window.end > window.start && window.end < request.input_duration_secs {
                args.push("-to").push(window.end);
            }
        }

        if let Some(resize) = request.effective_resize() {
            args.push("-vf")
                .push(format!("scale={}:{}", resize.width, resize.height));
        }

        let audio_bitrate = format!("{}k", self.audio_bitrate_kbps);
        let mut video_bitrate_kbps = None;
        let (video_codec, audio_codec) = match request.target_format {
            TargetFormat::Mp4 | TargetFormat::Mov | TargetFormat::Mkv => {
                args.push("-c:v")
                    .push("libx264")
                    .push("-preset")
                    .push(&self.preset);
                match request.compression {
                    Compression::Quality { level } => {
                        args.push("-crf").push(level);
                    }
                    Compression::Size { target_mb } => {
                        let kbps = BitrateEstimator::new(self.audio_bitrate_kbps)
                            .estimate(target_mb, effective_duration_secs)?;
                        video_bitrate_kbps = Some(kbps);
                        args.push("-b:v")
                            .push(format!("{kbps}k"))
                            .push("-maxrate")
                            .push(format!("{kbps}k"))
                            .push("-bufsize")
                            .push(format!("{}k", u64::from(kbps) * 2));
                    }
                }
                args.push("-c:a").push("aac").push("-b:a").push(&audio_bitrate);
                ("libx264", "aac")
            }
            TargetFormat::Webm => {
                args.push("-c:v")
                    .push("libvpx-vp9")
                    .push("-crf")
                    .push(WEBM_CRF)
                    .push("-b:v")
                    .push("0")
                    .push("-c:a")
                    .push("libopus")
                    .push("-b:a")
                    .push(&audio_bitrate);
                ("libvpx-vp9", "libopus")
            }
            TargetFormat::Avi => {
                // Size mode was already rejected by validation.
                args.push("-c:v")
                    .push("libx264")
                    .push("-crf")
                    .push(AVI_CRF)
                    .push("-c:a")
                    .push("mp3")
                    .push("-b:a")
                    .push(&audio_bitrate);
                ("libx264", "mp3")
            }
        };

        args.push(output_path);

        let plan = ArgumentPlan {
            arguments: args.0,
            container: request.target_format,
            video_codec: video_codec.to_string(),
            audio_codec: audio_codec.to_string(),
            video_bitrate_kbps,
            effective_duration_secs,
        };
        tracing::debug!(command = %plan.command_line(), "built transcode plan");
        Ok(plan)
    }
}

/// Chainable argument accumulator.
#[derive(Default)]
struct Args(Vec<String>);

impl Args {
    fn push(&mut self, arg: impl ToString) -> &mut Self {
        self.0.push(arg.to_string());
        self
    }
}
