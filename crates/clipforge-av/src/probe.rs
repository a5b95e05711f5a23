//! Source media probing.
//!
//! Planning needs the input's duration (for trim validation and bitrate math)
//! and, optionally, its frame size (so a resize to the same size is skipped).

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clipforge_common::{Error, Result};
use clipforge_plan::Resize;

use crate::command::ToolCommand;

/// What probing learned about a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaInfo {
    /// Container format name as reported by the prober.
    pub format_name: Option<String>,
    pub duration_secs: Option<f64>,
    /// Frame size of the first video stream.
    pub resolution: Option<Resize>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

impl MediaInfo {
    /// Duration, or an error naming `path` when the prober found none.
    pub fn require_duration(&self, path: &Path) -> Result<f64> {
        self.duration_secs.ok_or_else(|| {
            Error::Probe(format!("no duration reported for {}", path.display()))
        })
    }
}

/// Trait for media file probers.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Short name of the backend.
    fn name(&self) -> &'static str;

    /// Inspect the file at `path`.
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self {
            ffprobe_path,
            timeout: Duration::from_secs(60),
        }
    }

    /// Create a prober that finds `program` on `PATH`.
    pub fn on_path(program: &str) -> Result<Self> {
        which::which(program)
            .map(Self::new)
            .map_err(|e| Error::tool("ffprobe", format!("{program} not found in PATH: {e}")))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(self.timeout).args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await?;
        let info = parse_ffprobe_json(&output.stdout)?;
        tracing::debug!(path = %path.display(), ?info, "probed media");
        Ok(info)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Map `ffprobe -print_format json -show_format -show_streams` output.
///
/// The container duration wins; a stream duration is used only when the
/// container reports none.
pub fn parse_ffprobe_json(json: &str) -> Result<MediaInfo> {
    let ff: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let stream_of = |kind: &str| {
        ff.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(kind))
    };
    let video = stream_of("video");
    let audio = stream_of("audio");

    let format_duration = ff
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds);
    let duration_secs = format_duration.or_else(|| {
        ff.streams
            .iter()
            .filter_map(|s| s.duration.as_deref().and_then(parse_seconds))
            .reduce(f64::max)
    });

    let resolution = video.and_then(|v| match (v.width, v.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(Resize::new(w, h)),
        _ => None,
    });

    Ok(MediaInfo {
        format_name: ff.format.as_ref().and_then(|f| f.format_name.clone()),
        duration_secs,
        resolution,
        video_codec: video.and_then(|v| v.codec_name.clone()),
        audio_codec: audio.and_then(|a| a.codec_name.clone()),
    })
}

fn parse_seconds(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}
