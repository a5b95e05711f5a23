use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use clipforge_common::{CompressionMode, TargetFormat};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Engine sources, tried in order until one loads.
    #[serde(default = "default_sources")]
    pub sources: Vec<EngineSourceConfig>,

    /// Maximum time a single encode may run, in seconds (default: 24 hours).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// ffprobe binary used to read input duration and resolution.
    #[serde(default = "default_probe_program")]
    pub probe_program: String,

    /// Maximum time a single probe may run, in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

/// One engine source. Exactly one of `path` or `program` must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSourceConfig {
    pub name: String,

    /// Explicit path to an ffmpeg binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Program name looked up on `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

fn default_sources() -> Vec<EngineSourceConfig> {
    vec![EngineSourceConfig {
        name: "system".to_string(),
        path: None,
        program: Some("ffmpeg".to_string()),
    }]
}

fn default_timeout_secs() -> u64 {
    86_400
}

fn default_probe_program() -> String {
    "ffprobe".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            timeout_secs: default_timeout_secs(),
            probe_program: default_probe_program(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncodingConfig {
    /// x264 preset for mp4/mov/mkv output.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Audio bitrate for every container, also reserved by size targeting.
    #[serde(default = "default_audio_bitrate_kbps")]
    pub audio_bitrate_kbps: u32,

    #[serde(default)]
    pub default_format: TargetFormat,

    /// Compression mode used when the command line picks none.
    #[serde(default)]
    pub default_mode: CompressionMode,

    #[serde(default = "default_quality")]
    pub default_quality: u8,

    #[serde(default = "default_target_size_mb")]
    pub default_target_size_mb: f64,

    /// Where processed files are written; next to the input when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_preset() -> String {
    clipforge_plan::args::DEFAULT_PRESET.to_string()
}

fn default_audio_bitrate_kbps() -> u32 {
    clipforge_plan::bitrate::DEFAULT_AUDIO_BITRATE_KBPS
}

fn default_quality() -> u8 {
    clipforge_plan::request::DEFAULT_QUALITY_LEVEL
}

fn default_target_size_mb() -> f64 {
    clipforge_plan::request::DEFAULT_TARGET_SIZE_MB
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            audio_bitrate_kbps: default_audio_bitrate_kbps(),
            default_format: TargetFormat::default(),
            default_mode: CompressionMode::default(),
            default_quality: default_quality(),
            default_target_size_mb: default_target_size_mb(),
            output_dir: None,
        }
    }
}
