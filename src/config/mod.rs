mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clipforge_av::{EngineLoader, EngineSource, FfmpegSource, FfprobeProber};
use clipforge_plan::request::MAX_QUALITY_LEVEL;
use clipforge_plan::TranscodeArgsBuilder;

/// Locations searched, in order, when no config file is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./clipforge.toml",
    "~/.config/clipforge/config.toml",
    "/etc/clipforge/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for warning in validate_config(&config)? {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// First existing file among [`DEFAULT_CONFIG_PATHS`].
pub fn find_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS.iter().find_map(|path_str| {
        let path = PathBuf::from(shellexpand::tilde(path_str).as_ref());
        path.exists().then_some(path)
    })
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match find_config_path() {
        Some(path) => load_config(&path),
        None => Ok(Config::default()),
    }
}

/// Validate configuration.
///
/// Hard errors are returned as `Err`; recoverable oddities come back as
/// warning messages.
pub fn validate_config(config: &Config) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if config.engine.sources.is_empty() {
        anyhow::bail!("At least one engine source must be configured");
    }
    for source in &config.engine.sources {
        match (&source.path, &source.program) {
            (Some(_), Some(_)) => anyhow::bail!(
                "Engine source '{}' sets both path and program",
                source.name
            ),
            (None, None) => anyhow::bail!(
                "Engine source '{}' needs either a path or a program",
                source.name
            ),
            (Some(path), None) if !path.exists() => {
                warnings.push(format!(
                    "Engine source '{}' path does not exist: {:?}",
                    source.name, path
                ));
            }
            _ => {}
        }
    }
    if config.engine.timeout_secs == 0 {
        anyhow::bail!("Engine timeout cannot be 0");
    }
    if config.engine.probe_program.trim().is_empty() {
        anyhow::bail!("Probe program cannot be empty");
    }
    if config.engine.probe_timeout_secs == 0 {
        anyhow::bail!("Probe timeout cannot be 0");
    }

    let encoding = &config.encoding;
    if encoding.preset.trim().is_empty() {
        anyhow::bail!("Encoding preset cannot be empty");
    }
    if encoding.audio_bitrate_kbps == 0 {
        anyhow::bail!("Audio bitrate cannot be 0");
    }
    if encoding.default_quality > MAX_QUALITY_LEVEL {
        anyhow::bail!(
            "Default quality {} exceeds {}",
            encoding.default_quality,
            MAX_QUALITY_LEVEL
        );
    }
    if !(encoding.default_target_size_mb.is_finite() && encoding.default_target_size_mb > 0.0) {
        anyhow::bail!("Default target size must be a positive number of megabytes");
    }
    if let Some(dir) = &encoding.output_dir {
        if !dir.is_dir() {
            warnings.push(format!("Output directory does not exist: {:?}", dir));
        }
    }

    Ok(warnings)
}

impl EngineConfig {
    /// Engine sources in configured order.
    pub fn sources(&self) -> Vec<Box<dyn EngineSource>> {
        let timeout = Duration::from_secs(self.timeout_secs);
        self.sources
            .iter()
            .map(|s| {
                let source = match (&s.path, &s.program) {
                    (Some(path), _) => FfmpegSource::at_path(&s.name, path),
                    (None, Some(program)) => FfmpegSource::on_path(&s.name, program),
                    (None, None) => FfmpegSource::on_path(&s.name, "ffmpeg"),
                };
                Box::new(source.with_timeout(timeout)) as Box<dyn EngineSource>
            })
            .collect()
    }

    /// A loader over [`sources`](Self::sources). Nothing is loaded yet.
    pub fn loader(&self) -> EngineLoader {
        EngineLoader::new(self.sources())
    }

    /// The configured prober, located on `PATH` (or at an absolute path).
    pub fn prober(&self) -> Result<FfprobeProber> {
        let prober = FfprobeProber::on_path(&self.probe_program)?;
        Ok(prober.with_timeout(Duration::from_secs(self.probe_timeout_secs)))
    }
}

impl EncodingConfig {
    /// Argument builder using the configured preset and audio bitrate.
    pub fn args_builder(&self) -> TranscodeArgsBuilder {
        TranscodeArgsBuilder::new()
            .with_preset(&self.preset)
            .with_audio_bitrate_kbps(self.audio_bitrate_kbps)
    }
}
