//! [`Engine`] implementation backed by the ffmpeg CLI.
//!
//! The scratch space is a private temporary directory; every invocation runs
//! with that directory as its working directory so plan arguments can refer
//! to scratch files by bare name.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use clipforge_common::{Error, Result};

use crate::command::ToolCommand;
use crate::engine::{Engine, EngineEvent};

/// Default encode timeout: 24 hours.
pub const DEFAULT_ENCODE_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Arguments placed before every plan.
const PREAMBLE: &[&str] = &["-hide_banner", "-nostdin", "-y", "-progress", "pipe:2", "-nostats"];

/// Log lines kept for failure messages.
const TAIL_LINES: usize = 32;

/// An ffmpeg binary plus its scratch directory.
pub struct FfmpegEngine {
    program: PathBuf,
    version: Option<String>,
    timeout: Duration,
    scratch: TempDir,
}

impl FfmpegEngine {
    /// Wrap the ffmpeg binary at `program` with a fresh scratch directory.
    ///
    /// The binary is not run here; [`FfmpegSource`](crate::FfmpegSource)
    /// verifies it before constructing the engine.
    pub fn new(program: PathBuf) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("clipforge-")
            .tempdir()
            .map_err(|e| Error::tool("ffmpeg", format!("failed to create scratch dir: {e}")))?;
        Ok(Self {
            program,
            version: None,
            timeout: DEFAULT_ENCODE_TIMEOUT,
            scratch,
        })
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Resolve a scratch file name. Only single plain components are allowed.
    fn scratch_path(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.scratch.path().join(name)),
            _ => Err(Error::invalid_request(format!(
                "scratch file name must be a plain file name, got '{name}'"
            ))),
        }
    }
}

impl std::fmt::Debug for FfmpegEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegEngine")
            .field("program", &self.program)
            .field("version", &self.version)
            .field("scratch", &self.scratch.path())
            .finish()
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    /// First line of `ffmpeg -version`, when it was checked.
    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.scratch_path(name)?;
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote scratch file");
        Ok(())
    }

    async fn exec(
        &self,
        args: &[String],
        on_event: &mut (dyn FnMut(EngineEvent) + Send),
    ) -> Result<()> {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.timeout(self.timeout)
            .current_dir(self.scratch.path())
            .args(PREAMBLE.iter().copied())
            .args(args);

        tracing::info!(program = %self.program.display(), "starting ffmpeg");

        let mut parser = ProgressParser::new(args);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
        let status = cmd
            .execute_streaming(|line| match parser.feed(line) {
                Some(EngineEvent::Log(text)) => {
                    tracing::trace!(line = %text, "ffmpeg");
                    if tail.len() == TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(text.clone());
                    on_event(EngineEvent::Log(text));
                }
                Some(event) => on_event(event),
                None => tracing::trace!(line, "ffmpeg progress key"),
            })
            .await
            .map_err(|e| match e {
                Error::Tool { message, .. } => Error::engine(self.name(), message),
                other => other,
            })?;

        if !status.success() {
            let message = if tail.is_empty() {
                format!("ffmpeg exited with {status}")
            } else {
                Vec::from(tail).join("\n")
            };
            return Err(Error::engine(self.name(), message));
        }

        tracing::info!("ffmpeg finished");
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.scratch_path(name)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Deleting a file that does not exist succeeds.
    async fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.scratch_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress parsing
// ---------------------------------------------------------------------------

/// Turns ffmpeg stderr (log lines interleaved with `-progress` key/value
/// blocks) into [`EngineEvent`]s.
#[derive(Debug, Default)]
struct ProgressParser {
    seek: Option<f64>,
    stop: Option<f64>,
    input_duration: Option<f64>,
    out_time_us: Option<i64>,
}

impl ProgressParser {
    fn new(args: &[String]) -> Self {
        Self {
            seek: option_value(args, "-ss"),
            stop: option_value(args, "-to"),
            ..Self::default()
        }
    }

    /// Seconds of output the invocation should produce, once known.
    fn expected_secs(&self) -> Option<f64> {
        let end = self.stop.or(self.input_duration)?;
        let span = end - self.seek.unwrap_or(0.0);
        (span > 0.0).then_some(span)
    }

    fn feed(&mut self, line: &str) -> Option<EngineEvent> {
        if let Some(value) = line.strip_prefix("out_time_us=") {
            self.out_time_us = value.trim().parse().ok();
            return None;
        }

        if let Some(value) = line.strip_prefix("progress=") {
            let elapsed = self
                .out_time_us
                .filter(|us| *us > 0)
                .map(|us| Duration::from_micros(us as u64))
                .unwrap_or_default();
            let fraction = if value.trim() == "end" {
                1.0
            } else {
                let expected = self.expected_secs()?;
                (elapsed.as_secs_f64() / expected).clamp(0.0, 1.0)
            };
            return Some(EngineEvent::Progress { fraction, elapsed });
        }

        if is_progress_key(line) {
            return None;
        }

        if self.input_duration.is_none() {
            self.input_duration = parse_duration_line(line);
        }
        Some(EngineEvent::Log(line.to_string()))
    }
}

/// `-progress` output is `key=value` with a lowercase identifier key.
fn is_progress_key(line: &str) -> bool {
    match line.split_once('=') {
        Some((key, _)) => {
            !key.is_empty()
                && key
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        }
        None => false,
    }
}

/// Numeric value following `flag` in an argument list.
fn option_value(args: &[String], flag: &str) -> Option<f64> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

/// Seconds from a `  Duration: 00:01:23.45, start: ...` log line.
fn parse_duration_line(line: &str) -> Option<f64> {
    let rest = line.trim_start().strip_prefix("Duration:")?;
    let stamp = rest.split(',').next()?.trim();
    parse_timestamp(stamp)
}

/// `HH:MM:SS(.frac)` to seconds.
fn parse_timestamp(stamp: &str) -> Option<f64> {
    let mut parts = stamp.splitn(3, ':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}
