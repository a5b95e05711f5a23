//! Engine discovery: ordered sources and the memoizing loader.
//!
//! An [`EngineLoader`] tries its [`EngineSource`]s in order and keeps the
//! first engine that loads. Jobs borrow the engine through an
//! [`EngineLease`], which holds it exclusively until dropped.

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use clipforge_common::{Error, Result};

use crate::command::ToolCommand;
use crate::engine::Engine;
use crate::ffmpeg::{FfmpegEngine, DEFAULT_ENCODE_TIMEOUT};

/// Timeout for the `-version` check run while acquiring.
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// One place an engine can be loaded from.
#[async_trait]
pub trait EngineSource: Send + Sync {
    /// Name shown in logs and in [`Error::EngineUnavailable`] attempts.
    fn name(&self) -> &str;

    /// Load and initialize an engine from this source.
    async fn acquire(&self) -> Result<Arc<dyn Engine>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Locator {
    Path(PathBuf),
    Program(String),
}

/// An ffmpeg binary, named explicitly or looked up on `PATH`.
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    name: String,
    locator: Locator,
    timeout: Duration,
}

impl FfmpegSource {
    /// The binary at `path`.
    pub fn at_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            locator: Locator::Path(path.into()),
            timeout: DEFAULT_ENCODE_TIMEOUT,
        }
    }

    /// `program` resolved through `PATH` when acquired.
    pub fn on_path(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: Locator::Program(program.into()),
            timeout: DEFAULT_ENCODE_TIMEOUT,
        }
    }

    /// Encode timeout given to engines from this source.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolve(&self) -> Result<PathBuf> {
        match &self.locator {
            Locator::Path(path) if path.is_file() => Ok(path.clone()),
            Locator::Path(path) => Err(Error::tool(
                "ffmpeg",
                format!("{} does not exist", path.display()),
            )),
            Locator::Program(program) => which::which(program).map_err(|e| {
                Error::tool("ffmpeg", format!("{program} not found in PATH: {e}"))
            }),
        }
    }
}

#[async_trait]
impl EngineSource for FfmpegSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self) -> Result<Arc<dyn Engine>> {
        let path = self.resolve()?;
        let version = detect_version(&path).await?;
        tracing::info!(source = %self.name, path = %path.display(), version = ?version, "ffmpeg verified");
        let engine = FfmpegEngine::new(path)?
            .with_version(version)
            .with_timeout(self.timeout);
        Ok(Arc::new(engine))
    }
}

/// Run `<ffmpeg> -version` and return the first line of its output.
async fn detect_version(path: &std::path::Path) -> Result<Option<String>> {
    let output = ToolCommand::new(path.to_path_buf())
        .arg("-version")
        .timeout(VERSION_CHECK_TIMEOUT)
        .execute()
        .await?;
    Ok(output
        .stdout
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty()))
}

/// Exclusive use of a loaded engine for the length of one job.
pub struct EngineLease {
    guard: OwnedMutexGuard<Arc<dyn Engine>>,
}

impl Deref for EngineLease {
    type Target = dyn Engine;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl std::fmt::Debug for EngineLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLease")
            .field("engine", &self.guard.name())
            .finish()
    }
}

/// Loads an engine once and hands out exclusive leases on it.
///
/// Share one loader between runners with `Arc`. A failed load caches nothing,
/// so the next [`load`](Self::load) retries every source; [`reset`](Self::reset)
/// discards a loaded engine to force a fresh acquisition.
///
/// # Example
///
/// ```no_run
/// use clipforge_av::{EngineLoader, FfmpegSource};
///
/// # async fn example() -> clipforge_common::Result<()> {
/// let loader = EngineLoader::new(vec![
///     Box::new(FfmpegSource::at_path("bundled", "/opt/ffmpeg/bin/ffmpeg")),
///     Box::new(FfmpegSource::on_path("system", "ffmpeg")),
/// ]);
/// let lease = loader.load().await?;
/// println!("using {}", lease.name());
/// # Ok(())
/// # }
/// ```
pub struct EngineLoader {
    sources: Vec<Box<dyn EngineSource>>,
    loaded: Mutex<Option<Arc<Mutex<Arc<dyn Engine>>>>>,
}

impl EngineLoader {
    pub fn new(sources: Vec<Box<dyn EngineSource>>) -> Self {
        Self {
            sources,
            loaded: Mutex::new(None),
        }
    }

    /// Names of the configured sources, in the order they are tried.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Whether an engine is currently cached.
    pub async fn is_loaded(&self) -> bool {
        self.loaded.lock().await.is_some()
    }

    /// Lease the engine, loading it first if needed.
    ///
    /// Waits while another lease on the same engine is outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineUnavailable`] listing every attempt when no
    /// source produces an engine.
    pub async fn load(&self) -> Result<EngineLease> {
        let slot = {
            let mut loaded = self.loaded.lock().await;
            match loaded.as_ref() {
                Some(slot) => Arc::clone(slot),
                None => {
                    let engine = self.acquire_first().await?;
                    let slot = Arc::new(Mutex::new(engine));
                    *loaded = Some(Arc::clone(&slot));
                    slot
                }
            }
        };
        Ok(EngineLease {
            guard: slot.lock_owned().await,
        })
    }

    /// Drop the cached engine. Outstanding leases keep theirs until released.
    pub async fn reset(&self) {
        if self.loaded.lock().await.take().is_some() {
            tracing::info!("engine cache cleared");
        }
    }

    async fn acquire_first(&self) -> Result<Arc<dyn Engine>> {
        let mut attempts = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.acquire().await {
                Ok(engine) => {
                    tracing::info!(source = source.name(), engine = engine.name(), "engine loaded");
                    return Ok(engine);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "engine source failed");
                    attempts.push(format!("{}: {e}", source.name()));
                }
            }
        }
        if attempts.is_empty() {
            attempts.push("no engine sources configured".to_string());
        }
        Err(Error::EngineUnavailable { attempts })
    }
}

impl std::fmt::Debug for EngineLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLoader")
            .field("sources", &self.source_names())
            .finish_non_exhaustive()
    }
}
