//! The transcoding engine contract.
//!
//! An engine owns a private scratch space addressed by plain file names. A job
//! writes its input there, runs one invocation against it, reads the output
//! back and deletes both files.

use std::time::Duration;

use async_trait::async_trait;

use clipforge_common::Result;

/// Something the engine reported while running.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One line of engine log output. Never an error by itself.
    Log(String),
    /// Encode progress: `fraction` in `0.0..=1.0` of the expected output,
    /// `elapsed` of output media produced so far.
    Progress { fraction: f64, elapsed: Duration },
}

/// A loaded transcoding engine.
///
/// Implementations must be safe to share; exclusive use for the length of a
/// job is arranged by [`EngineLoader`](crate::EngineLoader) leases, not by the
/// engine itself.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Engine build/version description, when known.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Create or replace `name` in the scratch space.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Run one invocation with `args`, reporting events as they arrive.
    ///
    /// Returns once the engine has finished. A failed invocation yields
    /// [`Error::EngineExecution`](clipforge_common::Error::EngineExecution)
    /// carrying the engine's own message.
    async fn exec(
        &self,
        args: &[String],
        on_event: &mut (dyn FnMut(EngineEvent) + Send),
    ) -> Result<()>;

    /// Read `name` back from the scratch space.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Remove `name` from the scratch space.
    async fn delete_file(&self, name: &str) -> Result<()>;
}
