//! Child-process runner shared by the engine, the prober and version checks.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use clipforge_common::{Error, Result};

/// Applies unless [`ToolCommand::timeout`] overrides it.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything a finished process printed, decoded lossily.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// One invocation of an external program.
///
/// Stdin is closed and the child is spawned with `kill_on_drop`, so a job
/// future that is dropped or times out takes its process with it.
///
/// ```no_run
/// use clipforge_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> clipforge_common::Result<()> {
/// let version = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-version")
///     .execute()
///     .await?;
/// assert!(version.stdout.starts_with("ffmpeg version"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            current_dir: None,
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.args.push(arg.into());
        }
        self
    }

    /// Upper bound on the whole run, including output collection.
    pub fn timeout(&mut self, limit: Duration) -> &mut Self {
        self.timeout = limit;
        self
    }

    /// Run the process inside `dir`.
    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Arguments added so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run to completion and collect both output streams.
    ///
    /// # Errors
    ///
    /// [`Error::Tool`] when the program cannot be started, runs past the
    /// timeout, or exits unsuccessfully. The last case quotes its stderr.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = self.command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let collected = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                if collected.status.success() {
                    Ok(collected)
                } else {
                    Err(Error::tool(
                        program_name,
                        format!("{}: {}", collected.status, collected.stderr.trim()),
                    ))
                }
            }
            Ok(Err(e)) => Err(Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            // The child was moved into the timed-out future; kill_on_drop
            // reaps it when that future is dropped.
            Err(_elapsed) => Err(Error::tool(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }

    /// Execute the command, handing each stderr line to `on_line` as it
    /// arrives. Stdout is discarded.
    ///
    /// Unlike [`execute`](Self::execute), a non-zero exit is not an error
    /// here; the caller inspects the returned status and decides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if spawning fails, stderr cannot be read, or
    /// the process times out.
    pub async fn execute_streaming(&self, mut on_line: impl FnMut(&str)) -> Result<ExitStatus> {
        let program_name = self.program_name();

        let mut cmd = self.command();
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::tool(&program_name, format!("failed to spawn: {e}")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::tool(&program_name, "stderr was not captured"))?;

        let run = async {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\r', '\n']));
            }
            Ok::<_, std::io::Error>(child.wait().await?)
        };

        let outcome = tokio::time::timeout(self.timeout, run).await;
        match outcome {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(e)) => Err(Error::tool(
                program_name,
                format!("I/O error reading process output: {e}"),
            )),
            Err(_elapsed) => {
                let _ = child.kill().await;
                Err(Error::tool(
                    program_name,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        }
    }
}
