//! The transcode job state machine.
//!
//! A [`JobRunner`] takes one [`MediaFile`] and one [`TranscodeRequest`]
//! through engine loading and four stages, reporting progress as it goes:
//!
//! | Stage         | Progress |
//! |---------------|----------|
//! | write input   | 0 → 10   |
//! | build args    | 10 → 20  |
//! | execute       | 20 → 90  |
//! | read output   | 90 → 100 |
//!
//! The request is planned before the engine is touched, so invalid requests
//! fail without side effects. Scratch files are removed whether the job
//! succeeds or not.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use clipforge_common::{paths, units, Error, MediaFile, Result};
use clipforge_plan::{ArgumentPlan, Resize, TranscodeArgsBuilder, TranscodeRequest};

use crate::engine::{Engine, EngineEvent};
use crate::progress::ProgressSender;
use crate::source::EngineLoader;

/// One stage of a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    WriteInput,
    BuildArgs,
    Execute,
    ReadOutput,
}

impl JobStage {
    /// Progress percentages at the start and end of this stage.
    pub fn progress_range(self) -> (f32, f32) {
        match self {
            Self::WriteInput => (0.0, 10.0),
            Self::BuildArgs => (10.0, 20.0),
            Self::Execute => (20.0, 90.0),
            Self::ReadOutput => (90.0, 100.0),
        }
    }

    /// Map a completion fraction within this stage onto overall progress.
    pub fn progress_at(self, fraction: f64) -> f32 {
        let (start, end) = self.progress_range();
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        start + (end - start) * fraction
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WriteInput => "write input",
            Self::BuildArgs => "build args",
            Self::Execute => "execute",
            Self::ReadOutput => "read output",
        })
    }
}

/// Where a [`JobRunner`] is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Loading,
    Ready,
    Running(JobStage),
    Completed,
    /// Holds the failure message.
    Failed(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// Before/after figures for a finished job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub job_id: Uuid,
    pub engine: String,
    pub original_size_bytes: u64,
    pub processed_size_bytes: u64,
    pub original_duration_secs: f64,
    pub output_duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_resolution: Option<Resize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_resolution: Option<Resize>,
    /// Wall-clock time from engine loading to completion.
    pub elapsed_secs: f64,
}

impl JobReport {
    /// Signed size change in percent; negative when the output is smaller.
    pub fn size_change_percent(&self) -> Option<f64> {
        units::size_change_percent(self.original_size_bytes, self.processed_size_bytes)
    }
}

/// A successfully processed file, ready to hand back to the user.
#[derive(Clone)]
pub struct JobOutput {
    /// `<original base name>_processed.<ext>`.
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub plan: ArgumentPlan,
    pub report: JobReport,
}

impl fmt::Debug for JobOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobOutput")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

/// Runs transcode jobs one at a time against a shared engine.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use clipforge_av::{EngineLoader, FfmpegSource, JobRunner};
/// use clipforge_common::MediaFile;
/// use clipforge_plan::TranscodeRequest;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> clipforge_common::Result<()> {
/// let loader = Arc::new(EngineLoader::new(vec![Box::new(FfmpegSource::on_path("system", "ffmpeg"))]));
/// let mut runner = JobRunner::new(loader);
/// let input = MediaFile::from_path(std::path::Path::new("clip.mov"))?;
/// let output = runner
///     .run(&input, &TranscodeRequest::new(42.0), &CancellationToken::new())
///     .await?;
/// std::fs::write(&output.file_name, &output.bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JobRunner {
    loader: Arc<EngineLoader>,
    builder: TranscodeArgsBuilder,
    progress: Arc<ProgressSender>,
    state: JobState,
}

impl JobRunner {
    pub fn new(loader: Arc<EngineLoader>) -> Self {
        Self {
            loader,
            builder: TranscodeArgsBuilder::default(),
            progress: Arc::new(ProgressSender::noop()),
            state: JobState::Idle,
        }
    }

    /// Builder: use a configured argument builder.
    pub fn with_builder(mut self, builder: TranscodeArgsBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// The plan [`run`](Self::run) would execute for a file named
    /// `input_name`, using scratch-space names.
    pub fn plan(&self, input_name: &str, request: &TranscodeRequest) -> Result<ArgumentPlan> {
        self.builder.build(
            request,
            &paths::input_scratch_name(input_name),
            &paths::output_scratch_name(request.target_format),
        )
    }

    /// Run one job to completion.
    ///
    /// Request validation errors are returned before the engine is loaded and
    /// leave the state untouched. Every later failure moves the runner to
    /// [`JobState::Failed`].
    ///
    /// `cancel` is checked before loading and before each stage; an encode
    /// already in progress runs to completion.
    pub async fn run(
        &mut self,
        input: &MediaFile,
        request: &TranscodeRequest,
        cancel: &CancellationToken,
    ) -> Result<JobOutput> {
        let plan = self.plan(&input.name, request)?;
        let job_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(job = %job_id, file = %input.name, format = %request.target_format, "job started");

        if cancel.is_cancelled() {
            return Err(self.fail(job_id, Error::cancelled("engine loading")));
        }
        self.transition(JobState::Loading);
        let lease = match self.loader.load().await {
            Ok(lease) => lease,
            Err(e) => return Err(self.fail(job_id, e)),
        };
        self.transition(JobState::Ready);

        let engine: &dyn Engine = &*lease;
        let input_name = paths::input_scratch_name(&input.name);
        let output_name = paths::output_scratch_name(request.target_format);

        let result = self
            .run_stages(engine, input, &plan, &input_name, &output_name, cancel)
            .await;
        cleanup(engine, &[&input_name, &output_name]).await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(job_id, e)),
        };

        let report = JobReport {
            job_id,
            engine: engine.name().to_string(),
            original_size_bytes: input.size_bytes,
            processed_size_bytes: bytes.len() as u64,
            original_duration_secs: request.input_duration_secs,
            output_duration_secs: plan.effective_duration_secs,
            source_resolution: request.source_resolution,
            output_resolution: request.effective_resize().or(request.source_resolution),
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        let output = JobOutput {
            file_name: paths::processed_file_name(&input.name, request.target_format),
            mime_type: request.target_format.mime_type().to_string(),
            bytes,
            plan,
            report,
        };

        self.progress.send(100.0, "complete");
        self.transition(JobState::Completed);
        tracing::info!(
            job = %job_id,
            output = %output.file_name,
            size = %units::format_file_size(output.report.processed_size_bytes),
            "job completed"
        );
        Ok(output)
    }

    async fn run_stages(
        &mut self,
        engine: &dyn Engine,
        input: &MediaFile,
        plan: &ArgumentPlan,
        input_name: &str,
        output_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        self.enter(JobStage::WriteInput, cancel)?;
        engine.write_file(input_name, &input.bytes).await?;

        self.enter(JobStage::BuildArgs, cancel)?;
        tracing::info!(command = %plan.command_line(), "transcode command");

        self.enter(JobStage::Execute, cancel)?;
        let progress = Arc::clone(&self.progress);
        let mut last = JobStage::Execute.progress_at(0.0);
        let mut on_event = |event: EngineEvent| match event {
            EngineEvent::Log(line) => progress.log(&line),
            EngineEvent::Progress { fraction, .. } => {
                let pct = JobStage::Execute.progress_at(fraction);
                if pct > last {
                    last = pct;
                    progress.send(pct, "execute");
                }
            }
        };
        engine.exec(&plan.arguments, &mut on_event).await?;

        self.enter(JobStage::ReadOutput, cancel)?;
        engine.read_file(output_name).await
    }

    /// Check for cancellation, then start `stage`.
    fn enter(&mut self, stage: JobStage, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::cancelled(stage));
        }
        self.transition(JobState::Running(stage));
        let stage_name = stage.to_string();
        self.progress.send(stage.progress_range().0, &stage_name);
        Ok(())
    }

    fn transition(&mut self, state: JobState) {
        tracing::debug!(from = ?self.state, to = ?state, "job state");
        self.state = state;
    }

    fn fail(&mut self, job_id: Uuid, error: Error) -> Error {
        tracing::error!(job = %job_id, kind = error.kind(), error = %error, "job failed");
        self.transition(JobState::Failed(error.to_string()));
        error
    }
}

/// Delete scratch files, logging rather than returning failures.
async fn cleanup(engine: &dyn Engine, names: &[&str]) {
    for name in names {
        if let Err(e) = engine.delete_file(name).await {
            tracing::warn!(file = %name, error = %e, "failed to delete scratch file");
        }
    }
}
