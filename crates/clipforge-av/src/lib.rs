//! # clipforge-av
//!
//! ffmpeg integration and job execution for clipforge.
//!
//! This crate provides:
//!
//! - **Engine contract** ([`Engine`], [`EngineEvent`]) -- scratch-space file
//!   I/O plus one invocation with streamed log and progress events.
//! - **ffmpeg engine** ([`FfmpegEngine`]) -- runs the ffmpeg CLI inside a
//!   private temporary directory.
//! - **Engine loading** ([`EngineSource`], [`FfmpegSource`], [`EngineLoader`])
//!   -- ordered fallback sources, memoized, with exclusive leases.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Probing** ([`FfprobeProber`]) -- duration and frame size via ffprobe.
//! - **Job runner** ([`JobRunner`]) -- the staged job state machine with
//!   progress reporting and cancellation between stages.

pub mod command;
pub mod engine;
pub mod ffmpeg;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod source;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use engine::{Engine, EngineEvent};
pub use ffmpeg::FfmpegEngine;
pub use probe::{FfprobeProber, MediaInfo, Prober};
pub use progress::ProgressSender;
pub use runner::{JobOutput, JobReport, JobRunner, JobStage, JobState};
pub use source::{EngineLease, EngineLoader, EngineSource, FfmpegSource};
