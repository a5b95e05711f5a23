//! Error taxonomy shared by every clipforge crate.
//!
//! Validation failures ([`Error::InvalidRequest`], [`Error::InvalidTrimWindow`],
//! [`Error::InvalidDuration`], [`Error::UnsupportedCombination`]) are raised
//! before any engine interaction and can be fixed by re-prompting the user.
//! Engine failures are only observable once a job has started running.

use std::fmt;

/// Unified error type for planning and running transcode jobs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or contradictory request fields.
    #[error("invalid transcode request: {0}")]
    InvalidRequest(String),

    /// The trim window is empty or inverted.
    #[error("invalid trim window: start={start}s end={end}s")]
    InvalidTrimWindow {
        /// Requested window start in seconds.
        start: f64,
        /// Requested window end in seconds.
        end: f64,
    },

    /// A duration used for bitrate math is zero, negative, or not finite.
    #[error("invalid duration: {0}s")]
    InvalidDuration(f64),

    /// The requested feature combination has no argument mapping.
    #[error("unsupported combination: {mode} compression is not available for {format}")]
    UnsupportedCombination {
        /// Target container.
        format: String,
        /// Requested compression mode.
        mode: String,
    },

    /// Every engine source failed to load.
    #[error("transcoding engine unavailable: {}", attempts.join("; "))]
    EngineUnavailable {
        /// One entry per source tried, in order, describing why it failed.
        attempts: Vec<String>,
    },

    /// The engine ran but reported a failure.
    #[error("engine execution failed [{engine}]: {message}")]
    EngineExecution {
        /// Name of the engine that failed.
        engine: String,
        /// The engine's own failure output, unmodified.
        message: String,
    },

    /// The job was cancelled before the named stage started.
    #[error("job cancelled before {stage}")]
    Cancelled {
        /// The stage that did not run.
        stage: String,
    },

    /// A helper process (ffprobe, version checks) failed.
    #[error("tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Probe output could not be interpreted.
    #[error("probe error: {0}")]
    Probe(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Convenience constructor for [`Error::InvalidRequest`].
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Convenience constructor for [`Error::UnsupportedCombination`].
    pub fn unsupported(format: impl fmt::Display, mode: impl fmt::Display) -> Self {
        Self::UnsupportedCombination {
            format: format.to_string(),
            mode: mode.to_string(),
        }
    }

    /// Convenience constructor for [`Error::EngineExecution`].
    pub fn engine(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineExecution {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Cancelled`].
    pub fn cancelled(stage: impl fmt::Display) -> Self {
        Self::Cancelled {
            stage: stage.to_string(),
        }
    }

    /// Stable snake_case tag for this error, suitable for logs and callers
    /// that branch on the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidTrimWindow { .. } => "invalid_trim_window",
            Self::InvalidDuration(_) => "invalid_duration",
            Self::UnsupportedCombination { .. } => "unsupported_combination",
            Self::EngineUnavailable { .. } => "engine_unavailable",
            Self::EngineExecution { .. } => "engine_execution_failed",
            Self::Cancelled { .. } => "cancelled",
            Self::Tool { .. } => "tool",
            Self::Probe(_) => "probe",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    /// Whether the caller can recover by changing the request and trying again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::InvalidTrimWindow { .. }
                | Self::InvalidDuration(_)
                | Self::UnsupportedCombination { .. }
        )
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_display() {
        let err = Error::invalid_request("quality level 60 exceeds 51");
        assert_eq!(
            err.to_string(),
            "invalid transcode request: quality level 60 exceeds 51"
        );
        assert_eq!(err.kind(), "invalid_request");
        assert!(err.is_recoverable());
    }

    #[test]
    fn trim_window_display() {
        let err = Error::InvalidTrimWindow {
            start: 50.0,
            end: 10.5,
        };
        assert_eq!(err.to_string(), "invalid trim window: start=50s end=10.5s");
        assert!(err.is_recoverable());
    }

    #[test]
    fn unsupported_display() {
        let err = Error::unsupported("avi", "size");
        assert_eq!(
            err.to_string(),
            "unsupported combination: size compression is not available for avi"
        );
        assert_eq!(err.kind(), "unsupported_combination");
    }

    #[test]
    fn engine_unavailable_lists_attempts() {
        let err = Error::EngineUnavailable {
            attempts: vec![
                "bundled: not found".into(),
                "system: version check failed".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "transcoding engine unavailable: bundled: not found; system: version check failed"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn engine_execution_keeps_message_verbatim() {
        let err = Error::engine("ffmpeg", "Unknown encoder 'libfoo'");
        assert_eq!(
            err.to_string(),
            "engine execution failed [ffmpeg]: Unknown encoder 'libfoo'"
        );
        assert_eq!(err.kind(), "engine_execution_failed");
    }

    #[test]
    fn cancelled_display() {
        let err = Error::cancelled("execute");
        assert_eq!(err.to_string(), "job cancelled before execute");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<u32> {
            Ok(1237)
        }
        assert_eq!(ok_fn().unwrap(), 1237);

        fn err_fn() -> Result<u32> {
            Err(Error::InvalidDuration(0.0))
        }
        assert!(err_fn().is_err());
    }
}
