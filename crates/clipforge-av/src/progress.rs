//! Progress and log reporting from a running job.

/// Sender for reporting job progress and engine log lines to the host.
///
/// Progress is a percentage (0.0 -- 100.0) plus a short step description.
/// Log lines are forwarded verbatim; by default they are dropped.
pub struct ProgressSender {
    on_progress: Box<dyn Fn(f32, &str) + Send + Sync>,
    on_log: Box<dyn Fn(&str) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given progress callback.
    pub fn new(callback: impl Fn(f32, &str) + Send + Sync + 'static) -> Self {
        Self {
            on_progress: Box::new(callback),
            on_log: Box::new(|_| {}),
        }
    }

    /// Create a no-op sender that discards everything.
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    /// Builder: also receive engine log lines.
    pub fn with_log(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_log = Box::new(callback);
        self
    }

    /// Report progress.
    pub fn send(&self, progress: f32, step: &str) {
        (self.on_progress)(progress, step);
    }

    /// Forward one engine log line.
    pub fn log(&self, line: &str) {
        (self.on_log)(line);
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}
