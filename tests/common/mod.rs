//! Shared test harness for integration tests.
//!
//! Provides [`FakeEngine`], an in-memory engine whose `exec` copies the input
//! scratch file to the output name and replays scripted events, and
//! [`FakeSource`] to hand it to an [`EngineLoader`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use clipforge_av::{Engine, EngineEvent, EngineLoader, EngineSource, JobRunner, ProgressSender};
use clipforge_common::{Error, MediaFile, Result};

/// How [`FakeEngine::exec`] behaves.
#[derive(Debug, Clone, Default)]
pub enum ExecBehavior {
    /// Copy input to output.
    #[default]
    Copy,
    /// Emit the scripted events, then fail with this message.
    Fail(String),
    /// Succeed without producing an output file.
    NoOutput,
}

#[derive(Default)]
pub struct FakeEngine {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub events: Vec<EngineEvent>,
    pub behavior: ExecBehavior,
    pub exec_args: Mutex<Vec<Vec<String>>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: Vec<EngineEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_behavior(mut self, behavior: ExecBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn scratch_is_empty(&self) -> bool {
        self.files.lock().unwrap().is_empty()
    }

    pub fn exec_count(&self) -> usize {
        self.exec_args.lock().unwrap().len()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn exec(
        &self,
        args: &[String],
        on_event: &mut (dyn FnMut(EngineEvent) + Send),
    ) -> Result<()> {
        self.exec_args.lock().unwrap().push(args.to_vec());
        for event in &self.events {
            on_event(event.clone());
        }
        match &self.behavior {
            ExecBehavior::Fail(message) => Err(Error::engine("fake", message.clone())),
            ExecBehavior::NoOutput => Ok(()),
            ExecBehavior::Copy => {
                let mut files = self.files.lock().unwrap();
                let input = args
                    .iter()
                    .position(|a| a == "-i")
                    .and_then(|i| files.get(&args[i + 1]).cloned())
                    .unwrap_or_default();
                if let Some(output) = args.last() {
                    files.insert(output.clone(), input);
                }
                Ok(())
            }
        }
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{name} not found in scratch space"),
            ))
        })
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        self.files.lock().unwrap().remove(name);
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// Source handing out a shared [`FakeEngine`], or failing if it has none.
pub struct FakeSource {
    pub name: String,
    pub engine: Option<Arc<FakeEngine>>,
    pub acquisitions: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn working(name: &str, engine: Arc<FakeEngine>) -> Self {
        Self {
            name: name.to_string(),
            engine: Some(engine),
            acquisitions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn broken(name: &str) -> Self {
        Self {
            name: name.to_string(),
            engine: None,
            acquisitions: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl EngineSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self) -> Result<Arc<dyn Engine>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        match &self.engine {
            Some(engine) => Ok(engine.clone() as Arc<dyn Engine>),
            None => Err(Error::tool(&self.name, "source offline")),
        }
    }
}

/// Progress and log lines captured from a runner.
#[derive(Default, Clone)]
pub struct Recorder {
    pub progress: Arc<Mutex<Vec<(f32, String)>>>,
    pub logs: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn sender(&self) -> ProgressSender {
        let progress = self.progress.clone();
        let logs = self.logs.clone();
        ProgressSender::new(move |p, step| progress.lock().unwrap().push((p, step.to_string())))
            .with_log(move |line| logs.lock().unwrap().push(line.to_string()))
    }

    pub fn percents(&self) -> Vec<f32> {
        self.progress.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }
}

/// A runner over a single working [`FakeSource`].
pub fn runner_with(engine: Arc<FakeEngine>) -> (JobRunner, Recorder) {
    let loader = Arc::new(EngineLoader::new(vec![Box::new(FakeSource::working(
        "fake", engine,
    ))]));
    let recorder = Recorder::default();
    let runner = JobRunner::new(loader).with_progress(recorder.sender());
    (runner, recorder)
}

pub fn sample_clip() -> MediaFile {
    MediaFile::new("holiday.mov", "video/quicktime", vec![0x42; 4096])
}

pub fn progress(fraction: f64) -> EngineEvent {
    EngineEvent::Progress {
        fraction,
        elapsed: Duration::from_secs_f64(fraction * 30.0),
    }
}
