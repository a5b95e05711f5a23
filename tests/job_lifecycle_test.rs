//! Job lifecycle integration tests.
//!
//! Drives [`JobRunner`] end to end against the in-memory engine from
//! `common`, checking state transitions, progress, cleanup and errors.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use assert_matches::assert_matches;
use tokio_util::sync::CancellationToken;

use clipforge_av::{EngineEvent, EngineLoader, JobRunner, JobStage, JobState, ProgressSender};
use clipforge_common::{Error, TargetFormat};
use clipforge_plan::{Resize, TranscodeArgsBuilder, TranscodeRequest, TrimWindow};
use common::{progress, runner_with, sample_clip, ExecBehavior, FakeEngine, FakeSource, Recorder};

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn idle_to_completed() {
    let engine = Arc::new(FakeEngine::new().with_events(vec![
        EngineEvent::Log("Input #0, mov,mp4".into()),
        progress(0.5),
        progress(1.0),
    ]));
    let (mut runner, recorder) = runner_with(engine.clone());
    assert_eq!(runner.state(), &JobState::Idle);

    let request = TranscodeRequest::new(120.0)
        .with_trim(TrimWindow::new(10.0, 40.0))
        .with_resize(Resize::new(1280, 720))
        .with_format(TargetFormat::Mkv);
    let output = runner
        .run(&sample_clip(), &request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(runner.state(), &JobState::Completed);
    assert_eq!(output.file_name, "holiday_processed.mkv");
    assert_eq!(output.mime_type, "video/x-matroska");
    assert_eq!(output.bytes, vec![0x42; 4096]);
    assert_eq!(output.report.original_size_bytes, 4096);
    assert_eq!(output.report.output_duration_secs, 30.0);
    assert_eq!(output.report.output_resolution, Some(Resize::new(1280, 720)));

    // The engine saw exactly the plan, with scratch names.
    let calls = engine.exec_args.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], output.plan.arguments);
    assert_eq!(calls[0][..2], ["-i", "input.mov"]);
    assert_eq!(calls[0].last().unwrap(), "output.mkv");

    assert!(engine.scratch_is_empty());
    assert_eq!(*recorder.logs.lock().unwrap(), ["Input #0, mov,mp4"]);
}

#[tokio::test]
async fn progress_follows_stage_bands() {
    let engine = Arc::new(FakeEngine::new().with_events(vec![
        progress(0.1),
        progress(0.6),
        progress(0.3),
        progress(1.0),
    ]));
    let (mut runner, recorder) = runner_with(engine);
    runner
        .run(&sample_clip(), &TranscodeRequest::new(30.0), &CancellationToken::new())
        .await
        .unwrap();

    let percents = recorder.percents();
    assert_eq!(percents.first(), Some(&0.0));
    assert_eq!(percents.last(), Some(&100.0));
    assert!(
        percents.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {percents:?}"
    );
    for stage in [JobStage::WriteInput, JobStage::BuildArgs, JobStage::Execute, JobStage::ReadOutput] {
        assert!(percents.contains(&stage.progress_range().0));
    }
    // Engine progress lands inside the execute band; the late 0.3 is dropped.
    let near = |target: f32| percents.iter().any(|p| (p - target).abs() < 0.01);
    assert!(near(27.0));
    assert!(near(62.0));
    assert!(!near(41.0));
}

#[tokio::test]
async fn configured_builder_reaches_the_engine() {
    let engine = Arc::new(FakeEngine::new());
    let (runner, _) = runner_with(engine.clone());
    let mut runner = runner.with_builder(
        TranscodeArgsBuilder::new()
            .with_preset("veryfast")
            .with_audio_bitrate_kbps(96),
    );
    let request = TranscodeRequest::new(300.0).with_target_size_mb(50.0);
    let output = runner
        .run(&sample_clip(), &request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.plan.video_bitrate_kbps, Some(1269));
    let args = &engine.exec_args.lock().unwrap()[0];
    assert!(args.windows(2).any(|w| w == ["-preset", "veryfast"]));
    assert!(args.windows(2).any(|w| w == ["-b:a", "96k"]));
}

// ---------------------------------------------------------------------------
// Validation happens before any engine work
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inverted_trim_rejected_before_engine_call() {
    let engine = Arc::new(FakeEngine::new());
    let source = FakeSource::working("fake", engine.clone());
    let acquisitions = source.acquisitions.clone();
    let loader = Arc::new(EngineLoader::new(vec![Box::new(source)]));
    let mut runner = JobRunner::new(loader);

    let request = TranscodeRequest::new(120.0).with_trim(TrimWindow::new(50.0, 10.0));
    let result = runner
        .run(&sample_clip(), &request, &CancellationToken::new())
        .await;

    assert_matches!(result, Err(Error::InvalidTrimWindow { .. }));
    assert_eq!(acquisitions.load(Ordering::SeqCst), 0);
    assert_eq!(engine.exec_count(), 0);
    assert_eq!(runner.state(), &JobState::Idle);
}

#[tokio::test]
async fn avi_size_mode_is_unsupported() {
    let engine = Arc::new(FakeEngine::new());
    let (mut runner, recorder) = runner_with(engine.clone());
    let request = TranscodeRequest::new(60.0)
        .with_format(TargetFormat::Avi)
        .with_target_size_mb(10.0);

    let err = runner
        .run(&sample_clip(), &request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, Error::UnsupportedCombination { .. });
    assert!(err.is_recoverable());
    assert_eq!(engine.exec_count(), 0);
    assert!(recorder.percents().is_empty());
}

// ---------------------------------------------------------------------------
// Engine failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn engine_failure_is_verbatim_and_cleans_up() {
    let engine = Arc::new(
        FakeEngine::new()
            .with_events(vec![progress(0.4)])
            .with_behavior(ExecBehavior::Fail(
                "Error while opening encoder for output stream #0:0".into(),
            )),
    );
    let (mut runner, _) = runner_with(engine.clone());

    let err = runner
        .run(&sample_clip(), &TranscodeRequest::new(60.0), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(
        &err,
        Error::EngineExecution { engine, message }
            if engine == "fake" && message == "Error while opening encoder for output stream #0:0"
    );
    assert!(!err.is_recoverable());
    assert_matches!(runner.state(), JobState::Failed(reason) if reason.contains("opening encoder"));
    assert!(engine.scratch_is_empty());
    let deleted = engine.deleted.lock().unwrap().clone();
    assert!(deleted.contains(&"input.mov".to_string()));
    assert!(deleted.contains(&"output.mp4".to_string()));
}

#[tokio::test]
async fn missing_output_fails_in_read_stage() {
    let engine = Arc::new(FakeEngine::new().with_behavior(ExecBehavior::NoOutput));
    let (mut runner, _) = runner_with(engine.clone());

    let err = runner
        .run(&sample_clip(), &TranscodeRequest::new(60.0), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "io");
    assert_matches!(runner.state(), JobState::Failed(_));
    assert!(engine.scratch_is_empty());
}

#[tokio::test]
async fn exhausted_sources_report_each_attempt() {
    let loader = Arc::new(EngineLoader::new(vec![
        Box::new(FakeSource::broken("bundled")),
        Box::new(FakeSource::broken("system")),
    ]));
    let mut runner = JobRunner::new(loader);

    let err = runner
        .run(&sample_clip(), &TranscodeRequest::new(60.0), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(
        &err,
        Error::EngineUnavailable { attempts }
            if attempts.len() == 2
                && attempts[0].starts_with("bundled:")
                && attempts[1].starts_with("system:")
    );
    assert_matches!(runner.state(), JobState::Failed(_));
}

#[tokio::test]
async fn fallback_source_is_used_and_memoized() {
    let engine = Arc::new(FakeEngine::new());
    let good = FakeSource::working("system", engine.clone());
    let good_calls = good.acquisitions.clone();
    let loader = Arc::new(EngineLoader::new(vec![
        Box::new(FakeSource::broken("bundled")),
        Box::new(good),
    ]));
    let mut runner = JobRunner::new(loader.clone());

    for _ in 0..2 {
        runner
            .run(&sample_clip(), &TranscodeRequest::new(60.0), &CancellationToken::new())
            .await
            .unwrap();
    }
    assert_eq!(good_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.exec_count(), 2);

    // A reset forces the next job to reload.
    loader.reset().await;
    runner
        .run(&sample_clip(), &TranscodeRequest::new(60.0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(good_calls.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Cancellation and exclusivity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_job_never_executes() {
    let engine = Arc::new(FakeEngine::new());
    let (mut runner, _) = runner_with(engine.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = runner
        .run(&sample_clip(), &TranscodeRequest::new(60.0), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "cancelled");
    assert_eq!(engine.exec_count(), 0);
    assert!(engine.scratch_is_empty());
}

#[tokio::test]
async fn cancel_during_execute_stops_before_read_output() {
    let engine = Arc::new(FakeEngine::new().with_events(vec![progress(0.5)]));
    let loader = Arc::new(EngineLoader::new(vec![Box::new(FakeSource::working(
        "fake",
        engine.clone(),
    ))]));
    let cancel = CancellationToken::new();
    let sender = {
        let cancel = cancel.clone();
        ProgressSender::new(move |_, step| {
            if step == "execute" {
                cancel.cancel();
            }
        })
    };
    let mut runner = JobRunner::new(loader).with_progress(sender);

    let err = runner
        .run(&sample_clip(), &TranscodeRequest::new(60.0), &cancel)
        .await
        .unwrap_err();

    // The encode itself is not interrupted; the next boundary is.
    assert_matches!(&err, Error::Cancelled { stage } if stage == "read output");
    assert_eq!(engine.exec_count(), 1);
    assert!(engine.scratch_is_empty());
    let deleted = engine.deleted.lock().unwrap().clone();
    assert!(deleted.contains(&"input.mov".to_string()));
    assert!(deleted.contains(&"output.mp4".to_string()));
    assert_matches!(runner.state(), JobState::Failed(_));
}

#[tokio::test]
async fn runners_sharing_a_loader_take_turns() {
    let engine = Arc::new(FakeEngine::new());
    let loader = Arc::new(EngineLoader::new(vec![Box::new(FakeSource::working(
        "fake",
        engine.clone(),
    ))]));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let loader = loader.clone();
            tokio::spawn(async move {
                let recorder = Recorder::default();
                let mut runner = JobRunner::new(loader).with_progress(recorder.sender());
                runner
                    .run(&sample_clip(), &TranscodeRequest::new(60.0), &CancellationToken::new())
                    .await
                    .map(|out| out.bytes.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 4096);
    }
    assert_eq!(engine.exec_count(), 3);
    assert!(engine.scratch_is_empty());
}
