//! Human-readable and JSON summaries of plans and finished jobs.

use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use clipforge_av::{JobOutput, JobReport};
use clipforge_common::units::{format_duration, format_file_size};
use clipforge_plan::ArgumentPlan;

/// What the CLI prints for a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary<'a> {
    pub file_name: &'a str,
    pub output_path: PathBuf,
    pub mime_type: &'a str,
    pub plan: &'a ArgumentPlan,
    pub report: &'a JobReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_change_percent: Option<f64>,
}

impl<'a> JobSummary<'a> {
    pub fn new(output: &'a JobOutput, output_path: &Path) -> Self {
        Self {
            file_name: &output.file_name,
            output_path: output_path.to_path_buf(),
            mime_type: &output.mime_type,
            plan: &output.plan,
            report: &output.report,
            size_change_percent: output.report.size_change_percent(),
        }
    }
}

/// Multi-line description of a plan.
pub fn render_plan(plan: &ArgumentPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Command:      {}", plan.command_line());
    let _ = writeln!(out, "Container:    {}", plan.container);
    let _ = writeln!(out, "Video codec:  {}", plan.video_codec);
    let _ = writeln!(out, "Audio codec:  {}", plan.audio_codec);
    if let Some(kbps) = plan.video_bitrate_kbps {
        let _ = writeln!(out, "Video rate:   {kbps} kbps");
    }
    let _ = writeln!(
        out,
        "Duration:     {}",
        format_duration(plan.effective_duration_secs)
    );
    out
}

/// Multi-line before/after comparison for a finished job.
pub fn render_report(summary: &JobSummary<'_>) -> String {
    let report = summary.report;
    let mut out = String::new();
    let _ = writeln!(out, "Output:       {}", summary.output_path.display());
    let _ = writeln!(
        out,
        "Size:         {} -> {}{}",
        format_file_size(report.original_size_bytes),
        format_file_size(report.processed_size_bytes),
        summary
            .size_change_percent
            .map(|p| format!(" ({p:+.1}%)"))
            .unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "Duration:     {} -> {}",
        format_duration(report.original_duration_secs),
        format_duration(report.output_duration_secs)
    );
    match (report.source_resolution, report.output_resolution) {
        (Some(src), Some(dst)) if src != dst => {
            let _ = writeln!(out, "Resolution:   {src} -> {dst}");
        }
        (_, Some(dst)) => {
            let _ = writeln!(out, "Resolution:   {dst}");
        }
        _ => {}
    }
    let _ = writeln!(out, "Took:         {:.1}s", report.elapsed_secs);
    out
}
