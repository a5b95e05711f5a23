use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use clipforge_common::{CompressionMode, TargetFormat};
use clipforge_plan::ResolutionPreset;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(author, version, about = "Trim, resize and re-encode media files through ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcode a single media file
    Transcode(TranscodeArgs),

    /// Check that an engine can be loaded from the configured sources
    CheckEngine,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Args, Debug)]
pub struct TranscodeArgs {
    /// Input file to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output container (mp4, mov, mkv, webm, avi)
    #[arg(short, long)]
    pub format: Option<TargetFormat>,

    /// Compression mode (quality or size)
    #[arg(short, long)]
    pub mode: Option<CompressionMode>,

    /// Constant rate factor, 0-51; lower is better quality
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=51))]
    pub quality: Option<u8>,

    /// Target output size in megabytes (implies --mode size)
    #[arg(short = 's', long)]
    pub target_size: Option<f64>,

    /// Trim start in seconds
    #[arg(long)]
    pub trim_start: Option<f64>,

    /// Trim end in seconds
    #[arg(long)]
    pub trim_end: Option<f64>,

    /// Output resolution: original, a preset like 720p, or WxH
    #[arg(short, long)]
    pub resize: Option<ResolutionPreset>,

    /// Input duration in seconds; skips probing
    #[arg(long)]
    pub duration: Option<f64>,

    /// Directory for the processed file
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the plan without running the engine
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
