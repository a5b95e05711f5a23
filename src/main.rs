mod cli;

use clipforge::{
    config,
    report::{self, JobSummary},
};
use clipforge_av::{JobRunner, Prober, ProgressSender};
use clipforge_common::{paths, CompressionMode, MediaFile, MediaKind};
use clipforge_plan::{Compression, TranscodeRequest, TrimWindow};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TranscodeArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipforge=trace,clipforge_av=trace,clipforge_plan=debug,clipforge_common=debug"
                .to_string()
        } else {
            "clipforge=info,clipforge_av=info,clipforge_plan=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Transcode(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(transcode(args, cli.config.as_deref()))
        }
        Commands::CheckEngine => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_engine(cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("clipforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Combine command-line flags, config defaults and probe results into a
/// request.
fn build_request(
    args: &TranscodeArgs,
    encoding: &config::EncodingConfig,
    duration: f64,
    source_resolution: Option<clipforge_plan::Resize>,
) -> TranscodeRequest {
    let mode = args
        .mode
        .or(args.target_size.map(|_| CompressionMode::Size))
        .or(args.quality.map(|_| CompressionMode::Quality))
        .unwrap_or(encoding.default_mode);
    let compression = Compression::from_mode(
        mode,
        args.quality.unwrap_or(encoding.default_quality),
        args.target_size.unwrap_or(encoding.default_target_size_mb),
    );

    let mut request = TranscodeRequest::new(duration)
        .with_format(args.format.unwrap_or(encoding.default_format));
    request.compression = compression;
    request.source_resolution = source_resolution;

    // Probed durations can come up a fraction short of what the user saw.
    if args.trim_start.is_some() || args.trim_end.is_some() {
        request = request.with_trim(TrimWindow::new(
            args.trim_start.unwrap_or(0.0),
            args.trim_end.map_or(duration, |end| end.min(duration)),
        ));
    }
    if let Some(resize) = args.resize.and_then(|preset| preset.resize()) {
        request = request.with_resize(resize);
    }
    request
}

async fn transcode(args: TranscodeArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", args.input);
    }
    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Input is not a file: {:?}", args.input))?;

    // Probe unless the caller already knows the duration.
    let (duration, source_resolution) = match args.duration {
        Some(d) => (d, None),
        None => {
            let prober = config.engine.prober()?;
            tracing::info!("Probing {:?} with {}", args.input, prober.name());
            let info = prober.probe(&args.input).await?;
            (info.require_duration(&args.input)?, info.resolution)
        }
    };

    let request = build_request(&args, &config.encoding, duration, source_resolution);
    tracing::debug!("Request: {:?}", request);

    let progress = if args.json {
        ProgressSender::noop()
    } else {
        ProgressSender::new(|pct, step| eprintln!("[{pct:>5.1}%] {step}"))
    }
    .with_log(|line| tracing::debug!(target: "clipforge::engine", "{}", line));

    let loader = Arc::new(config.engine.loader());
    let mut runner = JobRunner::new(loader)
        .with_builder(config.encoding.args_builder())
        .with_progress(progress);

    if args.dry_run {
        let plan = runner.plan(&file_name, &request)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            println!("[DRY RUN] {}", args.input.display());
            print!("{}", report::render_plan(&plan));
        }
        return Ok(());
    }

    let input = MediaFile::from_path(&args.input)?;
    if !is_transcodable(&input.mime_type) {
        tracing::warn!("Input type {} may not be supported", input.mime_type);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; stopping after the current stage");
                cancel.cancel();
            }
        });
    }

    let output = runner.run(&input, &request, &cancel).await?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.encoding.output_dir.clone())
        .unwrap_or_else(|| default_output_dir(&args.input));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    let output_path = output_dir.join(&output.file_name);
    std::fs::write(&output_path, &output.bytes)
        .with_context(|| format!("Failed to write output file: {:?}", output_path))?;

    let summary = JobSummary::new(&output, &output_path);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\nProcessing complete!");
        print!("{}", report::render_report(&summary));
    }

    Ok(())
}

/// Whether the file picker would offer this MIME type for transcoding.
fn is_transcodable(mime_type: &str) -> bool {
    [MediaKind::Video, MediaKind::Audio]
        .into_iter()
        .any(|kind| kind.accepts(mime_type))
}

fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn check_engine(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Checking engine sources...\n");

    let mut any_ok = false;
    for source in config.engine.sources() {
        match source.acquire().await {
            Ok(engine) => {
                any_ok = true;
                print!("✓ {} ({})", source.name(), engine.name());
                if let Some(version) = engine.version() {
                    print!(" - {}", version);
                }
                println!();
            }
            Err(e) => println!("✗ {} - {}", source.name(), e),
        }
    }

    match config.engine.prober() {
        Ok(_) => println!("✓ {} (prober)", config.engine.probe_program),
        Err(e) => println!("✗ {} - {}", config.engine.probe_program, e),
    }

    println!();
    if any_ok {
        println!("An engine is available!");
        Ok(())
    } else {
        anyhow::bail!("No engine source could be loaded")
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let path = path.map(Path::to_path_buf).or_else(config::find_config_path);
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(&p)?;
            let warnings = config::validate_config(&config)?;
            println!("✓ Configuration is valid");
            for warning in &warnings {
                println!("  ! {}", warning);
            }
            print_config_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config_summary(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config_summary(config: &config::Config) {
    println!("  Engine sources: {}", config.engine.sources.len());
    for source in &config.engine.sources {
        let location = source
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| source.program.clone())
            .unwrap_or_default();
        println!("    {} -> {}", source.name, location);
    }
    println!("  Timeout: {}s", config.engine.timeout_secs);
    println!("  Probe: {} ({}s timeout)", config.engine.probe_program, config.engine.probe_timeout_secs);
    println!("  Preset: {}", config.encoding.preset);
    println!("  Audio bitrate: {}k", config.encoding.audio_bitrate_kbps);
    println!(
        "  Defaults: {} / {} (quality {}, target {} MB)",
        config.encoding.default_format,
        config.encoding.default_mode,
        config.encoding.default_quality,
        config.encoding.default_target_size_mb
    );
    println!(
        "  Example output name: {}",
        paths::processed_file_name("clip.mov", config.encoding.default_format)
    );
}
