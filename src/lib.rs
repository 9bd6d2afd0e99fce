//! Avistar - bird detection for images and camera-style frame streams.
//!
//! This crate runs a COCO-vocabulary ONNX object detector over images,
//! keeps only bird boxes, and resolves species display names.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod detect;
pub mod error;
pub mod image;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod species;
pub mod stream;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command, ConfigAction};
use config::{Config, config_file_path, load_default_config, save_default_config, validate_config};
use detect::shared_detector;
use pipeline::{ProcessResult, collect_input_sources, process_source};
use std::path::Path;
use stream::{DirectoryFrameSource, FileCaptureSink, StreamConfig, StreamController};
use tracing::{error, info, warn};

pub use error::{Error, Result};

/// Main entry point for the avistar CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.analyze.verbose, cli.analyze.quiet);

    let mut config = load_default_config()?;
    cli.analyze.apply_to(&mut config);
    validate_config(&config)?;

    if let Some(command) = cli.command {
        return match command {
            Command::Config { action } => handle_config_command(action),
            Command::Watch {
                dir,
                captures_dir,
                drain,
            } => watch_stream(&dir, captures_dir.as_deref(), drain, &cli.analyze, &config),
        };
    }

    if cli.inputs.is_empty() {
        return Err(Error::NoValidImageFiles);
    }

    analyze_images(&cli.inputs, &cli.analyze, &config)
}

/// Analyze input images with the given options.
fn analyze_images(inputs: &[String], args: &AnalyzeArgs, config: &Config) -> Result<()> {
    use crate::output::progress;
    use std::time::Instant;

    let total_start = Instant::now();

    let sources = collect_input_sources(inputs)?;
    info!("Found {} image(s) to process", sources.len());

    let detector_config = config.detector_config(args.model.as_ref())?;
    let detector = shared_detector(&detector_config)?;

    let runtime = tokio::runtime::Runtime::new()?;

    let progress_enabled = !args.quiet;
    let file_progress = progress::create_file_progress(sources.len(), progress_enabled);

    let mut processed = 0;
    let mut skipped = 0;
    let mut errors = 0;
    let mut total_detections = 0;

    for source in &sources {
        let result = runtime.block_on(process_source(
            &detector,
            source,
            config,
            args.output_dir.as_deref(),
            args.force,
        ));

        match result {
            Ok(ProcessResult::Written { detections, .. }) => {
                processed += 1;
                total_detections += detections;
            }
            Ok(ProcessResult::SkippedExisting) => {
                info!("Skipping (output exists): {}", source.display_name());
                skipped += 1;
            }
            Err(e) => {
                error!("Failed to process {}: {}", source.display_name(), e);
                errors += 1;
                if args.fail_fast {
                    progress::finish_progress(file_progress, "Failed");
                    return Err(e);
                }
            }
        }
        progress::inc_progress(file_progress.as_ref());
    }

    progress::finish_progress(file_progress, "Complete");

    let total_duration = total_start.elapsed().as_secs_f64();
    info!(
        "Complete: {} processed, {} skipped, {} errors, {} total detections in {:.2}s",
        processed, skipped, errors, total_detections, total_duration
    );

    if errors > 0 && !args.fail_fast {
        warn!("{} image(s) had errors", errors);
    }

    Ok(())
}

/// Watch a directory for frames and detect continuously.
fn watch_stream(
    dir: &Path,
    captures_dir: Option<&Path>,
    drain: bool,
    args: &AnalyzeArgs,
    config: &Config,
) -> Result<()> {
    let detector_config = config.detector_config(args.model.as_ref())?;
    let detector = shared_detector(&detector_config)?;

    let captures = captures_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.stream.captures_dir.clone());
    let mut sink = FileCaptureSink::new(&captures)?;

    let mut source = if drain {
        DirectoryFrameSource::new(dir)
    } else {
        DirectoryFrameSource::watching(dir)
    };

    let stream_config: StreamConfig = config.stream_config();
    let mut controller = StreamController::new(detector, stream_config);
    let handle = controller.start()?;

    if let Err(e) = ctrlc::set_handler(move || {
        handle.stop();
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    info!(
        "Watching {} (captures -> {})",
        dir.display(),
        captures.display()
    );

    controller.run(&mut source, &mut sink)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default; raise it with -v / -vv / -vvv.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                let saved_path = save_default_config(&config)?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nSet model.path to your ONNX detection model to get started.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
