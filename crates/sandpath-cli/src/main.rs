//! sandpath: convert an image file into sand table coordinates.
//!
//! Runs the conversion pipeline on an image with configurable parameters
//! and writes the encoded polar coordinates to stdout or a file. With
//! `--json` it prints a report of counts, simplification convergence and
//! stage durations instead.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin sandpath -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgAction, Parser, ValueEnum};
use sandpath_pipeline::{ContourMode, ConversionResult, ConvertConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Convert an image into polar coordinates for a sand table.
///
/// Traces the image's edges, orders the contours into one drawable path
/// and prints it in the selected encoding.
#[derive(Parser)]
#[command(name = "sandpath", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Initial simplification tolerance in pixels.
    #[arg(long, default_value_t = ConvertConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Which contours to trace.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_MODE)]
    contour_mode: Mode,

    /// Target maximum number of points.
    #[arg(long, default_value_t = ConvertConfig::DEFAULT_MAX_POINTS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_points: usize,

    /// Output encoding: 0 `{r,theta}`, 1 single byte, 2 theta-rho, 3 whitespace.
    #[arg(long, default_value_t = ConvertConfig::DEFAULT_OUTPUT_FORMAT)]
    format: u8,

    /// Connect the last contour back to the first.
    #[arg(long = "loop")]
    is_loop: bool,

    /// Route connectors along already drawn strokes.
    #[arg(long)]
    minimize_jumps: bool,

    /// Repeat the last point of each contour as a pen-lift marker.
    #[arg(long)]
    pen_up: bool,

    /// Full conversion config as a JSON string.
    ///
    /// When provided, all other conversion parameter flags are ignored.
    /// The JSON must be a valid `ConvertConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the encoded coordinates to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print a JSON report instead of the encoded coordinates.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,
}

/// Contour retrieval mode selection.
#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Outermost borders only.
    External,
    /// Every border, including holes.
    Tree,
}

/// Maps a [`ContourMode`] to the local CLI [`Mode`] enum.
const fn mode_from_pipeline(mode: ContourMode) -> Mode {
    match mode {
        ContourMode::External => Mode::External,
        ContourMode::Tree => Mode::Tree,
    }
}

/// The CLI default mode, derived from [`ConvertConfig::DEFAULT_CONTOUR_MODE`]
/// so the two cannot silently diverge.
const CLI_DEFAULT_MODE: Mode = mode_from_pipeline(ConvertConfig::DEFAULT_CONTOUR_MODE);

/// Build a [`ConvertConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<ConvertConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ConvertConfig {
        epsilon: cli.epsilon,
        contour_mode: match cli.contour_mode {
            Mode::External => ContourMode::External,
            Mode::Tree => ContourMode::Tree,
        },
        max_points: cli.max_points,
        output_format: cli.format,
        is_loop: cli.is_loop,
        minimize_jumps: cli.minimize_jumps,
        pen_up_enabled: cli.pen_up,
    })
}

/// Install a stderr subscriber so stdout stays a clean coordinate dump.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Summary printed with `--json`.
#[derive(Serialize)]
struct Report {
    image: String,
    config: ConvertConfig,
    /// Contours plus connectors.
    segments: usize,
    ordered_points: usize,
    polar_points: usize,
    final_epsilon: f64,
    epsilon_iterations: usize,
    truncated: bool,
    formatted_bytes: usize,
    edge_mask_ms: f64,
    conversion_ms: f64,
}

impl Report {
    fn new(
        cli: &Cli,
        config: &ConvertConfig,
        result: &ConversionResult,
        edge_mask_ms: f64,
        conversion_ms: f64,
    ) -> Self {
        Self {
            image: cli.image_path.display().to_string(),
            config: config.clone(),
            segments: result.processed_contours.len(),
            ordered_points: result.ordered_points.len(),
            polar_points: result.polar_points.len(),
            final_epsilon: result.extraction.epsilon,
            epsilon_iterations: result.extraction.iterations,
            truncated: result.extraction.truncated,
            formatted_bytes: result.formatted.len(),
            edge_mask_ms,
            conversion_ms,
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;
    config.validate().map_err(|e| e.to_string())?;

    let image_bytes = std::fs::read(&cli.image_path)
        .map_err(|e| format!("Error reading {}: {e}", cli.image_path.display()))?;
    tracing::debug!(
        image = %cli.image_path.display(),
        bytes = image_bytes.len(),
        "loaded image"
    );

    let start = Instant::now();
    let mask = sandpath_pipeline::edge::edge_mask_from_bytes(&image_bytes)
        .map_err(|e| format!("Pipeline error: {e}"))?;
    let edge_mask_ms = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    let result = sandpath_pipeline::convert_mask(&mask, &config)
        .map_err(|e| format!("Pipeline error: {e}"))?;
    let conversion_ms = start.elapsed().as_secs_f64() * 1000.0;

    if let Some(ref path) = cli.output {
        std::fs::write(path, &result.formatted)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        eprintln!(
            "Coordinates written to {} ({} points)",
            path.display(),
            result.polar_points.len(),
        );
    }

    if cli.json {
        let report = Report::new(cli, &config, &result, edge_mask_ms, conversion_ms);
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing report: {e}"))?;
        println!("{json}");
    } else if cli.output.is_none() {
        println!("{}", result.formatted);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
