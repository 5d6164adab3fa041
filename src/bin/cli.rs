//! patroltrace CLI - Debug tool for movement-trace analysis
//!
//! Usage:
//!   patroltrace-cli cluster <trace.json> [--epsilon <e>] [--min-points <n>]
//!   patroltrace-cli simplify <trace.json> [--epsilon <e>] [--preserve-sharp-turns]
//!   patroltrace-cli patrol <trace.json> [--tolerance <t>] [--use-headings]
//!   patroltrace-cli velocity <trace.json> [--window <n>]
//!   patroltrace-cli analyze <trace.json> [--config <config.json>]
//!
//! Traces are JSON `{"name": ..., "points": [{"position": {"x","y","z"},
//! "timestamp_ms": ..., "heading": ...}]}`. Results are printed to stdout as
//! pretty JSON; log output goes to stderr.

use clap::{Parser, Subcommand};
use log::info;
use patroltrace::{
    AnalysisConfig, ClusterConfig, OptionExt, PatrolConfig, SimplifyConfig, Trace, analyze_path,
    analyze_trace, cluster, instantaneous, smoothed,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "patroltrace-cli")]
#[command(about = "Debug tool for movement-trace analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Density-cluster the trace positions
    Cluster {
        /// Trace JSON file
        trace: PathBuf,

        /// Neighbourhood radius
        #[arg(long, default_value = "0.5")]
        epsilon: f64,

        /// Minimum neighbourhood size (including the point) for a core point
        #[arg(long, default_value = "2")]
        min_points: usize,
    },

    /// Simplify the trace polyline and classify it
    Simplify {
        /// Trace JSON file
        trace: PathBuf,

        /// Maximum perpendicular deviation
        #[arg(long, default_value = "0.5")]
        epsilon: f64,

        /// Keep sharp turns even when they are within epsilon
        #[arg(long)]
        preserve_sharp_turns: bool,

        /// Turn angle in degrees counted as sharp
        #[arg(long, default_value = "150")]
        sharp_angle: f64,

        /// Loop / reverse classification tolerance
        #[arg(long, default_value = "1.0")]
        tolerance: f64,
    },

    /// Split the raw trace into patrol segments
    Patrol {
        /// Trace JSON file
        trace: PathBuf,

        /// Loop / reverse tolerance
        #[arg(long, default_value = "1.0")]
        tolerance: f64,

        /// Heading (or turn) change in degrees that starts a new segment
        #[arg(long, default_value = "150")]
        rotation_threshold: f64,

        /// Split on sample headings instead of geometric turns
        #[arg(long)]
        use_headings: bool,
    },

    /// Instantaneous and smoothed velocities
    Velocity {
        /// Trace JSON file
        trace: PathBuf,

        /// Smoothing window size
        #[arg(short, long, default_value = "5")]
        window: usize,
    },

    /// Run the full analysis pipeline
    Analyze {
        /// Trace JSON file
        trace: PathBuf,

        /// Optional AnalysisConfig JSON file (defaults otherwise)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), String> {
    match command {
        Commands::Cluster {
            trace,
            epsilon,
            min_points,
        } => {
            let trace = load_trace(&trace)?;
            let config = ClusterConfig {
                epsilon,
                min_points,
                ..ClusterConfig::default()
            };
            let result = cluster(&trace.positions(), &config).map_err(|e| e.to_string())?;
            info!(
                "[CLI] {} clusters, {} noise points",
                result.clusters.len(),
                result.noise.len()
            );
            print_json(&result)
        }
        Commands::Simplify {
            trace,
            epsilon,
            preserve_sharp_turns,
            sharp_angle,
            tolerance,
        } => {
            let trace = load_trace(&trace)?;
            let config = SimplifyConfig {
                epsilon,
                sharp_angle_threshold_deg: sharp_angle,
                preserve_sharp_turns,
            };
            let simplified = config
                .apply(&trace.positions())
                .map_err(|e| e.to_string())?
                .classified(tolerance);
            print_json(&simplified)
        }
        Commands::Patrol {
            trace,
            tolerance,
            rotation_threshold,
            use_headings,
        } => {
            let trace = load_trace(&trace)?;
            let headings = if use_headings {
                Some(
                    trace
                        .headings()
                        .ok_or_else(|| "--use-headings needs a heading on every sample".to_string())?,
                )
            } else {
                None
            };
            let config = PatrolConfig {
                rotation_threshold_deg: rotation_threshold,
                loop_tolerance: tolerance,
                ..PatrolConfig::default()
            };
            let segments = analyze_path(&trace.positions(), headings.as_deref(), &config)
                .map_err(|e| e.to_string())?;
            print_json(&segments)
        }
        Commands::Velocity { trace, window } => {
            let trace = load_trace(&trace)?;
            trace
                .points
                .get(1)
                .ok_or_insufficient_points("velocity", trace.len(), 2)
                .map_err(|e| e.to_string())?;

            #[derive(Serialize)]
            struct VelocityReport {
                instantaneous: Vec<patroltrace::VelocitySample>,
                smoothed: Vec<patroltrace::VelocitySample>,
            }

            let report = VelocityReport {
                instantaneous: instantaneous(&trace.points),
                smoothed: smoothed(&trace.points, window).map_err(|e| e.to_string())?,
            };
            print_json(&report)
        }
        Commands::Analyze { trace, config } => {
            let trace = load_trace(&trace)?;
            let config: AnalysisConfig = match config {
                Some(path) => read_json(&path)?,
                None => AnalysisConfig::default(),
            };
            let analysis = analyze_trace(&trace, &config).map_err(|e| e.to_string())?;
            print_json(&analysis)
        }
    }
}

/// Load a trace and log a one-line summary of it.
fn load_trace(path: &Path) -> Result<Trace, String> {
    let mut trace: Trace = read_json(path)?;
    if trace.name.is_empty() {
        trace.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
    }
    info!(
        "[CLI] Loaded '{}' - {} points over {:.1}s",
        trace.name,
        trace.len(),
        trace.duration_ms() as f64 / 1000.0
    );
    Ok(trace)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
