//! PRISM trend toolkit CLI.
//!
//! Builds monthly raster cubes, computes per-unit Mann-Kendall trends over
//! irrigation years, and renders trend maps.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use prism_trends::{
    run_cube, run_map, run_trends, run_water_year_files, CubeArgs, MapArgs, PipelineConfig,
    TrendsArgs, WaterYearArgs,
};

#[derive(Parser, Debug)]
#[command(name = "prism-trends")]
#[command(about = "Irrigation-year trend analysis for PRISM climate grids")]
struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true, env = "PRISM_TRENDS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stack monthly NetCDF slices into one cube
    Cube(CubeArgs),

    /// List the monthly archives of a water year
    WaterYearFiles(WaterYearArgs),

    /// Compute per-unit trends and a label summary
    Trends(TrendsArgs),

    /// Render a trend or attribute map
    Map(MapArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    if cli.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = PipelineConfig::load_or_default(cli.config.as_deref())?;

    match &cli.command {
        Commands::Cube(args) => {
            run_cube(args, &config)?;
        }
        Commands::WaterYearFiles(args) => {
            for path in run_water_year_files(args)? {
                println!("{}", path.display());
            }
        }
        Commands::Trends(args) => {
            for s in run_trends(args, &config)? {
                println!(
                    "{}: {} increasing, {} decreasing, {} no trend",
                    s.variable, s.increasing, s.decreasing, s.no_trend
                );
            }
        }
        Commands::Map(args) => {
            let map = run_map(args, &config)?;
            for warning in &map.warnings {
                eprintln!("warning: {}", warning);
            }
            info!(path = %args.output.display(), "Map saved");
        }
    }

    Ok(())
}
