//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use grid_regrid::RegridMethod;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "wxtool")]
#[command(about = "Download, regrid and compare gridded weather forecasts")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "WXTOOL_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WXTOOL_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one variable from a provider and save it locally
    Download(DownloadArgs),
    /// Regrid a saved field onto a reference grid
    Regrid(RegridArgs),
    /// Compare several grid-aligned fields
    Analyze(AnalyzeArgs),
    /// Show configured providers, regions and reference grids
    Info,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Provider name from the configuration
    #[arg(long)]
    pub provider: String,

    /// Standard variable name (e.g. t2m, u10)
    #[arg(long)]
    pub variable: String,

    /// Forecast hour (defaults to defaults.forecast_hour)
    #[arg(long)]
    pub forecast_hour: Option<u32>,

    /// Model run time in ISO 8601; the latest run when omitted
    #[arg(long)]
    pub run_time: Option<String>,

    /// Region name to subset to
    #[arg(long, conflicts_with = "bounds")]
    pub region: Option<String>,

    /// Custom bounds as lat_min,lat_max,lon_min,lon_max
    #[arg(long, allow_hyphen_values = true)]
    pub bounds: Option<String>,

    /// Output file (defaults to {output_dir}/{provider}_{variable}_f{hour}.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RegridArgs {
    /// Field file to regrid
    #[arg(long)]
    pub source: PathBuf,

    /// Reference grid name from the configuration, or a field file whose
    /// grid is used
    #[arg(long)]
    pub target_grid: String,

    /// Region for a named reference grid (defaults to defaults.region)
    #[arg(long)]
    pub region: Option<String>,

    /// Interpolation method (defaults to defaults.regrid_method)
    #[arg(long)]
    pub method: Option<RegridMethod>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Variable present in every file
    #[arg(long = "var")]
    pub variable: String,

    /// Input field files; repeat for each member
    #[arg(long = "files", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Labels in the same order as the files
    #[arg(long = "labels", num_args = 1..)]
    pub labels: Vec<String>,

    /// Align members onto this reference grid (name or field file) first
    #[arg(long)]
    pub target_grid: Option<String>,

    /// Region for a named reference grid (defaults to defaults.region)
    #[arg(long)]
    pub region: Option<String>,

    /// Spread map title
    #[arg(long)]
    pub title: Option<String>,

    /// Output PNG for the spread map
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional JSON summary output
    #[arg(long)]
    pub json: Option<PathBuf>,
}
