//! wxtool: download, regrid and compare gridded weather forecasts.
//!
//! ```text
//! download ─► provider ─► (subset) ─► field.json
//! regrid   ─► field.json ─► reference grid ─► field.json
//! analyze  ─► field.json × N ─► (align) ─► spread.png + summary.json
//! info     ─► configured providers, regions, reference grids
//! ```

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Command, LogFormat};

fn main() {
    let args = Cli::parse();

    if let Err(e) = init_tracing(&args.log_level, args.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(args) {
        error!(error = %e, "Command failed");
        eprintln!("✗ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::load_config(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;
    info!(
        providers = ?config.providers.keys().collect::<Vec<_>>(),
        regions = config.grids.regions.len(),
        "Loaded configuration"
    );

    match &args.command {
        Command::Download(download) => {
            let path = commands::download(&config, download).context("Download failed")?;
            println!("✓ Successfully downloaded data to: {}", path.display());
        }
        Command::Regrid(regrid) => {
            let path = commands::regrid(&config, regrid).context("Regridding failed")?;
            println!("✓ Successfully regridded data to: {}", path.display());
        }
        Command::Analyze(analyze) => {
            let output = commands::analyze_files(&config, analyze).context("Analysis failed")?;
            print!("{}", output.report);
            if let Some(json) = &output.json {
                println!("✓ Analysis results saved to: {}", json.display());
            }
            println!("✓ Spread map saved to: {}", output.spread_map.display());
        }
        Command::Info => print!("{}", commands::describe(&config)),
    }

    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only command output.
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}
