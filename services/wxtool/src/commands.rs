//! Subcommand implementations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use ensemble::{analyze, format_summary};
use grid_regrid::{grid_from_config, grid_from_field, Regridder, WeightCache};
use renderer::{FileReportSink, ReportSink, SpreadMapOptions};
use sources::ProviderRegistry;
use tracing::info;
use wx_common::time::parse_run_time;
use wx_common::{load_field, save_field, subset_bbox, BoundingBox, Field, GeoGrid};

use crate::cli::{AnalyzeArgs, DownloadArgs, RegridArgs};
use crate::config::AppConfig;

// ============================================================================
// download
// ============================================================================

pub fn download(config: &AppConfig, args: &DownloadArgs) -> Result<PathBuf> {
    let run_time = args
        .run_time
        .as_deref()
        .map(parse_run_time)
        .transpose()
        .context("Invalid --run-time")?;
    let forecast_hour = args.forecast_hour.unwrap_or(config.defaults.forecast_hour);

    info!(provider = %args.provider, "Initializing provider");
    let registry = ProviderRegistry::new(config.providers.clone());
    let source = registry.get(&args.provider)?;

    info!(variable = %args.variable, forecast_hour, "Downloading");
    let mut field = source.open(&args.variable, forecast_hour, run_time)?;

    if let Some(bbox) = requested_bounds(config, args)? {
        field = subset_bbox(&field, &bbox)?;
    }

    let output = args.output.clone().unwrap_or_else(|| {
        config.defaults.output_dir.join(format!(
            "{}_{}_f{:03}.json",
            args.provider, args.variable, forecast_hour
        ))
    });

    save_field(&field, &output)?;
    Ok(output)
}

fn requested_bounds(config: &AppConfig, args: &DownloadArgs) -> Result<Option<BoundingBox>> {
    let bbox = match (&args.region, &args.bounds) {
        (Some(region), _) => *config.grids.region(region)?,
        (None, Some(bounds)) => BoundingBox::from_bounds_string(bounds)?,
        (None, None) => return Ok(None),
    };
    bbox.validate()?;
    Ok(Some(bbox))
}

// ============================================================================
// regrid
// ============================================================================

pub fn regrid(config: &AppConfig, args: &RegridArgs) -> Result<PathBuf> {
    info!(source = %args.source.display(), "Loading source field");
    let field = load_field(&args.source)?;

    let target = resolve_target(config, &args.target_grid, args.region.as_deref())?;
    let method = args.method.unwrap_or(config.defaults.regrid_method);

    let regridder = Regridder::new(Arc::new(WeightCache::new()), config.regrid.clone());
    let regridded = regridder.regrid(&field, &target, method)?;

    save_field(&regridded, &args.output)?;
    Ok(args.output.clone())
}

/// A field file's grid when `target` names an existing file, otherwise a
/// named reference grid over `region` (or the default region).
fn resolve_target(config: &AppConfig, target: &str, region: Option<&str>) -> Result<GeoGrid> {
    let path = Path::new(target);
    if path.is_file() {
        info!(path = %path.display(), "Loading target grid from file");
        return Ok(grid_from_field(&load_field(path)?)?);
    }

    let region = region
        .or(config.defaults.region.as_deref())
        .context("No --region given and no defaults.region configured")?;

    info!(grid = target, region, "Creating target grid");
    Ok(grid_from_config(&config.grids, target, region)?)
}

// ============================================================================
// analyze
// ============================================================================

/// Paths written by `analyze`, plus the printed report.
pub struct AnalyzeOutput {
    pub report: String,
    pub spread_map: PathBuf,
    pub json: Option<PathBuf>,
}

pub fn analyze_files(config: &AppConfig, args: &AnalyzeArgs) -> Result<AnalyzeOutput> {
    info!(count = args.files.len(), "Loading fields");
    let mut fields = args
        .files
        .iter()
        .map(|path| load_field(path).with_context(|| format!("Failed to load {}", path.display())))
        .collect::<Result<Vec<Field>>>()?;

    if let Some(target) = &args.target_grid {
        let grid = resolve_target(config, target, args.region.as_deref())?;
        let regridder = Regridder::new(Arc::new(WeightCache::new()), config.regrid.clone());
        fields = regridder.regrid_to_common_grid(&fields, &grid, config.defaults.regrid_method)?;
    }

    let labels = (!args.labels.is_empty()).then_some(args.labels.as_slice());
    let analysis = analyze(&fields, &args.variable, labels)?;

    let units = analysis
        .spread
        .std
        .variable(&args.variable)
        .map(|v| v.units().to_string())
        .filter(|u| !u.is_empty());
    let options = SpreadMapOptions {
        title: args.title.clone(),
        variable_name: Some(args.variable.clone()),
        units,
    };

    let sink = FileReportSink::default();
    sink.write_spread_map(&analysis.spread.std, &options, &args.output)?;
    if let Some(json) = &args.json {
        sink.write_summary(&analysis.summary, json)?;
    }

    Ok(AnalyzeOutput {
        report: format_summary(&analysis.summary),
        spread_map: args.output.clone(),
        json: args.json.clone(),
    })
}

// ============================================================================
// info
// ============================================================================

pub fn describe(config: &AppConfig) -> String {
    ConfigReport(config).to_string()
}

struct ConfigReport<'a>(&'a AppConfig);

impl fmt::Display for ConfigReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.0;
        let rule = "=".repeat(70);

        writeln!(out, "\n{}", rule)?;
        writeln!(out, "wxtool configuration")?;
        writeln!(out, "{}", rule)?;

        writeln!(out, "\n--- Available Providers ---")?;
        for (name, provider) in &config.providers {
            let status = if provider.enabled { "✓" } else { "✗" };
            let display = provider.name.as_deref().unwrap_or(name);
            writeln!(out, "  {} {}: {} ({})", status, name, display, provider.kind)?;
        }

        writeln!(out, "\n--- Available Regions ---")?;
        for (name, r) in &config.grids.regions {
            writeln!(
                out,
                "  • {}: lat=[{}, {}], lon=[{}, {}]",
                name, r.lat_min, r.lat_max, r.lon_min, r.lon_max
            )?;
        }

        writeln!(out, "\n--- Reference Grids ---")?;
        for (name, grid) in &config.grids.reference_grids {
            writeln!(out, "  • {}: {}° - {}", name, grid.resolution, grid.description)?;
        }

        writeln!(out, "\n{}\n", rule)
    }
}
