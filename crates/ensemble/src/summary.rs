//! Ensemble analysis summary document.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use wx_common::{Field, WxResult};

use crate::locations::{top_spread_locations, SpreadLocation};
use crate::pairwise::resolve_labels;
use crate::spread::{compute_spread, finite_mean, Spread};

/// Number of hot spots reported by [`analyze`].
pub const TOP_LOCATIONS: usize = 3;

/// Aggregate statistics of the spread field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadStatistics {
    pub mean_spread: f64,
    pub max_spread: f64,
    pub min_spread: f64,
}

/// Statistics of one member over its whole variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatistics {
    pub label: String,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Result of [`analyze`]; serialized as the JSON summary report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub variable: String,
    pub n_models: usize,
    pub spread_statistics: SpreadStatistics,
    pub top_spread_locations: Vec<SpreadLocation>,
    pub model_statistics: Vec<ModelStatistics>,
}

/// A summary together with the spread it was computed from.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub summary: AnalysisSummary,
    pub spread: Spread,
}

/// Compare grid-aligned members of one variable.
#[instrument(skip(fields, labels), fields(members = fields.len()))]
pub fn analyze(fields: &[Field], variable: &str, labels: Option<&[String]>) -> WxResult<Analysis> {
    info!("Analyzing ensemble");

    let spread = compute_spread(fields, variable)?;
    let labels = resolve_labels(fields.len(), labels)?;

    let std_values = spread
        .std
        .variable(variable)
        .map(|v| v.values())
        .unwrap_or_default();
    let (min_spread, max_spread) = finite_range(std_values);
    let spread_statistics = SpreadStatistics {
        mean_spread: finite_mean(std_values),
        max_spread,
        min_spread,
    };

    let top = top_spread_locations(&spread.std, TOP_LOCATIONS)?;

    let model_statistics = spread
        .stack
        .members()
        .iter()
        .zip(labels)
        .map(|(member, label)| {
            let values = member.values();
            let (min, max) = finite_range(values);
            ModelStatistics {
                label,
                mean: finite_mean(values),
                std: finite_std(values),
                min,
                max,
            }
        })
        .collect();

    let summary = AnalysisSummary {
        variable: variable.to_string(),
        n_models: fields.len(),
        spread_statistics,
        top_spread_locations: top,
        model_statistics,
    };

    info!(
        mean_spread = summary.spread_statistics.mean_spread,
        max_spread = summary.spread_statistics.max_spread,
        "Analysis complete"
    );
    Ok(Analysis { summary, spread })
}

/// Human-readable report of a summary.
pub fn format_summary(summary: &AnalysisSummary) -> String {
    summary.to_string()
}

impl fmt::Display for AnalysisSummary {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);

        writeln!(out, "\n{}", rule)?;
        writeln!(out, "ENSEMBLE ANALYSIS SUMMARY")?;
        writeln!(out, "{}", rule)?;
        writeln!(out, "\nVariable: {}", self.variable)?;
        writeln!(out, "Number of models: {}", self.n_models)?;

        let stats = &self.spread_statistics;
        writeln!(out, "\n--- Spread Statistics ---")?;
        writeln!(out, "  Mean spread:   {:.4}", stats.mean_spread)?;
        writeln!(out, "  Max spread:    {:.4}", stats.max_spread)?;
        writeln!(out, "  Min spread:    {:.4}", stats.min_spread)?;

        writeln!(
            out,
            "\n--- Top {} Locations with Highest Spread ---",
            self.top_spread_locations.len()
        )?;
        for (i, loc) in self.top_spread_locations.iter().enumerate() {
            writeln!(
                out,
                "  {}. Lat: {:7.2}°, Lon: {:7.2}°, Spread: {:.4}",
                i + 1,
                loc.lat,
                loc.lon,
                loc.value
            )?;
        }

        writeln!(out, "\n--- Individual Model Statistics ---")?;
        for model in &self.model_statistics {
            writeln!(out, "\n  {}:", model.label)?;
            writeln!(out, "    Mean: {:.4}", model.mean)?;
            writeln!(out, "    Std:  {:.4}", model.std)?;
            writeln!(out, "    Min:  {:.4}", model.min)?;
            writeln!(out, "    Max:  {:.4}", model.max)?;
        }

        writeln!(out, "\n{}", rule)
    }
}

fn finite_range(values: &[f32]) -> (f64, f64) {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::NAN, f64::NAN), |(lo, hi), &v| {
            (lo.min(v as f64), hi.max(v as f64))
        })
}

fn finite_std(values: &[f32]) -> f64 {
    let mean = finite_mean(values);
    let (sum_sq, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0usize), |(s, n), &v| (s + (v as f64 - mean).powi(2), n + 1));
    if count == 0 {
        f64::NAN
    } else {
        (sum_sq / count as f64).sqrt()
    }
}
