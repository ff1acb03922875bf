//! Report outputs: spread map images and summary documents.

use std::fs;
use std::path::Path;

use ensemble::AnalysisSummary;
use tracing::{info, instrument};
use wx_common::{infer_coordinates, Field, WxError, WxResult};

use crate::colormap::{finite_range, ColorRamp};
use crate::png::encode_png;

/// Default minimum image width in pixels.
pub const DEFAULT_MIN_WIDTH: usize = 800;

/// Labels for a spread map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadMapOptions {
    pub title: Option<String>,
    pub variable_name: Option<String>,
    pub units: Option<String>,
}

impl SpreadMapOptions {
    /// Title, or `Ensemble Spread: {variable}` when none is set.
    pub fn resolved_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            format!(
                "Ensemble Spread: {}",
                self.variable_name.as_deref().unwrap_or("Variable")
            )
        })
    }

    /// Colour bar label, e.g. `Spread (std dev) [K]`.
    pub fn value_label(&self) -> String {
        match &self.units {
            Some(units) => format!("Spread (std dev) [{}]", units),
            None => "Spread (std dev)".to_string(),
        }
    }
}

/// Destination for analysis products.
pub trait ReportSink {
    /// Render a single-variable spread field to `path`.
    fn write_spread_map(&self, std_field: &Field, options: &SpreadMapOptions, path: &Path) -> WxResult<()>;

    /// Write a summary document to `path`.
    fn write_summary(&self, summary: &AnalysisSummary, path: &Path) -> WxResult<()>;
}

/// Writes PNG spread maps and pretty-printed JSON summaries to local files.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    ramp: ColorRamp,
    min_width: usize,
}

impl Default for FileReportSink {
    fn default() -> Self {
        Self {
            ramp: ColorRamp::ylorrd(),
            min_width: DEFAULT_MIN_WIDTH,
        }
    }
}

impl FileReportSink {
    pub fn new(ramp: ColorRamp, min_width: usize) -> Self {
        Self { ramp, min_width }
    }

    /// Encode the spread field as PNG bytes.
    pub fn render_spread_map(&self, std_field: &Field, options: &SpreadMapOptions) -> WxResult<Vec<u8>> {
        let raster = Raster::from_field(std_field)?;
        let (min, max) = finite_range(&raster.values).unwrap_or((0.0, 0.0));

        let cells = self.ramp.render(&raster.values, min, max);
        let scale = self.min_width.div_ceil(raster.width).max(1);
        let (pixels, width, height) = upscale(&cells, raster.width, raster.height, scale);

        let title = options.resolved_title();
        let label = options.value_label();
        let range = format!("{} .. {}", min, max);
        encode_png(
            &pixels,
            width,
            height,
            &[
                ("Title", title.as_str()),
                ("Description", label.as_str()),
                ("Range", range.as_str()),
            ],
        )
    }
}

impl ReportSink for FileReportSink {
    #[instrument(skip(self, std_field, options), fields(path = %path.display()))]
    fn write_spread_map(&self, std_field: &Field, options: &SpreadMapOptions, path: &Path) -> WxResult<()> {
        let png = self.render_spread_map(std_field, options)?;
        ensure_parent(path)?;
        fs::write(path, &png)?;
        info!(bytes = png.len(), "Spread map saved");
        Ok(())
    }

    #[instrument(skip(self, summary), fields(path = %path.display()))]
    fn write_summary(&self, summary: &AnalysisSummary, path: &Path) -> WxResult<()> {
        let json = serde_json::to_string_pretty(summary)?;
        ensure_parent(path)?;
        fs::write(path, json)?;
        info!("Analysis results exported");
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> WxResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

/// Row-major lat × lon values with the northernmost row first.
struct Raster {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl Raster {
    fn from_field(field: &Field) -> WxResult<Self> {
        let var = field
            .variables()
            .next()
            .ok_or_else(|| WxError::Render("spread field has no variables".to_string()))?;

        let names = infer_coordinates(field);
        let (lat_name, lon_name) = names.require_spatial()?;
        let dims = var.dims();
        let n = dims.len();
        if n < 2 || dims[n - 2] != lat_name || dims[n - 1] != lon_name {
            return Err(WxError::Render(format!(
                "{} must end in ({}, {}), has {:?}",
                var.name(),
                lat_name,
                lon_name,
                dims
            )));
        }

        let height = var.shape()[n - 2];
        let width = var.shape()[n - 1];
        if width == 0 || height == 0 {
            return Err(WxError::Render(format!("{} has an empty grid", var.name())));
        }
        if var.len() != width * height {
            return Err(WxError::Render(format!(
                "{} has extra dimensions {:?}; select a single slice first",
                var.name(),
                &dims[..n - 2]
            )));
        }

        let ascending = field
            .coord(lat_name)
            .map_or(false, |lat| lat.len() > 1 && lat[0] < lat[lat.len() - 1]);

        let values = if ascending {
            var.values()
                .chunks_exact(width)
                .rev()
                .flatten()
                .copied()
                .collect()
        } else {
            var.values().to_vec()
        };

        Ok(Self {
            values,
            width,
            height,
        })
    }
}

/// Repeat every cell as a `scale` × `scale` block.
fn upscale(cells: &[u8], width: usize, height: usize, scale: usize) -> (Vec<u8>, usize, usize) {
    if scale == 1 {
        return (cells.to_vec(), width, height);
    }

    let out_width = width * scale;
    let mut pixels = Vec::with_capacity(out_width * height * scale * 4);
    for row in cells.chunks_exact(width * 4) {
        let mut line = Vec::with_capacity(out_width * 4);
        for px in row.chunks_exact(4) {
            for _ in 0..scale {
                line.extend_from_slice(px);
            }
        }
        for _ in 0..scale {
            pixels.extend_from_slice(&line);
        }
    }
    (pixels, out_width, height * scale)
}
