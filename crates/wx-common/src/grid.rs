//! Regular lat/lon grid definitions.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::coords::wrap_longitudes;
use crate::error::{WxError, WxResult};

/// A separable lat/lon grid defined by its 1-D cell-center axes.
///
/// Both axes are strictly ascending. Latitudes lie in [-90, 90]; longitudes
/// lie in [-180, 360] and in [-180, 180) once normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct GeoGrid {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

#[derive(Deserialize)]
struct RawGrid {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl TryFrom<RawGrid> for GeoGrid {
    type Error = WxError;

    fn try_from(raw: RawGrid) -> WxResult<Self> {
        GeoGrid::new(raw.lat, raw.lon)
    }
}

impl GeoGrid {
    /// Create a grid, validating both axes.
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> WxResult<Self> {
        validate_axis("latitude", &lat, -90.0, 90.0)?;
        validate_axis("longitude", &lon, -180.0, 360.0)?;
        Ok(Self { lat, lon })
    }

    /// Latitude cell centers (ascending).
    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    /// Longitude cell centers (ascending).
    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// Grid dimensions as (nlat, nlon).
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.lat.len() * self.lon.len()
    }

    /// Grids always hold at least one cell.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major (lat-major) flattened index of a cell.
    pub fn flat_index(&self, lat_idx: usize, lon_idx: usize) -> usize {
        lat_idx * self.lon.len() + lon_idx
    }

    /// Bounding box of the cell centers.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.lat[0],
            self.lat[self.lat.len() - 1],
            self.lon[0],
            self.lon[self.lon.len() - 1],
        )
    }

    /// Re-express longitudes in [-180, 180) when the grid is in 0..360 form.
    pub fn normalized(&self) -> WxResult<Self> {
        match wrap_longitudes(&self.lon) {
            Some((lon, _)) => GeoGrid::new(self.lat.clone(), lon),
            None => Ok(self.clone()),
        }
    }
}

/// Check an axis is non-empty, finite, strictly ascending and in range.
pub fn validate_axis(name: &str, values: &[f64], min: f64, max: f64) -> WxResult<()> {
    if values.is_empty() {
        return Err(WxError::InvalidGrid(format!("{} axis is empty", name)));
    }

    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(WxError::InvalidGrid(format!(
            "{} axis contains non-finite value {}",
            name, bad
        )));
    }

    if let Some(pos) = values.windows(2).position(|w| w[1] <= w[0]) {
        let kind = if values[pos + 1] == values[pos] {
            "duplicate"
        } else {
            "non-monotonic"
        };
        return Err(WxError::InvalidGrid(format!(
            "{} axis has {} coordinate at index {} ({} after {})",
            name,
            kind,
            pos + 1,
            values[pos + 1],
            values[pos]
        )));
    }

    let (first, last) = (values[0], values[values.len() - 1]);
    if first < min || last > max {
        return Err(WxError::InvalidGrid(format!(
            "{} axis [{}, {}] outside [{}, {}]",
            name, first, last, min, max
        )));
    }

    Ok(())
}
