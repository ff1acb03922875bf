//! Reference (target) grid construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use wx_common::coords::normalize;
use wx_common::{BoundingBox, Field, GeoGrid, WxError, WxResult};

/// A named reference grid resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceGridSpec {
    /// Grid spacing in degrees.
    pub resolution: f64,
    #[serde(default)]
    pub description: String,
}

/// Named regions and reference grids, as found in the tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridCatalog {
    #[serde(default)]
    pub regions: BTreeMap<String, BoundingBox>,
    #[serde(default)]
    pub reference_grids: BTreeMap<String, ReferenceGridSpec>,
}

impl GridCatalog {
    pub fn region(&self, name: &str) -> WxResult<&BoundingBox> {
        self.regions.get(name).ok_or_else(|| WxError::UnknownRegion {
            name: name.to_string(),
            available: self.regions.keys().cloned().collect(),
        })
    }

    pub fn reference_grid(&self, name: &str) -> WxResult<&ReferenceGridSpec> {
        self.reference_grids
            .get(name)
            .ok_or_else(|| WxError::UnknownGrid {
                name: name.to_string(),
                available: self.reference_grids.keys().cloned().collect(),
            })
    }
}

/// Regular grid covering `bounds` (inclusive) with the given spacing.
///
/// Each axis runs `min, min + res, ...` up to and including `max` when `max`
/// falls on the lattice.
pub fn create_reference_grid(bounds: &BoundingBox, resolution: f64) -> WxResult<GeoGrid> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(WxError::InvalidResolution(resolution));
    }
    bounds.validate()?;

    info!(
        lat_min = bounds.lat_min,
        lat_max = bounds.lat_max,
        lon_min = bounds.lon_min,
        lon_max = bounds.lon_max,
        resolution,
        "Creating reference grid"
    );

    let lat = lattice(bounds.lat_min, bounds.lat_max, resolution);
    let lon = lattice(bounds.lon_min, bounds.lon_max, resolution);
    let grid = GeoGrid::new(lat, lon)?;

    info!(nlat = grid.shape().0, nlon = grid.shape().1, "Created reference grid");
    Ok(grid)
}

/// Reference grid for a named grid resolution over a named region.
pub fn grid_from_config(catalog: &GridCatalog, grid_name: &str, region_name: &str) -> WxResult<GeoGrid> {
    let spec = catalog.reference_grid(grid_name)?;
    let region = catalog.region(region_name)?;
    create_reference_grid(region, spec.resolution)
}

/// Use an existing field's (normalized) grid as a target.
pub fn grid_from_field(field: &Field) -> WxResult<GeoGrid> {
    normalize(field)?.geo_grid()
}

fn lattice(min: f64, max: f64, step: f64) -> Vec<f64> {
    let n = ((max - min) / step + 1e-9).floor() as usize + 1;
    (0..n).map(|i| min + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::SAMPLE_CONFIG_YAML;

    #[test]
    fn test_reference_grid_inclusive() {
        let grid = create_reference_grid(&BoundingBox::new(40.0, 48.0, -10.0, 10.0), 2.0).unwrap();
        assert_eq!(grid.lat(), &[40.0, 42.0, 44.0, 46.0, 48.0]);
        assert_eq!(grid.shape(), (5, 11));
    }

    #[test]
    fn test_fractional_resolution() {
        let grid = create_reference_grid(&BoundingBox::new(0.0, 1.0, 0.0, 0.5), 0.25).unwrap();
        assert_eq!(grid.shape(), (5, 3));
        assert_eq!(grid.lon(), &[0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_non_lattice_max_is_excluded() {
        let grid = create_reference_grid(&BoundingBox::new(0.0, 1.0, 0.0, 1.0), 0.3).unwrap();
        assert_eq!(grid.shape(), (4, 4));
    }

    #[test]
    fn test_invalid_resolution() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        assert!(matches!(create_reference_grid(&bbox, 0.0), Err(WxError::InvalidResolution(_))));
        assert!(matches!(create_reference_grid(&bbox, -1.0), Err(WxError::InvalidResolution(_))));
        assert!(create_reference_grid(&bbox, f64::NAN).is_err());
    }

    #[test]
    fn test_grid_from_config() {
        let catalog: GridCatalog = serde_yaml::from_str(SAMPLE_CONFIG_YAML).unwrap();
        let grid = grid_from_config(&catalog, "coarse_2p0", "test_box").unwrap();
        assert_eq!(grid.shape(), (5, 11));

        let err = grid_from_config(&catalog, "missing", "test_box").unwrap_err();
        assert!(matches!(err, WxError::UnknownGrid { .. }));
        let err = grid_from_config(&catalog, "coarse_2p0", "atlantis").unwrap_err();
        match err {
            WxError::UnknownRegion { name, available } => {
                assert_eq!(name, "atlantis");
                assert!(available.contains(&"europe".to_string()));
            }
            other => panic!("expected UnknownRegion, got {:?}", other),
        }
    }

    #[test]
    fn test_grid_from_field_normalizes() {
        let field = test_utils::grid_field(vec![10.0, 0.0], vec![0.0, 270.0], "t2m", vec![0.0; 4]);
        let grid = grid_from_field(&field).unwrap();
        assert_eq!(grid.lat(), &[0.0, 10.0]);
        assert_eq!(grid.lon(), &[-90.0, 0.0]);
    }
}
