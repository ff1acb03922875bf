//! Common test fixtures for wx-ensemble tests.

/// Common regions as (lat_min, lat_max, lon_min, lon_max).
pub mod region {
    /// Whole globe.
    pub const GLOBAL: (f64, f64, f64, f64) = (-90.0, 90.0, -180.0, 180.0);

    /// Europe.
    pub const EUROPE: (f64, f64, f64, f64) = (35.0, 72.0, -25.0, 45.0);

    /// Continental United States.
    pub const CONUS: (f64, f64, f64, f64) = (20.0, 55.0, -130.0, -60.0);

    /// Invalid region (min > max).
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 5.0, 10.0, 5.0);
}

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests (2024-01-15T12:00:00Z)
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";

    /// GFS model run times
    pub const GFS_CYCLES: [&str; 4] = ["00", "06", "12", "18"];

    /// Common forecast hours
    pub const FORECAST_HOURS: [u32; 6] = [0, 6, 12, 24, 48, 120];
}

/// A complete tool configuration in YAML form.
pub const SAMPLE_CONFIG_YAML: &str = r#"
regions:
  europe:
    lat_min: 35.0
    lat_max: 72.0
    lon_min: -25.0
    lon_max: 45.0
  test_box:
    lat_min: 40.0
    lat_max: 48.0
    lon_min: -10.0
    lon_max: 10.0

reference_grids:
  gfs_0p25:
    resolution: 0.25
    description: "GFS native 0.25 degree grid"
  coarse_2p0:
    resolution: 2.0
    description: "Coarse grid for quick comparisons"

providers:
  local_gfs:
    type: file
    name: "GFS (local)"
    base_url: "${WX_DATA_DIR:-/tmp/wx}/gfs/{date}/{cycle}/{variable}_f{fhour}.json"
    variables:
      t2m: TMP_2m
      u10: UGRD_10m
    forecast_hours: [0, 6, 12, 24]
    cycles: ["00", "06", "12", "18"]
  archived:
    type: file
    base_url: "/data/archive/{date}.json"
    enabled: false

defaults:
  region: test_box
  reference_grid: coarse_2p0
  regrid_method: bilinear
  forecast_hour: 0
  output_dir: output
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_are_ordered() {
        for (lat_min, lat_max, lon_min, lon_max) in [region::GLOBAL, region::EUROPE, region::CONUS] {
            assert!(lat_min < lat_max);
            assert!(lon_min < lon_max);
        }
    }

    #[test]
    fn test_sample_config_mentions_every_section() {
        for section in ["regions:", "reference_grids:", "providers:", "defaults:"] {
            assert!(SAMPLE_CONFIG_YAML.contains(section));
        }
    }
}
