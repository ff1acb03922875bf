//! Coordinate axis detection and normalization.
//!
//! Data sources disagree on axis naming (`lat` vs `latitude`) and on
//! longitude convention (0..360 vs -180..180). Everything downstream of the
//! data sources expects ascending axes with longitudes in [-180, 180).

use tracing::debug;

use crate::error::{WxError, WxResult};
use crate::field::Field;

/// Latitude axis aliases, in lookup order.
pub const LAT_ALIASES: &[&str] = &["latitude", "lat", "y", "rlat"];

/// Longitude axis aliases, in lookup order.
pub const LON_ALIASES: &[&str] = &["longitude", "lon", "x", "rlon"];

/// Time axis aliases, in lookup order.
pub const TIME_ALIASES: &[&str] = &["time", "valid_time", "forecast_time"];

/// Axis names resolved for a field. An axis with no match is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateNames {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub time: Option<String>,
}

impl CoordinateNames {
    /// Both spatial axis names, or `GridMismatch` naming the missing one.
    pub fn require_spatial(&self) -> WxResult<(&str, &str)> {
        match (&self.lat, &self.lon) {
            (Some(lat), Some(lon)) => Ok((lat.as_str(), lon.as_str())),
            (None, _) => Err(WxError::GridMismatch(format!(
                "no latitude coordinate found (looked for {:?})",
                LAT_ALIASES
            ))),
            (_, None) => Err(WxError::GridMismatch(format!(
                "no longitude coordinate found (looked for {:?})",
                LON_ALIASES
            ))),
        }
    }
}

/// Identify the lat/lon/time axes of a field.
pub fn infer_coordinates(field: &Field) -> CoordinateNames {
    let find = |aliases: &[&str]| {
        aliases
            .iter()
            .find(|name| field.has_axis(name))
            .map(|name| name.to_string())
    };

    let names = CoordinateNames {
        lat: find(LAT_ALIASES),
        lon: find(LON_ALIASES),
        time: find(TIME_ALIASES),
    };

    debug!(?names, "Inferred coordinates");
    names
}

/// Wrap 0..360 longitudes into [-180, 180) and sort them.
///
/// Returns `None` unless every longitude is >= 0 and the maximum exceeds 180.
/// Otherwise returns the sorted wrapped values together with the source index
/// of each output position.
pub fn wrap_longitudes(lon: &[f64]) -> Option<(Vec<f64>, Vec<usize>)> {
    let min = lon.iter().copied().fold(f64::INFINITY, f64::min);
    let max = lon.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if lon.is_empty() || min < 0.0 || max <= 180.0 {
        return None;
    }

    let wrapped: Vec<f64> = lon
        .iter()
        .map(|&l| (l + 180.0).rem_euclid(360.0) - 180.0)
        .collect();

    let mut order: Vec<usize> = (0..wrapped.len()).collect();
    order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));

    let sorted = order.iter().map(|&i| wrapped[i]).collect();
    Some((sorted, order))
}

/// Re-express longitudes in [-180, 180) and re-sort ascending.
///
/// Applies only when the field's longitudes are all >= 0 with a maximum above
/// 180; in every other case (including a second application) the field is
/// returned unchanged.
pub fn normalize_longitude(field: &Field) -> WxResult<Field> {
    let Some(lon_name) = infer_coordinates(field).lon else {
        return Ok(field.clone());
    };
    let Some(lon) = field.coord(&lon_name) else {
        return Ok(field.clone());
    };
    let Some((sorted, order)) = wrap_longitudes(lon) else {
        return Ok(field.clone());
    };

    debug!(axis = %lon_name, "Converting longitudes from [0, 360] to [-180, 180]");

    field
        .take_axis(&lon_name, &order)?
        .with_coord(&lon_name, sorted)
}

/// Flip a strictly descending latitude axis to ascending.
pub fn normalize_latitude(field: &Field) -> WxResult<Field> {
    let Some(lat_name) = infer_coordinates(field).lat else {
        return Ok(field.clone());
    };
    let Some(lat) = field.coord(&lat_name) else {
        return Ok(field.clone());
    };

    let descending = lat.len() >= 2 && lat.windows(2).all(|w| w[1] < w[0]);
    if !descending {
        return Ok(field.clone());
    }

    debug!(axis = %lat_name, "Flipping descending latitude axis");

    let order: Vec<usize> = (0..lat.len()).rev().collect();
    field.take_axis(&lat_name, &order)
}

/// Rename the inferred spatial axes to `lat` and `lon`.
pub fn standardize_coordinates(field: &Field) -> WxResult<Field> {
    let names = infer_coordinates(field);
    let mut out = field.clone();

    if let Some(lat) = names.lat.as_deref() {
        if lat != "lat" {
            debug!(from = %lat, "Renaming latitude axis to lat");
            out = out.rename_axis(lat, "lat")?;
        }
    }
    if let Some(lon) = names.lon.as_deref() {
        if lon != "lon" {
            debug!(from = %lon, "Renaming longitude axis to lon");
            out = out.rename_axis(lon, "lon")?;
        }
    }

    Ok(out)
}

/// Full normalization applied before subsetting or regridding.
pub fn normalize(field: &Field) -> WxResult<Field> {
    normalize_latitude(&normalize_longitude(field)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Attributes, Variable, VariableMeta};
    use std::collections::BTreeMap;

    fn field_with(lat_name: &str, lat: Vec<f64>, lon_name: &str, lon: Vec<f64>) -> Field {
        let n = lat.len() * lon.len();
        let mut coords = BTreeMap::new();
        let shape = vec![lat.len(), lon.len()];
        coords.insert(lat_name.to_string(), lat);
        coords.insert(lon_name.to_string(), lon);
        let var = Variable::new(
            VariableMeta::new("temp", "K", "temperature"),
            vec![lat_name.to_string(), lon_name.to_string()],
            shape,
            (0..n).map(|v| v as f32).collect(),
        )
        .unwrap();
        Field::new(coords, vec![var], Attributes::new()).unwrap()
    }

    #[test]
    fn test_infer_standard_names() {
        let field = field_with("lat", vec![0.0, 1.0], "lon", vec![0.0, 1.0]);
        let names = infer_coordinates(&field);
        assert_eq!(names.lat.as_deref(), Some("lat"));
        assert_eq!(names.lon.as_deref(), Some("lon"));
        assert_eq!(names.time, None);
    }

    #[test]
    fn test_infer_prefers_first_alias() {
        let field = field_with("latitude", vec![0.0, 1.0], "longitude", vec![0.0, 1.0]);
        let names = infer_coordinates(&field);
        assert_eq!(names.lat.as_deref(), Some("latitude"));
        assert_eq!(names.lon.as_deref(), Some("longitude"));
    }

    #[test]
    fn test_infer_missing_axis() {
        let field = field_with("rlat", vec![0.0], "depth", vec![0.0]);
        let names = infer_coordinates(&field);
        assert_eq!(names.lat.as_deref(), Some("rlat"));
        assert_eq!(names.lon, None);
        assert!(names.require_spatial().is_err());
    }

    #[test]
    fn test_normalize_longitude_permutes_values() {
        let field = field_with("lat", vec![0.0], "lon", vec![0.0, 90.0, 180.0, 270.0]);
        let norm = normalize_longitude(&field).unwrap();
        assert_eq!(norm.coord("lon").unwrap(), &[-180.0, -90.0, 0.0, 90.0]);
        assert_eq!(norm.variable("temp").unwrap().values(), &[2.0, 3.0, 0.0, 1.0]);
    }

    #[test]
    fn test_normalize_longitude_is_idempotent() {
        let field = field_with("lat", vec![0.0, 1.0], "lon", vec![0.0, 90.0, 180.0, 270.0, 359.0]);
        let once = normalize_longitude(&field).unwrap();
        let twice = normalize_longitude(&once).unwrap();
        assert_eq!(once, twice);
        assert!(once.coord("lon").unwrap().iter().all(|&l| (-180.0..180.0).contains(&l)));
    }

    #[test]
    fn test_normalize_longitude_skips_negative_ranges() {
        let field = field_with("lat", vec![0.0], "lon", vec![-10.0, 200.0]);
        assert_eq!(normalize_longitude(&field).unwrap(), field);
    }

    #[test]
    fn test_normalize_latitude_flips_descending() {
        let field = field_with("lat", vec![90.0, 0.0, -90.0], "lon", vec![0.0]);
        let norm = normalize_latitude(&field).unwrap();
        assert_eq!(norm.coord("lat").unwrap(), &[-90.0, 0.0, 90.0]);
        assert_eq!(norm.variable("temp").unwrap().values(), &[2.0, 1.0, 0.0]);
        assert_eq!(normalize_latitude(&norm).unwrap(), norm);
    }

    #[test]
    fn test_standardize_coordinates() {
        let field = field_with("latitude", vec![0.0], "longitude", vec![0.0]);
        let std = standardize_coordinates(&field).unwrap();
        assert!(std.coord("lat").is_some());
        assert!(std.coord("lon").is_some());
    }
}
