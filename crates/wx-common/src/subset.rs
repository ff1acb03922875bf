//! Spatial subsetting of fields.

use tracing::info;

use crate::bbox::BoundingBox;
use crate::coords::{infer_coordinates, normalize};
use crate::error::{WxError, WxResult};
use crate::field::Field;

/// Clip a field to a bounding box (inclusive on both axes).
///
/// The field is normalized first (longitudes into [-180, 180), latitude
/// ascending). Bounds given wholly in 0..360 form above 180 are shifted to
/// match. Fails with `EmptySelection` if either axis would be left empty.
pub fn subset(field: &Field, lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> WxResult<Field> {
    let bbox = BoundingBox::new(lat_min, lat_max, lon_min, lon_max);
    bbox.validate()?;

    info!(lat_min, lat_max, lon_min, lon_max, "Subsetting field");

    let field = normalize(field)?;
    let names = infer_coordinates(&field);
    let (lat_name, lon_name) = names.require_spatial()?;
    let (lat_name, lon_name) = (lat_name.to_string(), lon_name.to_string());

    let lon_values = field.coord(&lon_name).unwrap_or_default();
    let bbox = if lon_values.iter().all(|&l| l < 180.0) {
        bbox.normalized()
    } else {
        bbox
    };

    let empty = |axis: &str| WxError::EmptySelection {
        axis: axis.to_string(),
        lat_min,
        lat_max,
        lon_min,
        lon_max,
    };

    let lat_idx = select_range(field.coord(&lat_name).unwrap_or_default(), bbox.lat_min, bbox.lat_max);
    if lat_idx.is_empty() {
        return Err(empty(&lat_name));
    }

    let lon_idx = select_range(lon_values, bbox.lon_min, bbox.lon_max);
    if lon_idx.is_empty() {
        return Err(empty(&lon_name));
    }

    let out = field
        .take_axis(&lat_name, &lat_idx)?
        .take_axis(&lon_name, &lon_idx)?;

    info!(nlat = lat_idx.len(), nlon = lon_idx.len(), "Subset shape");
    Ok(out)
}

/// Convenience wrapper taking a [`BoundingBox`].
pub fn subset_bbox(field: &Field, bbox: &BoundingBox) -> WxResult<Field> {
    subset(field, bbox.lat_min, bbox.lat_max, bbox.lon_min, bbox.lon_max)
}

fn select_range(values: &[f64], min: f64, max: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v >= min && v <= max)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Attributes, Variable, VariableMeta};
    use std::collections::BTreeMap;

    fn global_field() -> Field {
        let lat: Vec<f64> = (0..7).map(|i| 90.0 - 30.0 * i as f64).collect();
        let lon: Vec<f64> = (0..8).map(|i| 45.0 * i as f64).collect();
        let n = lat.len() * lon.len();
        let shape = vec![lat.len(), lon.len()];
        let mut coords = BTreeMap::new();
        coords.insert("latitude".to_string(), lat);
        coords.insert("longitude".to_string(), lon);
        let var = Variable::new(
            VariableMeta::new("t2m", "K", "temperature"),
            vec!["latitude".into(), "longitude".into()],
            shape,
            (0..n).map(|v| v as f32).collect(),
        )
        .unwrap();
        Field::new(coords, vec![var], Attributes::new()).unwrap()
    }

    #[test]
    fn test_subset_inclusive_after_normalization() {
        let sub = subset(&global_field(), -30.0, 30.0, -90.0, 90.0).unwrap();
        assert_eq!(sub.coord("latitude").unwrap(), &[-30.0, 0.0, 30.0]);
        assert_eq!(sub.coord("longitude").unwrap(), &[-90.0, -45.0, 0.0, 45.0, 90.0]);
        assert_eq!(sub.variable("t2m").unwrap().shape(), &[3, 5]);
    }

    #[test]
    fn test_subset_shifts_0_360_bounds() {
        let sub = subset(&global_field(), 0.0, 30.0, 225.0, 315.0).unwrap();
        assert_eq!(sub.coord("longitude").unwrap(), &[-135.0, -90.0, -45.0]);
    }

    #[test]
    fn test_subset_empty_selection() {
        let err = subset(&global_field(), 10.0, 20.0, -10.0, 10.0).unwrap_err();
        assert!(matches!(err, WxError::EmptySelection { .. }));
    }

    #[test]
    fn test_subset_invalid_bounds() {
        let err = subset(&global_field(), 20.0, 10.0, -10.0, 10.0).unwrap_err();
        assert!(matches!(err, WxError::InvalidBounds { .. }));
    }
}
