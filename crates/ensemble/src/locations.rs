//! Locations of largest ensemble disagreement.

use serde::{Deserialize, Serialize};
use wx_common::{infer_coordinates, Field, WxError, WxResult};

/// One grid cell and its spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "spread")]
    pub value: f32,
}

/// The `n` largest values of a single-variable spread field.
///
/// Values are returned in non-increasing order; ties go to the smaller
/// row-major flattened index. NaN cells are never reported, so fewer than
/// `n` locations come back when the field has fewer finite cells.
pub fn top_spread_locations(std_field: &Field, n: usize) -> WxResult<Vec<SpreadLocation>> {
    let var = std_field
        .variables()
        .next()
        .ok_or_else(|| WxError::InvalidField("spread field has no variables".to_string()))?;

    let names = infer_coordinates(std_field);
    let (lat_name, lon_name) = names.require_spatial()?;
    let missing = |axis: &str| WxError::GridMismatch(format!("{} is not a dimension of {}", axis, var.name()));
    let lat_axis = var.axis_of(lat_name).ok_or_else(|| missing(lat_name))?;
    let lon_axis = var.axis_of(lon_name).ok_or_else(|| missing(lon_name))?;
    let lat = std_field.coord(lat_name).ok_or_else(|| missing(lat_name))?;
    let lon = std_field.coord(lon_name).ok_or_else(|| missing(lon_name))?;

    let mut ranked: Vec<(usize, f32)> = var
        .values()
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .collect();
    // Stable sort keeps ascending index order among equal values.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);

    let shape = var.shape();
    Ok(ranked
        .into_iter()
        .map(|(flat, value)| {
            let index = unravel(flat, shape);
            SpreadLocation {
                lat: lat[index[lat_axis]],
                lon: lon[index[lon_axis]],
                value,
            }
        })
        .collect())
}

fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (axis, &size) in shape.iter().enumerate().rev() {
        index[axis] = flat % size.max(1);
        flat /= size.max(1);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::grid_field;

    fn spread_field(values: Vec<f32>) -> Field {
        grid_field(vec![10.0, 20.0], vec![100.0, 110.0, 120.0], "t2m", values)
    }

    #[test]
    fn test_descending_with_coordinates() {
        let field = spread_field(vec![0.1, 0.9, 0.3, 0.7, 0.2, 0.5]);
        let top = top_spread_locations(&field, 3).unwrap();
        assert_eq!(
            top,
            vec![
                SpreadLocation { lat: 10.0, lon: 110.0, value: 0.9 },
                SpreadLocation { lat: 20.0, lon: 100.0, value: 0.7 },
                SpreadLocation { lat: 20.0, lon: 120.0, value: 0.5 },
            ]
        );
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let field = spread_field(vec![1.0, 2.0, 2.0, 0.0, 2.0, 1.0]);
        let top = top_spread_locations(&field, 2).unwrap();
        assert_eq!((top[0].lat, top[0].lon), (10.0, 110.0));
        assert_eq!((top[1].lat, top[1].lon), (10.0, 120.0));
    }

    #[test]
    fn test_nan_skipped_and_n_clamped() {
        let field = spread_field(vec![f32::NAN, 1.0, f32::NAN, 3.0, 2.0, f32::NAN]);
        let top = top_spread_locations(&field, 10).unwrap();
        let values: Vec<f32> = top.iter().map(|l| l.value).collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_unravel() {
        assert_eq!(unravel(5, &[2, 3]), vec![1, 2]);
        assert_eq!(unravel(7, &[2, 2, 3]), vec![1, 0, 1]);
    }

    #[test]
    fn test_serializes_value_as_spread() {
        let loc = SpreadLocation { lat: 1.0, lon: 2.0, value: 0.5 };
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["spread"], 0.5);
    }
}
