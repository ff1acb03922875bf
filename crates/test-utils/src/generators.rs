//! Test data generators for creating synthetic weather-like data.
//!
//! The grid generators return row-major `Vec<f32>` buffers (latitude rows,
//! longitude columns). The field builders wrap those buffers into
//! [`Field`]s with named coordinate axes.

use std::collections::BTreeMap;

use wx_common::{Attributes, Field, Variable, VariableMeta};

/// Creates a test grid with temperature-like values in Kelvin.
///
/// Values form a gradient from 250K to 310K across the grid.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Creates a grid with NaN values at specified (col, row) positions,
/// zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Evenly spaced axis: `start, start + step, ...` (`n` values).
pub fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Builds a single-variable field with custom axis names.
///
/// Panics if `values` does not hold `lat.len() * lon.len()` entries.
pub fn field_on_axes(
    lat_name: &str,
    lat: Vec<f64>,
    lon_name: &str,
    lon: Vec<f64>,
    variable: &str,
    values: Vec<f32>,
) -> Field {
    let shape = vec![lat.len(), lon.len()];
    let mut coords = BTreeMap::new();
    coords.insert(lat_name.to_string(), lat);
    coords.insert(lon_name.to_string(), lon);

    let var = Variable::new(
        VariableMeta::new(variable, "K", format!("synthetic {}", variable)),
        vec![lat_name.to_string(), lon_name.to_string()],
        shape,
        values,
    )
    .expect("generator values must match the grid shape");

    Field::new(coords, vec![var], Attributes::new()).expect("generator field must be consistent")
}

/// Builds a single-variable field with axes named `lat` and `lon`.
pub fn grid_field(lat: Vec<f64>, lon: Vec<f64>, variable: &str, values: Vec<f32>) -> Field {
    field_on_axes("lat", lat, "lon", lon, variable, values)
}

/// Field with [`create_temperature_grid`] values.
pub fn temperature_field(lat: Vec<f64>, lon: Vec<f64>) -> Field {
    let values = create_temperature_grid(lon.len(), lat.len());
    grid_field(lat, lon, "t2m", values)
}

/// Field with a constant value everywhere.
pub fn constant_field(lat: Vec<f64>, lon: Vec<f64>, variable: &str, value: f32) -> Field {
    let values = vec![value; lat.len() * lon.len()];
    grid_field(lat, lon, variable, values)
}

/// Field with a leading `time` axis; `values` holds every time slice back to
/// back.
pub fn time_series_field(
    times: Vec<f64>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    variable: &str,
    values: Vec<f32>,
) -> Field {
    let shape = vec![times.len(), lat.len(), lon.len()];
    let mut coords = BTreeMap::new();
    coords.insert("time".to_string(), times);
    coords.insert("lat".to_string(), lat);
    coords.insert("lon".to_string(), lon);

    let var = Variable::new(
        VariableMeta::new(variable, "K", format!("synthetic {}", variable)),
        vec!["time".into(), "lat".into(), "lon".into()],
        shape,
        values,
    )
    .expect("generator values must match the grid shape");

    Field::new(coords, vec![var], Attributes::new()).expect("generator field must be consistent")
}

/// Copies of `base` with `offset` added to `variable`, one member per offset.
pub fn offset_ensemble(base: &Field, variable: &str, offsets: &[f32]) -> Vec<Field> {
    let var = base
        .variable(variable)
        .expect("base field must contain the variable");

    offsets
        .iter()
        .map(|&offset| {
            let shifted = var
                .with_values(var.values().iter().map(|v| v + offset).collect())
                .expect("same shape");
            Field::new(base.coords().clone(), vec![shifted], base.attrs().clone())
                .expect("same coordinates")
        })
        .collect()
}
