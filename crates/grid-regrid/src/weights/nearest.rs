//! Nearest-neighbour weights along one axis.
//!
//! On a rectilinear grid the squared lat-lon distance is the sum of the two
//! per-axis squared distances, so the 2-D nearest cell is the pair of per-axis
//! nearest indices. Choosing the smallest index on each axis tie also picks
//! the smallest row-major flattened index among tied cells.

use super::AxisWeights;

/// Index of the coordinate closest to `x`, smallest index on ties.
///
/// `axis` must be non-empty and ascending.
pub fn nearest_index(axis: &[f64], x: f64) -> usize {
    let k = axis.partition_point(|&v| v < x);
    if k == 0 {
        return 0;
    }
    if k == axis.len() {
        return axis.len() - 1;
    }

    let below = x - axis[k - 1];
    let above = axis[k] - x;
    if below <= above {
        k - 1
    } else {
        k
    }
}

/// Source-to-destination: every target takes its nearest source point.
pub fn s2d_axis_weights(source: &[f64], target: &[f64]) -> AxisWeights {
    target
        .iter()
        .map(|&x| vec![(nearest_index(source, x), 1.0)])
        .collect()
}

/// Destination-to-source: every source point goes to its nearest target;
/// each target averages what it receives.
///
/// Targets receiving nothing get no weights.
pub fn d2s_axis_weights(source: &[f64], target: &[f64]) -> AxisWeights {
    let mut assigned: AxisWeights = vec![Vec::new(); target.len()];
    if target.is_empty() {
        return assigned;
    }

    for (s, &x) in source.iter().enumerate() {
        assigned[nearest_index(target, x)].push((s, 1.0));
    }

    for row in &mut assigned {
        let share = 1.0 / row.len().max(1) as f64;
        for (_, w) in row.iter_mut() {
            *w = share;
        }
    }

    assigned
}
