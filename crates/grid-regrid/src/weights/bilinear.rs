//! Linear interpolation weights along one axis.

use super::AxisWeights;

/// 1-D linear weights for each target coordinate.
///
/// Targets outside `[source[0], source[n-1]]` get no weights.
pub fn axis_weights(source: &[f64], target: &[f64]) -> AxisWeights {
    target
        .iter()
        .map(|&x| bracket(source, x).unwrap_or_default())
        .collect()
}

/// Like [`axis_weights`] but the axis wraps every 360°.
///
/// Targets between the last source longitude and the first one (plus 360)
/// interpolate across the seam. The seam is only bridged when it is no wider
/// than the widest interior spacing, i.e. the source covers the globe.
pub fn periodic_axis_weights(source: &[f64], target: &[f64]) -> AxisWeights {
    let (first, last) = match (source.first(), source.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return vec![Vec::new(); target.len()],
    };
    let gap = first + 360.0 - last;
    let max_step = source.windows(2).map(|w| w[1] - w[0]).fold(0.0, f64::max);
    let wraps = gap > 0.0 && gap <= max_step + 1e-9;

    target
        .iter()
        .map(|&x| {
            if let Some(w) = bracket(source, x) {
                return w;
            }
            if !wraps {
                return Vec::new();
            }

            let x = if x < first { x + 360.0 } else { x };
            if x < last || x > first + 360.0 {
                return Vec::new();
            }

            let t = (x - last) / gap;
            vec![(source.len() - 1, 1.0 - t), (0, t)]
        })
        .collect()
}

/// Find the bracketing pair for `x` via binary search.
fn bracket(source: &[f64], x: f64) -> Option<Vec<(usize, f64)>> {
    let n = source.len();
    if n == 0 || x < source[0] || x > source[n - 1] {
        return None;
    }

    // Number of source points <= x; at least 1 because x >= source[0].
    let k = source.partition_point(|&v| v <= x);
    if k == n {
        return Some(vec![(n - 1, 1.0)]);
    }

    let (i0, i1) = (k - 1, k);
    let t = (x - source[i0]) / (source[i1] - source[i0]);
    Some(vec![(i0, 1.0 - t), (i1, t)])
}
