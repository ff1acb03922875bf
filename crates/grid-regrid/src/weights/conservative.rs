//! First-order conservative (area-overlap) weights.
//!
//! Each cell center owns a patch reaching halfway to its neighbours; the
//! outermost patches mirror the adjacent half-spacing. On the sphere the area
//! of a lat/lon patch is proportional to `Δlon × Δsin(lat)`, and since both
//! factors are separable the overlap fraction is the product of a longitude
//! fraction and a `sin(lat)` fraction.
//!
//! Weights are `overlap / target area` with no renormalization: a target
//! patch only partly covered by the source domain keeps a row sum below one.

use super::AxisWeights;

/// Patch edges for ascending centers (`n + 1` values).
pub fn cell_edges(centers: &[f64]) -> Result<Vec<f64>, String> {
    let n = centers.len();
    if n < 2 {
        return Err(format!(
            "conservative regridding needs at least 2 points per axis, got {}",
            n
        ));
    }

    let mut edges = Vec::with_capacity(n + 1);
    edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
    edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
    Ok(edges)
}

/// Latitude overlap weights, measured in `sin(lat)`.
pub fn lat_weights(source: &[f64], target: &[f64]) -> Result<AxisWeights, String> {
    let clamp = |edges: Vec<f64>| -> Vec<f64> {
        edges.into_iter().map(|e| e.clamp(-90.0, 90.0)).collect()
    };
    let src = clamp(cell_edges(source)?);
    let tgt = clamp(cell_edges(target)?);

    Ok(overlap_weights(&src, &tgt, |lo, hi| {
        hi.to_radians().sin() - lo.to_radians().sin()
    }))
}

/// Longitude overlap weights, measured in degrees.
pub fn lon_weights(source: &[f64], target: &[f64]) -> Result<AxisWeights, String> {
    let src = cell_edges(source)?;
    let tgt = cell_edges(target)?;

    Ok(overlap_weights(&src, &tgt, |lo, hi| hi - lo))
}

fn overlap_weights(src: &[f64], tgt: &[f64], measure: impl Fn(f64, f64) -> f64) -> AxisWeights {
    tgt.windows(2)
        .map(|t| {
            let (t_lo, t_hi) = (t[0], t[1]);
            let area = measure(t_lo, t_hi);
            if area <= 0.0 {
                return Vec::new();
            }

            // First source patch whose upper edge lies above the target's lower edge.
            let start = src[1..].partition_point(|&hi| hi <= t_lo);

            src.windows(2)
                .enumerate()
                .skip(start)
                .take_while(|(_, s)| s[0] < t_hi)
                .filter_map(|(i, s)| {
                    let lo = s[0].max(t_lo);
                    let hi = s[1].min(t_hi);
                    if hi <= lo {
                        return None;
                    }
                    let w = measure(lo, hi) / area;
                    (w > 0.0).then_some((i, w))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_edges_mirror_spacing() {
        let edges = cell_edges(&[0.0, 1.0, 3.0]).unwrap();
        assert_eq!(edges, vec![-0.5, 0.5, 2.0, 4.0]);
        assert!(cell_edges(&[1.0]).is_err());
    }

    #[test]
    fn test_identical_axes_are_identity() {
        let axis = [-10.0, -5.0, 0.0, 5.0, 10.0];
        let w = lon_weights(&axis, &axis).unwrap();
        for (i, row) in w.iter().enumerate() {
            assert_eq!(row, &vec![(i, 1.0)]);
        }
    }

    #[test]
    fn test_coarsening_splits_area() {
        let w = lon_weights(&[0.0, 1.0, 2.0, 3.0], &[0.5, 2.5]).unwrap();
        // Target [-0.5, 1.5] covers source patches [-0.5, 0.5] and [0.5, 1.5].
        assert_eq!(w[0], vec![(0, 0.5), (1, 0.5)]);
        assert_eq!(w[1], vec![(2, 0.5), (3, 0.5)]);
    }

    #[test]
    fn test_latitude_clamped_at_pole() {
        let w = lat_weights(&[60.0, 80.0], &[60.0, 80.0]).unwrap();
        let sum: f64 = w[1].iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_coverage_keeps_deficit() {
        // Target patch [-1, 1] only overlaps source from -0.5.
        let w = lon_weights(&[0.0, 1.0, 2.0], &[0.0, 2.0]).unwrap();
        let sum: f64 = w[0].iter().map(|(_, w)| w).sum();
        assert!((sum - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_target_is_empty() {
        let w = lon_weights(&[0.0, 1.0], &[10.0, 11.0]).unwrap();
        assert!(w.iter().all(Vec::is_empty));
    }
}
