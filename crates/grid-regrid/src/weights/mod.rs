//! Sparse interpolation weights between two lat/lon grids.
//!
//! Every supported method is separable on a rectilinear grid: the weight of
//! source cell `(si, sj)` for target cell `(ti, tj)` is the product of a
//! latitude weight `w_lat(ti, si)` and a longitude weight `w_lon(tj, sj)`.
//! Each method therefore only builds two 1-D [`AxisWeights`] tables and
//! [`RegridWeights::from_axes`] expands them into the full sparse matrix.

pub mod bilinear;
pub mod conservative;
pub mod nearest;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wx_common::{GeoGrid, WxError, WxResult};

use crate::types::RegridMethod;

/// Per-target-index list of `(source index, weight)` along one axis.
pub type AxisWeights = Vec<Vec<(usize, f64)>>;

/// Sparse target × source weight matrix in compressed-row form.
///
/// Row `t` (a row-major flattened target cell) holds the entries
/// `offsets[t]..offsets[t + 1]` of `sources` and `weights`. Zero weights are
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegridWeights {
    method: RegridMethod,
    source_shape: (usize, usize),
    target_shape: (usize, usize),
    offsets: Vec<usize>,
    sources: Vec<usize>,
    weights: Vec<f64>,
}

impl RegridWeights {
    /// Expand two 1-D weight tables into the full matrix.
    pub fn from_axes(
        method: RegridMethod,
        source_shape: (usize, usize),
        target_shape: (usize, usize),
        lat: &AxisWeights,
        lon: &AxisWeights,
    ) -> Self {
        let src_nlon = source_shape.1;
        let tgt_nlon = target_shape.1;
        let n_targets = target_shape.0 * target_shape.1;

        let rows: Vec<Vec<(usize, f64)>> = (0..n_targets)
            .into_par_iter()
            .map(|t| {
                let (ti, tj) = (t / tgt_nlon, t % tgt_nlon);
                let mut row = Vec::with_capacity(lat[ti].len() * lon[tj].len());
                for &(si, wi) in &lat[ti] {
                    for &(sj, wj) in &lon[tj] {
                        let w = wi * wj;
                        if w != 0.0 {
                            row.push((si * src_nlon + sj, w));
                        }
                    }
                }
                row
            })
            .collect();

        let nnz: usize = rows.iter().map(Vec::len).sum();
        let mut offsets = Vec::with_capacity(n_targets + 1);
        let mut sources = Vec::with_capacity(nnz);
        let mut weights = Vec::with_capacity(nnz);

        offsets.push(0);
        for row in rows {
            for (s, w) in row {
                sources.push(s);
                weights.push(w);
            }
            offsets.push(sources.len());
        }

        debug!(
            method = %method,
            n_targets,
            nnz,
            "Expanded axis weights"
        );

        Self {
            method,
            source_shape,
            target_shape,
            offsets,
            sources,
            weights,
        }
    }

    pub fn method(&self) -> RegridMethod {
        self.method
    }

    pub fn source_shape(&self) -> (usize, usize) {
        self.source_shape
    }

    pub fn target_shape(&self) -> (usize, usize) {
        self.target_shape
    }

    /// Number of target cells.
    pub fn n_targets(&self) -> usize {
        self.target_shape.0 * self.target_shape.1
    }

    /// Number of source cells.
    pub fn n_sources(&self) -> usize {
        self.source_shape.0 * self.source_shape.1
    }

    /// Number of stored (non-zero) weights.
    pub fn nnz(&self) -> usize {
        self.weights.len()
    }

    /// Contributions to one target cell.
    pub fn row(&self, target: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.offsets[target]..self.offsets[target + 1];
        self.sources[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// Sum of the weights of one target cell.
    pub fn row_sum(&self, target: usize) -> f64 {
        self.row(target).map(|(_, w)| w).sum()
    }

    /// Check internal consistency (used after loading from disk).
    pub fn validate(&self) -> Result<(), String> {
        let n_targets = self.n_targets();
        if self.offsets.len() != n_targets + 1 {
            return Err(format!(
                "expected {} row offsets, found {}",
                n_targets + 1,
                self.offsets.len()
            ));
        }
        if self.offsets.first() != Some(&0) || self.offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err("row offsets are not monotonic".to_string());
        }
        if self.offsets.last() != Some(&self.sources.len()) || self.sources.len() != self.weights.len() {
            return Err("row offsets do not match entry count".to_string());
        }
        if self.sources.iter().any(|&s| s >= self.n_sources()) {
            return Err("source index out of range".to_string());
        }
        Ok(())
    }

    /// Apply the weights to one lat × lon slice.
    ///
    /// A target with no contributions, or with any contributing NaN, is NaN.
    pub fn apply_slice(&self, values: &[f32]) -> WxResult<Vec<f32>> {
        if values.len() != self.n_sources() {
            return Err(self.failure(format!(
                "field slice has {} values, weights expect {}",
                values.len(),
                self.n_sources()
            )));
        }

        let out = (0..self.n_targets())
            .into_par_iter()
            .map(|t| {
                let mut acc = 0.0f64;
                let mut any = false;
                for (s, w) in self.row(t) {
                    let v = values[s];
                    if v.is_nan() {
                        return f32::NAN;
                    }
                    acc += w * v as f64;
                    any = true;
                }
                if any {
                    acc as f32
                } else {
                    f32::NAN
                }
            })
            .collect();

        Ok(out)
    }

    fn failure(&self, reason: String) -> WxError {
        WxError::RegridFailure {
            method: self.method.to_string(),
            source_shape: self.source_shape,
            target_shape: self.target_shape,
            reason,
        }
    }
}

/// Build the weights mapping `source` onto `target`.
///
/// Both grids must already be normalized. `periodic` wraps the longitude
/// axis for bilinear interpolation.
pub fn build_weights(
    method: RegridMethod,
    source: &GeoGrid,
    target: &GeoGrid,
    periodic: bool,
) -> WxResult<RegridWeights> {
    let failure = |reason: String| WxError::RegridFailure {
        method: method.to_string(),
        source_shape: source.shape(),
        target_shape: target.shape(),
        reason,
    };

    let (lat, lon) = match method {
        RegridMethod::Bilinear => {
            let lat = bilinear::axis_weights(source.lat(), target.lat());
            let lon = if periodic {
                bilinear::periodic_axis_weights(source.lon(), target.lon())
            } else {
                bilinear::axis_weights(source.lon(), target.lon())
            };
            (lat, lon)
        }
        RegridMethod::NearestS2d => (
            nearest::s2d_axis_weights(source.lat(), target.lat()),
            nearest::s2d_axis_weights(source.lon(), target.lon()),
        ),
        RegridMethod::NearestD2s => (
            nearest::d2s_axis_weights(source.lat(), target.lat()),
            nearest::d2s_axis_weights(source.lon(), target.lon()),
        ),
        RegridMethod::Conservative => (
            conservative::lat_weights(source.lat(), target.lat()).map_err(failure)?,
            conservative::lon_weights(source.lon(), target.lon()).map_err(failure)?,
        ),
    };

    Ok(RegridWeights::from_axes(
        method,
        source.shape(),
        target.shape(),
        &lat,
        &lon,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(lat: Vec<f64>, lon: Vec<f64>) -> GeoGrid {
        GeoGrid::new(lat, lon).unwrap()
    }

    #[test]
    fn test_from_axes_products() {
        let lat = vec![vec![(0, 0.25), (1, 0.75)]];
        let lon = vec![vec![(1, 1.0)], vec![(0, 0.5), (1, 0.5)]];
        let w = RegridWeights::from_axes(RegridMethod::Bilinear, (2, 2), (1, 2), &lat, &lon);

        assert_eq!(w.n_targets(), 2);
        assert_eq!(w.row(0).collect::<Vec<_>>(), vec![(1, 0.25), (3, 0.75)]);
        assert_eq!(w.nnz(), 6);
        assert!((w.row_sum(1) - 1.0).abs() < 1e-12);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_zero_weights_are_dropped() {
        let lat = vec![vec![(0, 1.0), (1, 0.0)]];
        let lon = vec![vec![(0, 1.0)]];
        let w = RegridWeights::from_axes(RegridMethod::Bilinear, (2, 1), (1, 1), &lat, &lon);
        assert_eq!(w.nnz(), 1);
    }

    #[test]
    fn test_apply_slice_nan_and_empty_rows() {
        let lat = vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![]];
        let lon = vec![vec![(0, 0.5), (1, 0.5)]];
        let w = RegridWeights::from_axes(RegridMethod::Bilinear, (2, 2), (3, 1), &lat, &lon);

        let out = w.apply_slice(&[1.0, 3.0, f32::NAN, 4.0]).unwrap();
        assert_eq!(out[0], 2.0);
        assert!(out[1].is_nan(), "any NaN contributor poisons the target");
        assert!(out[2].is_nan(), "no contributors means missing");
    }

    #[test]
    fn test_apply_slice_shape_mismatch() {
        let src = grid(vec![0.0, 1.0], vec![0.0, 1.0]);
        let w = build_weights(RegridMethod::Bilinear, &src, &src, false).unwrap();
        let err = w.apply_slice(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, WxError::RegridFailure { .. }));
    }

    #[test]
    fn test_conservative_needs_two_points() {
        let src = grid(vec![0.0], vec![0.0, 1.0]);
        let tgt = grid(vec![0.0, 1.0], vec![0.0, 1.0]);
        let err = build_weights(RegridMethod::Conservative, &src, &tgt, false).unwrap_err();
        match err {
            WxError::RegridFailure { method, source_shape, .. } => {
                assert_eq!(method, "conservative");
                assert_eq!(source_shape, (1, 2));
            }
            other => panic!("expected RegridFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_detects_corruption() {
        let src = grid(vec![0.0, 1.0], vec![0.0, 1.0]);
        let mut w = build_weights(RegridMethod::NearestS2d, &src, &src, false).unwrap();
        w.sources[0] = 99;
        assert!(w.validate().is_err());
    }
}
