//! Core types for regridding.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wx_common::{BoundingBox, GeoGrid, WxError};

/// Interpolation method for regridding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegridMethod {
    /// Bilinear interpolation between the four bracketing source points.
    #[default]
    Bilinear,
    /// Area-weighted overlap of cell patches.
    Conservative,
    /// Each target point takes its nearest source point.
    NearestS2d,
    /// Each source point goes to its nearest target point; targets average
    /// what they receive.
    NearestD2s,
}

impl RegridMethod {
    /// All supported methods.
    pub const ALL: [RegridMethod; 4] = [
        Self::Bilinear,
        Self::Conservative,
        Self::NearestS2d,
        Self::NearestD2s,
    ];

    /// Get the method identifier as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bilinear => "bilinear",
            Self::Conservative => "conservative",
            Self::NearestS2d => "nearest_s2d",
            Self::NearestD2s => "nearest_d2s",
        }
    }
}

impl FromStr for RegridMethod {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bilinear" => Ok(Self::Bilinear),
            "conservative" => Ok(Self::Conservative),
            "nearest_s2d" => Ok(Self::NearestS2d),
            "nearest_d2s" => Ok(Self::NearestD2s),
            _ => Err(WxError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for RegridMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of a grid for weight reuse: shape, bounds and a hash of the
/// coordinate values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSignature {
    pub nlat: usize,
    pub nlon: usize,
    /// `lat_min, lat_max, lon_min, lon_max` as IEEE bit patterns.
    bounds: [u64; 4],
    pub coord_hash: u64,
}

impl GridSignature {
    pub fn of(grid: &GeoGrid) -> Self {
        let (nlat, nlon) = grid.shape();
        let bbox = grid.bbox();
        Self {
            nlat,
            nlon,
            bounds: [
                bbox.lat_min.to_bits(),
                bbox.lat_max.to_bits(),
                bbox.lon_min.to_bits(),
                bbox.lon_max.to_bits(),
            ],
            coord_hash: hash_coords(grid.lat(), grid.lon()),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nlat, self.nlon)
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            f64::from_bits(self.bounds[0]),
            f64::from_bits(self.bounds[1]),
            f64::from_bits(self.bounds[2]),
            f64::from_bits(self.bounds[3]),
        )
    }
}

/// Cache key for a set of weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeightKey {
    pub method: RegridMethod,
    pub source: GridSignature,
    pub target: GridSignature,
    pub periodic: bool,
}

impl WeightKey {
    pub fn new(method: RegridMethod, source: &GeoGrid, target: &GeoGrid, periodic: bool) -> Self {
        Self {
            method,
            source: GridSignature::of(source),
            target: GridSignature::of(target),
            periodic,
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the little-endian bit patterns of both axes. The value is
/// persisted with stored weights, so it must not depend on the toolchain.
fn hash_coords(lat: &[f64], lon: &[f64]) -> u64 {
    lat.iter()
        .chain(std::iter::once(&f64::NAN))
        .chain(lon)
        .flat_map(|v| v.to_bits().to_le_bytes())
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

/// Statistics about the weight cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of times weights were actually built (or loaded from disk).
    pub computations: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
