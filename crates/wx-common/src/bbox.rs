//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{WxError, WxResult};

/// A geographic bounding box in degrees.
///
/// Longitudes may be given in either [-180, 180] or [0, 360]; latitude
/// bounds are always in [-90, 90].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Parse a bounds string: "lat_min,lat_max,lon_min,lon_max"
    pub fn from_bounds_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        Ok(Self {
            lat_min: parse(parts[0])?,
            lat_max: parse(parts[1])?,
            lon_min: parse(parts[2])?,
            lon_max: parse(parts[3])?,
        })
    }

    /// Validate the bounds.
    ///
    /// Requires `-90 <= lat_min < lat_max <= 90` and
    /// `-180 <= lon_min < lon_max <= 360`.
    pub fn validate(&self) -> WxResult<()> {
        validate_bounds(self.lat_min, self.lat_max, self.lon_min, self.lon_max)
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Check if a point is contained within this bbox (inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Express longitude bounds in [-180, 180] when both lie above 180.
    pub fn normalized(&self) -> Self {
        if self.lon_min > 180.0 && self.lon_max > 180.0 {
            Self {
                lon_min: self.lon_min - 360.0,
                lon_max: self.lon_max - 360.0,
                ..*self
            }
        } else {
            *self
        }
    }
}

/// Validate spatial bounds.
pub fn validate_bounds(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> WxResult<()> {
    let lat_ok = -90.0 <= lat_min && lat_min < lat_max && lat_max <= 90.0;
    let lon_ok = -180.0 <= lon_min && lon_min < lon_max && lon_max <= 360.0;

    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(WxError::InvalidBounds {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounds format: {0}. Expected 'lat_min,lat_max,lon_min,lon_max'")]
    InvalidFormat(String),

    #[error("Invalid number in bounds: {0}")]
    InvalidNumber(String),
}

impl From<BboxParseError> for WxError {
    fn from(err: BboxParseError) -> Self {
        WxError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        let bbox = BoundingBox::from_bounds_string("40,50,-10,10").unwrap();
        assert_eq!(bbox.lat_min, 40.0);
        assert_eq!(bbox.lat_max, 50.0);
        assert_eq!(bbox.lon_min, -10.0);
        assert_eq!(bbox.lon_max, 10.0);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds(40.0, 50.0, -10.0, 10.0).is_ok());
        assert!(validate_bounds(50.0, 40.0, -10.0, 10.0).is_err());
        assert!(validate_bounds(-91.0, 40.0, -10.0, 10.0).is_err());
        assert!(validate_bounds(40.0, 50.0, 10.0, 10.0).is_err());
        assert!(validate_bounds(40.0, 50.0, 0.0, 360.0).is_ok());
    }
}
