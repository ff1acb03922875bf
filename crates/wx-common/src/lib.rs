//! Common types and utilities shared across the wx-ensemble workspace.

pub mod bbox;
pub mod codec;
pub mod coords;
pub mod error;
pub mod field;
pub mod grid;
pub mod subset;
pub mod time;

pub use bbox::{validate_bounds, BoundingBox};
pub use codec::{load_field, save_field};
pub use coords::{
    infer_coordinates, normalize, normalize_latitude, normalize_longitude,
    standardize_coordinates, CoordinateNames,
};
pub use error::{ErrorCategory, WxError, WxResult};
pub use field::{Attributes, Field, Variable, VariableMeta};
pub use grid::GeoGrid;
pub use subset::{subset, subset_bbox};
