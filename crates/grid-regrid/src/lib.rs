//! Regridding engine for lat/lon forecast fields.
//!
//! This crate maps fields from one regular (possibly irregularly spaced)
//! lat/lon grid onto another. It provides:
//!
//! - **Weight construction** for bilinear, conservative, nearest_s2d and
//!   nearest_d2s interpolation, stored as sparse compressed-row matrices
//! - **Compute-once caching** of weights per grid-pair signature
//! - **Persistence** of weights on disk for reuse across runs
//!
//! # Architecture
//!
//! ```text
//! Regridder::regrid(field, target, method)
//!      │
//!      ├─► Normalize coordinates (lon → [-180, 180), lat ascending, lat/lon names)
//!      │
//!      ├─► WeightCache::get_or_compute(signature)
//!      │         │
//!      │         ├─► Cached: reuse
//!      │         │
//!      │         └─► Missing: WeightStore::load ─► build_weights ─► WeightStore::save
//!      │
//!      └─► Apply weights to every lat × lon slice
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use grid_regrid::{create_reference_grid, RegridConfig, RegridMethod, Regridder, WeightCache};
//!
//! let regridder = Regridder::new(Arc::new(WeightCache::new()), RegridConfig::from_env());
//! let target = create_reference_grid(&bbox, 0.25)?;
//! let aligned = regridder.regrid(&field, &target, RegridMethod::Bilinear)?;
//! ```

pub mod cache;
pub mod config;
pub mod reference;
pub mod regridder;
pub mod types;
pub mod weights;

// Re-export commonly used types at crate root
pub use cache::{WeightCache, WeightStore};
pub use config::RegridConfig;
pub use reference::{
    create_reference_grid, grid_from_config, grid_from_field, GridCatalog, ReferenceGridSpec,
};
pub use regridder::Regridder;
pub use types::{CacheStats, GridSignature, RegridMethod, WeightKey};
pub use weights::{build_weights, RegridWeights};
