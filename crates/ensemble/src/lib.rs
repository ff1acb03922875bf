//! Cross-model comparison of grid-aligned forecast fields.
//!
//! All members passed to this crate must already share one grid (see the
//! `grid-regrid` crate). The analysis pipeline is:
//!
//! ```text
//! fields ──► compute_spread ──► mean / std fields
//!                                   │
//!                                   ├─► top_spread_locations (hot spots)
//!                                   │
//!                                   └─► analyze ──► AnalysisSummary ──► format_summary
//!
//! fields ──► pairwise_differences ──► "{a}_minus_{b}" variables
//! ```
//!
//! Statistics use the population definition and skip missing (NaN) values
//! cell by cell.

pub mod locations;
pub mod pairwise;
pub mod spread;
pub mod summary;

pub use locations::{top_spread_locations, SpreadLocation};
pub use pairwise::{pairwise_differences, resolve_labels};
pub use spread::{cell_stats, compute_spread, EnsembleStack, Spread};
pub use summary::{
    analyze, format_summary, Analysis, AnalysisSummary, ModelStatistics, SpreadStatistics,
    TOP_LOCATIONS,
};
